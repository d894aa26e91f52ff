//! Format profiles for the two known pokemon.stats layouts
//!
//! Both layouts share the line shape `+#Name#, f0, f1, ...` but differ in
//! field arity, how the payload is split, how ability ids are numbered, and
//! whether type names are abbreviated.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a format profile, selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// 25-field layout with quote/paren aware splitting
    #[default]
    Extended,
    /// 24-field layout with plain comma splitting
    Positional,
}

impl ProfileKind {
    /// All known profiles
    pub const ALL: [ProfileKind; 2] = [ProfileKind::Extended, ProfileKind::Positional];

    /// Resolve the profile constants
    pub fn profile(self) -> &'static FormatProfile {
        match self {
            ProfileKind::Extended => &EXTENDED,
            ProfileKind::Positional => &POSITIONAL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Extended => "extended",
            ProfileKind::Positional => "positional",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownProfile(s.to_string()))
    }
}

/// How a record payload is split into fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    /// Delimiters inside `"..."` or `(...)` do not split
    QuoteAware,
    /// Every delimiter splits
    Naive,
}

/// How enumeration entries are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPolicy {
    /// Id given to the first numbered entry
    pub base: u32,
    /// Pin the sentinel name to id 0 instead of numbering it by position
    pub pin_sentinel: bool,
}

/// Positions of the overridable attributes in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub hp: usize,
    pub attack: usize,
    pub defense: usize,
    pub speed: usize,
    pub sp_atk: usize,
    pub sp_def: usize,
    pub type1: usize,
    pub type2: usize,
    pub ability1: usize,
    pub ability2: usize,
    pub hidden_ability: usize,
}

/// Constants describing one variant of the reference table format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    pub kind: ProfileKind,
    /// Prefix that marks a data line
    pub record_marker: &'static str,
    /// Character bounding the embedded name segment
    pub name_separator: char,
    /// Field delimiter in the payload
    pub delimiter: char,
    /// Exact number of payload fields
    pub field_count: usize,
    pub split_rule: SplitRule,
    /// Leading characters that qualify an enumeration line
    pub ability_markers: &'static [char],
    /// Placeholder name meaning "no ability"
    pub ability_sentinel: &'static str,
    pub id_policy: IdPolicy,
    pub layout: FieldLayout,
    /// Full type name to fixed-width type code
    pub type_abbreviations: &'static [(&'static str, &'static str)],
    /// Header token the consuming tool expects on the first line
    pub script_header: &'static str,
    /// Prefix of a first line that already acts as a header
    pub header_prefix: &'static str,
}

impl FormatProfile {
    /// Map a type name to the code written into the table
    pub fn type_code<'a>(&self, type_name: &'a str) -> &'a str {
        self.type_abbreviations
            .iter()
            .find(|(full, _)| *full == type_name)
            .map(|(_, code)| *code)
            .unwrap_or(type_name)
    }

    /// Check whether a raw line is a data line
    pub fn is_data_line(&self, line: &str) -> bool {
        line.trim_start().starts_with(self.record_marker)
    }
}

const STAT_TYPE_FIELDS: FieldLayout = FieldLayout {
    hp: 0,
    attack: 1,
    defense: 2,
    speed: 3,
    sp_atk: 4,
    sp_def: 5,
    type1: 6,
    type2: 7,
    ability1: 20,
    ability2: 21,
    hidden_ability: 23,
};

static EXTENDED: FormatProfile = FormatProfile {
    kind: ProfileKind::Extended,
    record_marker: "+#",
    name_separator: '#',
    delimiter: ',',
    field_count: 25,
    split_rule: SplitRule::QuoteAware,
    ability_markers: &['+', '"'],
    ability_sentinel: "-------",
    id_policy: IdPolicy {
        base: 1,
        pin_sentinel: true,
    },
    layout: STAT_TYPE_FIELDS,
    type_abbreviations: &[
        ("Electric", "Electr"),
        ("Psychic", "Psychc"),
        ("Fighting", "Fight"),
    ],
    script_header: "^data.pokemon.stats",
    header_prefix: "@!",
};

static POSITIONAL: FormatProfile = FormatProfile {
    kind: ProfileKind::Positional,
    record_marker: "+#",
    name_separator: '#',
    delimiter: ',',
    field_count: 24,
    split_rule: SplitRule::Naive,
    ability_markers: &['+', '"'],
    ability_sentinel: "-------",
    id_policy: IdPolicy {
        base: 0,
        pin_sentinel: false,
    },
    layout: FieldLayout {
        hidden_ability: 22,
        ..STAT_TYPE_FIELDS
    },
    type_abbreviations: &[],
    script_header: "^data.pokemon.stats",
    header_prefix: "@!",
};
