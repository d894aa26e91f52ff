//! Ability enumeration: maps ability names to their numeric ids

use crate::error::{Error, Result};
use crate::profile::FormatProfile;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Immutable name -> id table built from an enumeration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbilityTable {
    ids: HashMap<String, u32>,
    /// Number of qualifying entries read from the file
    entries: usize,
}

impl AbilityTable {
    /// Build a table from enumeration file content.
    ///
    /// Every qualifying entry consumes the next positional id, starting at
    /// the profile's base. A repeated name keeps the id of its first
    /// appearance. When the profile pins the sentinel, the sentinel always
    /// maps to 0 and its own lines do not consume an id.
    pub fn parse_str(content: &str, profile: &FormatProfile) -> Self {
        let policy = profile.id_policy;
        let sentinel = profile.ability_sentinel;

        let mut ids = HashMap::new();
        if policy.pin_sentinel {
            ids.insert(sentinel.to_string(), 0);
        }

        let (ids, _, entries) = content
            .lines()
            .filter_map(|line| entry_name(line, profile.ability_markers))
            .fold((ids, policy.base, 0usize), |(mut ids, next, entries), name| {
                if policy.pin_sentinel && name == sentinel {
                    return (ids, next, entries + 1);
                }
                ids.entry(name.to_string()).or_insert(next);
                (ids, next + 1, entries + 1)
            });

        Self { ids, entries }
    }

    /// Load a table from an enumeration file.
    ///
    /// Fails when the file cannot be read or yields no entries, since ability
    /// overrides cannot be resolved without it.
    pub fn load<P: AsRef<Path>>(path: P, profile: &FormatProfile) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let table = Self::parse_str(&content, profile);
        if table.is_empty() {
            return Err(Error::EmptyAbilityTable {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(
            path = %path.display(),
            entries = table.entries,
            names = table.ids.len(),
            "loaded ability table"
        );
        Ok(table)
    }

    /// Look up the id of an ability by its exact name
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Number of distinct names that resolve to an id
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the enumeration file contributed no entries
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// All (name, id) pairs ordered by id, then name
    pub fn sorted_entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> =
            self.ids.iter().map(|(name, id)| (name.as_str(), *id)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Extract the ability name from an enumeration line, if it qualifies
fn entry_name<'a>(line: &'a str, markers: &[char]) -> Option<Cow<'a, str>> {
    let line = line.trim();
    if !line.starts_with(markers) {
        return None;
    }

    let name = if line.contains('+') {
        Cow::Owned(line.replace('+', "").trim().trim_matches('"').to_string())
    } else {
        Cow::Borrowed(line.trim_matches('"'))
    };

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
