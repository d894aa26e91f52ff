//! Patch merger: applies overrides to the reference table line by line
//!
//! Lines that are not data lines, data lines without an override, and
//! malformed data lines are emitted exactly as read. Only records with a
//! matching override are re-serialized.

use crate::abilities::AbilityTable;
use crate::names::NameNormalizer;
use crate::overrides::{FieldEdit, OverrideRecord, OverrideSet};
use crate::profile::FormatProfile;
use crate::record::{tokenize_line, LineKind, MalformedReason, StatRecord};
use std::fmt;

/// Read-only inputs shared by every line of a merge
#[derive(Debug, Clone, Copy)]
pub struct MergeContext<'a> {
    pub profile: &'a FormatProfile,
    pub abilities: &'a AbilityTable,
    pub overrides: &'a OverrideSet,
    pub names: &'a NameNormalizer,
}

/// Which ability slot an override targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilitySlot {
    First,
    Second,
    Hidden,
}

impl fmt::Display for AbilitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbilitySlot::First => write!(f, "Ability 1"),
            AbilitySlot::Second => write!(f, "Ability 2"),
            AbilitySlot::Hidden => write!(f, "Hidden Ability"),
        }
    }
}

/// A recoverable problem found while merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// Data line passed through because it could not be tokenized
    MalformedLine {
        line: usize,
        raw_name: Option<String>,
        reason: MalformedReason,
    },
    /// Ability name missing from the ability table; original value kept
    UnresolvedAbility {
        line: usize,
        record: String,
        slot: AbilitySlot,
        ability: String,
    },
    /// Override value that would break the record's field layout; original kept
    InvalidValue {
        line: usize,
        record: String,
        attribute: String,
        value: String,
    },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::MalformedLine {
                line,
                raw_name,
                reason,
            } => write!(
                f,
                "malformed line #{} for {}: {}; passing through",
                line,
                raw_name.as_deref().unwrap_or("<unnamed>"),
                reason
            ),
            MergeWarning::UnresolvedAbility {
                line,
                record,
                slot,
                ability,
            } => write!(
                f,
                "{} '{}' for {} (line #{}) not found in ability table; keeping original",
                slot, ability, record, line
            ),
            MergeWarning::InvalidValue {
                line,
                record,
                attribute,
                value,
            } => write!(
                f,
                "{} value {:?} for {} (line #{}) would split the record; keeping original",
                attribute, value, record, line
            ),
        }
    }
}

/// A record whose line was rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRecord {
    /// 1-based line number in the reference table
    pub line: usize,
    /// Normalized record name
    pub name: String,
    /// Payload indices whose text changed
    pub fields: Vec<usize>,
}

/// What a merge did, beyond the output lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Number of data lines seen, well-formed or not
    pub data_lines: usize,
    pub changed: Vec<ChangedRecord>,
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    fn warn(&mut self, warning: MergeWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Merged table lines plus the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutput {
    /// Output lines, each ending with the line terminator it had on input
    pub lines: Vec<String>,
    pub report: MergeReport,
}

/// Merge overrides into the reference table content
pub fn merge_table(source: &str, ctx: &MergeContext<'_>) -> MergeOutput {
    let mut report = MergeReport::default();
    let lines = source
        .split_inclusive('\n')
        .enumerate()
        .map(|(idx, raw)| {
            let (line, ending) = split_line_ending(raw);
            let mut merged = merge_line(idx + 1, line, ctx, &mut report);
            merged.push_str(ending);
            merged
        })
        .collect();

    MergeOutput { lines, report }
}

/// Split `\n` or `\r\n` off the end of a line
fn split_line_ending(raw: &str) -> (&str, &str) {
    let line = raw
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(raw);
    (line, &raw[line.len()..])
}

fn merge_line(line_no: usize, line: &str, ctx: &MergeContext<'_>, report: &mut MergeReport) -> String {
    let mut record = match tokenize_line(line, ctx.profile) {
        LineKind::Passthrough => return line.to_string(),
        LineKind::Malformed(malformed) => {
            report.data_lines += 1;
            report.warn(MergeWarning::MalformedLine {
                line: line_no,
                raw_name: malformed.raw_name,
                reason: malformed.reason,
            });
            return line.to_string();
        }
        LineKind::Record(record) => record,
    };
    report.data_lines += 1;

    let name = ctx.names.normalize(record.raw_name());
    let Some(edits) = ctx.overrides.get(&name) else {
        return line.to_string();
    };

    let original = record.clone();
    apply_override(&mut record, edits, line_no, &name, ctx, report);

    let fields: Vec<usize> = original
        .fields()
        .iter()
        .zip(record.fields())
        .enumerate()
        .filter(|(_, (before, after))| before != after)
        .map(|(i, _)| i)
        .collect();

    if fields.is_empty() {
        return line.to_string();
    }

    tracing::info!(line = line_no, "applying changes to {}", name);
    report.changed.push(ChangedRecord {
        line: line_no,
        name,
        fields,
    });
    record.to_line()
}

/// Apply one override to a parsed record in place
fn apply_override(
    record: &mut StatRecord,
    edits: &OverrideRecord,
    line_no: usize,
    name: &str,
    ctx: &MergeContext<'_>,
    report: &mut MergeReport,
) {
    let profile = ctx.profile;
    let layout = profile.layout;
    let mut edit = RecordEdit {
        record,
        line: line_no,
        name,
        profile,
        report,
    };

    let stats = [
        ("HP", layout.hp, &edits.hp),
        ("Attack", layout.attack, &edits.attack),
        ("Defense", layout.defense, &edits.defense),
        ("Speed", layout.speed, &edits.speed),
        ("Sp Atk", layout.sp_atk, &edits.sp_atk),
        ("Sp Def", layout.sp_def, &edits.sp_def),
    ];
    for (attribute, index, stat) in stats {
        // Stats have no placeholder, so a cleared stat keeps its value
        if let FieldEdit::Set(value) = stat.effective() {
            edit.set(index, attribute, &value.to_string());
        }
    }

    if let FieldEdit::Set(type1) = edits.type1.effective() {
        edit.set(layout.type1, "Type 1", profile.type_code(type1.trim()));
    }
    let type1 = field_text(edit.record, layout.type1);
    match edits.type2.effective() {
        FieldEdit::Set(type2) => edit.set(layout.type2, "Type 2", profile.type_code(type2.trim())),
        // Single-typed creatures repeat their first type
        FieldEdit::Clear => edit.set(layout.type2, "Type 2", &type1),
        FieldEdit::Keep => {
            if field_text(edit.record, layout.type2).is_empty() {
                edit.set(layout.type2, "Type 2", &type1);
            }
        }
    }

    let abilities = [
        (AbilitySlot::First, layout.ability1, &edits.ability1),
        (AbilitySlot::Second, layout.ability2, &edits.ability2),
        (AbilitySlot::Hidden, layout.hidden_ability, &edits.hidden_ability),
    ];
    for (slot, index, ability_edit) in abilities {
        let ability = match ability_edit.effective() {
            FieldEdit::Keep => continue,
            FieldEdit::Clear => profile.ability_sentinel,
            FieldEdit::Set(ability) => ability.trim(),
        };

        match ctx.abilities.id_of(ability) {
            Some(id) => edit.set(index, &slot.to_string(), &id.to_string()),
            None => edit.report.warn(MergeWarning::UnresolvedAbility {
                line: line_no,
                record: name.to_string(),
                slot,
                ability: ability.to_string(),
            }),
        }
    }
}

/// Field writes for one record, warning on values that do not fit
struct RecordEdit<'a> {
    record: &'a mut StatRecord,
    line: usize,
    name: &'a str,
    profile: &'a FormatProfile,
    report: &'a mut MergeReport,
}

impl RecordEdit<'_> {
    fn set(&mut self, index: usize, attribute: &str, value: &str) {
        if !self.record.set_field(index, value, self.profile) {
            self.report.warn(MergeWarning::InvalidValue {
                line: self.line,
                record: self.name.to_string(),
                attribute: attribute.to_string(),
                value: value.to_string(),
            });
        }
    }
}

fn field_text(record: &StatRecord, index: usize) -> String {
    record
        .field(index)
        .map(|f| f.unquoted().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileKind;

    const ABILITIES: &str = "\
+\"-------\"
+\"Stench\"
+\"Drizzle\"
+\"Speed Boost\"
+\"Battle Armor\"
+\"Sturdy\"
+\"Damp\"
+\"Levitate\"
+\"Overgrow\"
+\"Chlorophyll\"
";

    /// 25 payload fields: stats 0-5, types 6-7, abilities 20, 21, 23
    fn fields() -> Vec<&'static str> {
        vec![
            "45", "49", "49", "45", "65", "65", "Grass", "Poison", "45", "64",
            "(0, 0, 0, 0, 1, 0)", "Nothing", "Nothing", "31", "20", "70", "MediumSlow",
            "Monster", "Grass", "0", "8", "0", "0", "9", "\"Seed, Plant\"",
        ]
    }

    fn data_line(name: &str, fields: &[&str]) -> String {
        format!("+#{}#, {}", name, fields.join(", "))
    }

    struct Fixture {
        abilities: AbilityTable,
        overrides: OverrideSet,
        names: NameNormalizer,
        kind: ProfileKind,
    }

    impl Fixture {
        fn new(overrides_json: &str) -> Self {
            Self::with_profile(overrides_json, ProfileKind::Extended)
        }

        fn with_profile(overrides_json: &str, kind: ProfileKind) -> Self {
            let names = NameNormalizer::default();
            Self {
                abilities: AbilityTable::parse_str(ABILITIES, kind.profile()),
                overrides: OverrideSet::from_json_str(overrides_json, &names).unwrap(),
                names,
                kind,
            }
        }

        fn merge(&self, source: &str) -> MergeOutput {
            let ctx = MergeContext {
                profile: self.kind.profile(),
                abilities: &self.abilities,
                overrides: &self.overrides,
                names: &self.names,
            };
            merge_table(source, &ctx)
        }
    }

    #[test]
    fn test_passthrough_invariance() {
        let source = [
            "@!game(BPRE0)".to_string(),
            "".to_string(),
            "# comment, with \"quotes\"".to_string(),
            data_line("Bulbasaur", &fields()),
            "   trailing spaces   ".to_string(),
        ]
        .join("\n");

        let out = Fixture::new(r#"[{"Name": "Ivysaur", "HP": 1}]"#).merge(&source);

        assert_eq!(out.lines.concat(), source);
        assert!(out.report.changed.is_empty());
        assert!(out.report.warnings.is_empty());
        assert_eq!(out.report.data_lines, 1);
    }

    #[test]
    fn test_line_endings_preserved() {
        let source = format!(
            "@!game(BPRE0)\r\n# comment\r\n{}\r\n{}\n",
            data_line("Bulbasaur", &fields()),
            data_line("Ivysaur", &fields())
        );

        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "HP": 50}]"#).merge(&source);

        let mut expected = fields();
        expected[0] = "50";
        assert_eq!(out.lines.len(), 4);
        assert_eq!(out.lines[0], "@!game(BPRE0)\r\n");
        assert_eq!(out.lines[2], format!("{}\r\n", data_line("Bulbasaur", &expected)));
        assert_eq!(out.lines[3], format!("{}\n", data_line("Ivysaur", &fields())));
        assert_eq!(out.report.changed.len(), 1);
        assert!(out.report.warnings.is_empty());

        let untouched = Fixture::new("[]").merge(&source);
        assert_eq!(untouched.lines.concat(), source);
    }

    #[test]
    fn test_value_that_splits_record_is_rejected() {
        let source = data_line("Mew", &fields());
        let out = Fixture::new(
            r#"[{"Name": "Mew", "Type 1": "Fire, Water", "Type 2": "(Ghost", "HP": "1, 2", "Speed": 99}]"#,
        )
        .merge(&source);

        let mut expected = fields();
        expected[3] = "99";
        assert_eq!(out.lines[0], data_line("Mew", &expected));
        assert!(matches!(
            tokenize_line(&out.lines[0], ProfileKind::Extended.profile()),
            LineKind::Record(_)
        ));
        assert_eq!(out.report.changed[0].fields, vec![3]);

        let invalid: Vec<(&str, &str)> = out
            .report
            .warnings
            .iter()
            .map(|w| match w {
                MergeWarning::InvalidValue {
                    line: 1,
                    record,
                    attribute,
                    value,
                } if record == "Mew" => (attribute.as_str(), value.as_str()),
                other => panic!("unexpected warning {:?}", other),
            })
            .collect();
        assert_eq!(
            invalid,
            vec![("HP", "1, 2"), ("Type 1", "Fire, Water"), ("Type 2", "(Ghost")]
        );
        assert!(out.report.warnings[1].to_string().contains("Fire, Water"));
    }

    #[test]
    fn test_override_precedence() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Attack": 77}]"#).merge(&source);

        let mut expected = fields();
        expected[1] = "77";
        assert_eq!(out.lines, vec![data_line("Bulbasaur", &expected)]);
        assert_eq!(out.report.changed.len(), 1);
        assert_eq!(out.report.changed[0].fields, vec![1]);
        assert_eq!(out.report.changed[0].line, 1);
    }

    #[test]
    fn test_all_stats_in_layout_order() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(
            r#"[{"Name": "Bulbasaur", "HP": 1, "Attack": 2, "Defense": 3, "Sp Atk": 4, "Sp Def": 5, "Speed": "6"}]"#,
        )
        .merge(&source);

        let mut expected = fields();
        // Speed precedes the special stats in the table
        expected[..6].copy_from_slice(&["1", "2", "3", "6", "4", "5"]);
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
    }

    #[test]
    fn test_ability_resolution() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Hidden Ability": "Levitate"}]"#)
            .merge(&source);

        let mut expected = fields();
        expected[23] = "7";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
        assert!(out.report.warnings.is_empty());
    }

    #[test]
    fn test_unresolved_ability_keeps_original() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Ability 1": "Wonder Guard"}]"#)
            .merge(&source);

        assert_eq!(out.lines[0], source);
        assert!(out.report.changed.is_empty());
        assert_eq!(
            out.report.warnings,
            vec![MergeWarning::UnresolvedAbility {
                line: 1,
                record: "Bulbasaur".to_string(),
                slot: AbilitySlot::First,
                ability: "Wonder Guard".to_string(),
            }]
        );
        let message = out.report.warnings[0].to_string();
        assert!(message.contains("Wonder Guard"));
        assert!(message.contains("Bulbasaur"));
    }

    #[test]
    fn test_null_ability_clears_to_sentinel() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Ability 1": null, "Hidden Ability": ""}]"#)
            .merge(&source);

        let mut expected = fields();
        expected[20] = "0";
        expected[23] = "0";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
    }

    #[test]
    fn test_absent_ability_is_untouched() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Ability 2": "Chlorophyll"}]"#)
            .merge(&source);

        let mut expected = fields();
        expected[21] = "9";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
        assert_eq!(out.report.changed[0].fields, vec![21]);
    }

    #[test]
    fn test_field_count_guard() {
        let mut short = fields();
        short.remove(9);
        let source = data_line("Bulbasaur", &short);

        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "HP": 1}]"#).merge(&source);

        assert_eq!(out.lines[0], source);
        assert!(out.report.changed.is_empty());
        assert_eq!(
            out.report.warnings,
            vec![MergeWarning::MalformedLine {
                line: 1,
                raw_name: Some("Bulbasaur".to_string()),
                reason: MalformedReason::FieldCount {
                    expected: 25,
                    found: 24
                },
            }]
        );
    }

    #[test]
    fn test_female_form_name_matches() {
        let source = data_line("Nidoran\\sf", &fields());
        let out = Fixture::new(r#"[{"Name": "Nidoran F", "HP": 55}]"#).merge(&source);

        let mut expected = fields();
        expected[0] = "55";
        assert_eq!(out.lines[0], data_line("Nidoran\\sf", &expected));
        assert_eq!(out.report.changed[0].name, "Nidoran F");
    }

    #[test]
    fn test_male_form_not_matched_by_female_override() {
        let source = data_line("Nidoran\\sm", &fields());
        let out = Fixture::new(r#"[{"Name": "Nidoran F", "HP": 55}]"#).merge(&source);
        assert_eq!(out.lines[0], source);
    }

    #[test]
    fn test_name_exception_matches() {
        let source = data_line("Farfetch'd", &fields());
        let out = Fixture::new(r#"[{"Name": "Farfetchd", "Speed": 90}]"#).merge(&source);

        let mut expected = fields();
        expected[3] = "90";
        assert_eq!(out.lines[0], data_line("Farfetch'd", &expected));
    }

    #[test]
    fn test_types_are_abbreviated() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Type 1": "Psychic", "Type 2": "Fighting"}]"#)
            .merge(&source);

        let mut expected = fields();
        expected[6] = "Psychc";
        expected[7] = "Fight";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
    }

    #[test]
    fn test_cleared_second_type_repeats_first() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Type 1": "Electric", "Type 2": null}]"#)
            .merge(&source);

        let mut expected = fields();
        expected[6] = "Electr";
        expected[7] = "Electr";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
    }

    #[test]
    fn test_absent_second_type_keeps_original() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Type 1": "Fire"}]"#).merge(&source);

        let mut expected = fields();
        expected[6] = "Fire";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
    }

    #[test]
    fn test_empty_second_type_defaults_to_first() {
        let mut original = fields();
        original[7] = "";
        let source = format!("+#Charmander#, {}", original.join(", "));
        let out = Fixture::new(r#"[{"Name": "Charmander", "HP": 39}]"#).merge(&source);

        // The empty field was " ", padding is kept around the new value
        let mut expected = original.clone();
        expected[0] = "39";
        expected[7] = "Grass";
        assert_eq!(out.lines[0], format!("+#Charmander#, {}", expected.join(", ")));
    }

    #[test]
    fn test_cleared_stat_keeps_original() {
        let source = data_line("Bulbasaur", &fields());
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "HP": null, "Speed": ""}]"#).merge(&source);

        assert_eq!(out.lines[0], source);
        assert!(out.report.changed.is_empty());
    }

    #[test]
    fn test_quoted_ability_field_stays_quoted() {
        let mut original = fields();
        original[23] = "\"9\"";
        let source = data_line("Bulbasaur", &original);
        let out = Fixture::new(r#"[{"Name": "Bulbasaur", "Hidden Ability": "Levitate"}]"#)
            .merge(&source);

        let mut expected = original.clone();
        expected[23] = "\"7\"";
        assert_eq!(out.lines[0], data_line("Bulbasaur", &expected));
    }

    #[test]
    fn test_positional_profile() {
        let original: Vec<String> = (0..24).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = original.iter().map(String::as_str).collect();
        let source = data_line("Mew", &refs);

        let out = Fixture::with_profile(
            r#"[{"Name": "Mew", "Type 1": "Electric", "Hidden Ability": "Levitate"}]"#,
            ProfileKind::Positional,
        )
        .merge(&source);

        let mut expected = refs.clone();
        // No abbreviation, hidden ability at 22, ids counted from 0 with the sentinel first
        expected[6] = "Electric";
        expected[22] = "7";
        assert_eq!(out.lines[0], data_line("Mew", &expected));
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut quoted = fields();
        quoted[24] = "\"Seed, Plant, Vine\"";
        let mut malformed = fields();
        malformed.pop();

        let source = [
            "@!game(BPRE0)".to_string(),
            data_line("Bulbasaur", &fields()),
            data_line("Ivysaur", &quoted),
            "".to_string(),
            data_line("Venusaur", &malformed),
        ]
        .join("\n");

        let out = Fixture::new(r#"{"edit-1": {"Name": "Bulbasaur", "Speed": 80}}"#).merge(&source);

        let mut expected_first = fields();
        expected_first[3] = "80";
        let lines: Vec<&str> = source.split_inclusive('\n').collect();

        assert_eq!(out.lines.len(), 5);
        assert_eq!(out.lines[0], lines[0]);
        assert_eq!(out.lines[1], format!("{}\n", data_line("Bulbasaur", &expected_first)));
        assert_eq!(out.lines[2], lines[2]);
        assert_eq!(out.lines[3], lines[3]);
        assert_eq!(out.lines[4], lines[4]);

        assert_eq!(out.report.data_lines, 3);
        assert_eq!(out.report.changed.len(), 1);
        assert_eq!(out.report.warnings.len(), 1);
        assert!(matches!(
            &out.report.warnings[0],
            MergeWarning::MalformedLine { line: 5, raw_name: Some(name), .. } if name == "Venusaur"
        ));
    }
}
