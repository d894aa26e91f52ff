//! Record tokenizer for pokemon.stats data lines
//!
//! A data line looks like `+#Nidoran\sf#, 55, 47, 52, ...`. The text between
//! the first two name separators is the raw name; everything after the
//! delimiter that follows the name is the payload, split into fields.
//!
//! Fields keep their raw text (including surrounding whitespace), so a record
//! with no replaced field serializes back to exactly the original line.

use crate::profile::{FormatProfile, SplitRule};
use std::fmt;

/// Classification of one reference table line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Not a data line; emitted verbatim
    Passthrough,
    /// A well-formed data line
    Record(StatRecord),
    /// A data line that cannot be used; emitted verbatim with a warning
    Malformed(Malformed),
}

/// Why a data line was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    /// Raw name segment, when one could be located
    pub raw_name: Option<String>,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// No closing name separator
    UnterminatedName,
    /// No delimiter between the name segment and the payload
    MissingPayload,
    /// Payload field count differs from the profile arity
    FieldCount { expected: usize, found: usize },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::UnterminatedName => write!(f, "name segment is not terminated"),
            MalformedReason::MissingPayload => write!(f, "no payload after the name segment"),
            MalformedReason::FieldCount { expected, found } => {
                write!(f, "expected {} columns, found {}", expected, found)
            }
        }
    }
}

/// A single payload field, stored as raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    raw: String,
}

impl Field {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Field value without surrounding whitespace
    pub fn value(&self) -> &str {
        self.raw.trim()
    }

    /// Field value without surrounding whitespace or quotes
    pub fn unquoted(&self) -> &str {
        let value = self.value();
        if is_quoted(value) {
            &value[1..value.len() - 1]
        } else {
            value
        }
    }

    /// Raw text as it appeared in the line
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Replace the value, keeping the original padding and quoting
    pub fn set(&mut self, value: &str) {
        let trimmed_start = self.raw.trim_start();
        let lead = &self.raw[..self.raw.len() - trimmed_start.len()];
        let trail = &trimmed_start[trimmed_start.trim_end().len()..];

        let body = if is_quoted(self.value()) {
            format!("\"{}\"", value)
        } else {
            value.to_string()
        };

        self.raw = format!("{}{}{}", lead, body, trail);
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

/// A parsed data line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    /// Line text up to and including the delimiter after the name segment
    head: String,
    /// Name segment exactly as embedded in the line
    raw_name: String,
    fields: Vec<Field>,
    delimiter: char,
}

impl StatRecord {
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Replace the value of one field.
    ///
    /// Returns `false` and leaves the record untouched when the new text would
    /// not survive a re-split as a single field (a delimiter, an unbalanced
    /// quote or parenthesis, or a line break).
    pub fn set_field(&mut self, index: usize, value: &str, profile: &FormatProfile) -> bool {
        let Some(field) = self.fields.get(index) else {
            return false;
        };

        let mut candidate = field.clone();
        candidate.set(value);
        if !is_self_contained(candidate.raw(), profile) {
            return false;
        }

        self.fields[index] = candidate;
        true
    }

    /// Reassemble the line from the head and the raw fields
    pub fn to_line(&self) -> String {
        let mut line = self.head.clone();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            line.push_str(field.raw());
        }
        line
    }
}

/// Classify and tokenize one line according to the profile
pub fn tokenize_line(line: &str, profile: &FormatProfile) -> LineKind {
    if !profile.is_data_line(line) {
        return LineKind::Passthrough;
    }

    let sep = profile.name_separator;
    let Some(open) = line.find(sep) else {
        return LineKind::Passthrough;
    };
    let name_start = open + sep.len_utf8();
    let Some(name_len) = line[name_start..].find(sep) else {
        return LineKind::Malformed(Malformed {
            raw_name: None,
            reason: MalformedReason::UnterminatedName,
        });
    };
    let name_end = name_start + name_len;
    let raw_name = line[name_start..name_end].to_string();

    let after_name = name_end + sep.len_utf8();
    if !line[after_name..].starts_with(profile.delimiter) {
        return LineKind::Malformed(Malformed {
            raw_name: Some(raw_name),
            reason: MalformedReason::MissingPayload,
        });
    }
    let payload_start = after_name + profile.delimiter.len_utf8();

    let fields = split_payload(&line[payload_start..], profile);
    if fields.len() != profile.field_count {
        return LineKind::Malformed(Malformed {
            raw_name: Some(raw_name),
            reason: MalformedReason::FieldCount {
                expected: profile.field_count,
                found: fields.len(),
            },
        });
    }

    LineKind::Record(StatRecord {
        head: line[..payload_start].to_string(),
        raw_name,
        fields,
        delimiter: profile.delimiter,
    })
}

/// Whether a raw field splits as exactly one field and leaves the scanner
/// ready for the next one
fn is_self_contained(raw: &str, profile: &FormatProfile) -> bool {
    if raw.contains(['\r', '\n']) {
        return false;
    }
    // An open quote or parenthesis would swallow the trailing delimiter
    let followed = format!("{}{}", raw, profile.delimiter);
    split_payload(&followed, profile).len() == 2
}

/// Split a payload into raw fields using the profile's split rule
pub fn split_payload(payload: &str, profile: &FormatProfile) -> Vec<Field> {
    match profile.split_rule {
        SplitRule::QuoteAware => split_quote_aware(payload, profile.delimiter),
        SplitRule::Naive => split_naive(payload, profile.delimiter),
    }
}

/// Single left-to-right scan; quotes toggle, parentheses nest
fn split_quote_aware(payload: &str, delimiter: char) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, c) in payload.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth -= 1,
            c if c == delimiter && !in_quotes && depth == 0 => {
                fields.push(Field::new(&payload[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    fields.push(Field::new(&payload[start..]));

    fields
}

/// Plain delimiter split via the csv reader with quoting disabled
fn split_naive(payload: &str, delimiter: char) -> Vec<Field> {
    let Ok(delimiter) = u8::try_from(delimiter) else {
        return payload.split(delimiter).map(Field::new).collect();
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(delimiter)
        .trim(csv::Trim::None)
        .from_reader(payload.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(Field::new).collect(),
        Some(Err(e)) => {
            tracing::debug!("csv split failed: {}", e);
            Vec::new()
        }
        None => vec![Field::new("")],
    }
}
