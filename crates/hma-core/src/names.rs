//! Name normalization between the table's escaped names and display names

use serde::{Deserialize, Serialize};

/// Escape tokens used inside the table's name segment, checked in order
const ESCAPES: [(&str, &str); 3] = [("\\sf", " F"), ("\\sm", " M"), ("\\s", " ")];

/// A one-off name substitution applied after escape resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameException {
    /// Substring that triggers the substitution
    pub contains: String,
    /// Name used instead of the whole resolved name
    pub replacement: String,
}

impl NameException {
    pub fn new(contains: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            replacement: replacement.into(),
        }
    }
}

/// Canonicalizes names so table records and overrides meet on the same key.
///
/// The same normalizer must be applied to both sides; display names without
/// escape tokens pass through unchanged apart from the exception table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameNormalizer {
    exceptions: Vec<NameException>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self {
            exceptions: vec![NameException::new("Farfetch'd", "Farfetchd")],
        }
    }
}

impl NameNormalizer {
    /// Append extra exceptions after the built-in ones
    pub fn with_exceptions(mut self, extra: impl IntoIterator<Item = NameException>) -> Self {
        self.exceptions.extend(extra);
        self
    }

    /// Resolve escapes, then apply the first matching exception
    pub fn normalize(&self, raw: &str) -> String {
        let resolved = ESCAPES
            .iter()
            .fold(raw.trim().to_string(), |name, (token, text)| name.replace(token, text));

        self.exceptions
            .iter()
            .find(|e| resolved.contains(e.contains.as_str()))
            .map(|e| e.replacement.clone())
            .unwrap_or(resolved)
    }
}
