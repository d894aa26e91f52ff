//! hma-core: Core library for building HMA balance patches from stat overrides
//!
//! This library provides functionality to:
//! - Read the ability enumeration file into a name -> id table
//! - Tokenize `pokemon.stats` data lines (quote/paren aware or naive)
//! - Normalize escaped record names to display names
//! - Load per-creature overrides from JSON
//! - Merge overrides into the table, leaving every other line untouched
//! - Write the merged table as a `.tfl` script

pub mod abilities;
pub mod config;
pub mod error;
pub mod merger;
pub mod names;
pub mod overrides;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod script;

pub use abilities::AbilityTable;
pub use config::MergeConfig;
pub use error::{Error, Result};
pub use merger::{merge_table, ChangedRecord, MergeContext, MergeOutput, MergeReport, MergeWarning};
pub use names::{NameException, NameNormalizer};
pub use overrides::{FieldEdit, OverrideRecord, OverrideSet, StatValue};
pub use pipeline::{run_merge, MergeSummary};
pub use profile::{FormatProfile, ProfileKind};
pub use record::{tokenize_line, LineKind, StatRecord};
pub use script::{render_script, write_script};
