//! End-to-end merge run: load inputs, merge, write the script

use crate::abilities::AbilityTable;
use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::merger::{merge_table, MergeContext, MergeReport};
use crate::overrides::OverrideSet;
use crate::script::write_script;
use std::fs;
use std::path::PathBuf;

/// Outcome of a successful merge run
#[derive(Debug, Clone)]
pub struct MergeSummary {
    /// Distinct ability names available for resolution
    pub abilities: usize,
    /// Override records loaded
    pub overrides: usize,
    /// Script that was written
    pub output: PathBuf,
    pub report: MergeReport,
}

/// Run a full merge.
///
/// All three inputs are read before anything is written; any failure to
/// read them, or an empty ability table, aborts with no output.
pub fn run_merge(config: &MergeConfig) -> Result<MergeSummary> {
    let profile = config.profile.profile();
    let names = config.name_normalizer();

    let abilities = AbilityTable::load(&config.abilities, profile)?;
    tracing::info!("mapped {} abilities", abilities.len());

    let overrides = OverrideSet::load(&config.overrides, &names)?;
    tracing::info!(
        "processing {} custom edits from '{}'",
        overrides.len(),
        config.overrides.display()
    );

    let source = fs::read_to_string(&config.table).map_err(|e| Error::FileRead {
        path: config.table.clone(),
        source: e,
    })?;

    let ctx = MergeContext {
        profile,
        abilities: &abilities,
        overrides: &overrides,
        names: &names,
    };
    let output = merge_table(&source, &ctx);

    write_script(&config.output, &output.lines, profile)?;

    Ok(MergeSummary {
        abilities: abilities.len(),
        overrides: overrides.len(),
        output: config.output.clone(),
        report: output.report,
    })
}
