//! HMA balance patch CLI
//!
//! Command-line tool for merging stat overrides into a pokemon.stats table
//! and inspecting the inputs.

use clap::{Args, Parser, Subcommand};
use hma_core::{
    run_merge, tokenize_line, AbilityTable, LineKind, MergeConfig, ProfileKind,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hma-cli")]
#[command(about = "Build HMA balance patch scripts from stat overrides", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge overrides into the reference table and write a script (default)
    Merge(MergeArgs),

    /// Parse a reference table and display its records
    Parse {
        /// Path to the reference table [default: pokemon.stats.txt]
        #[arg(short, long)]
        table: Option<PathBuf>,

        /// Format profile (extended or positional) [default: extended]
        #[arg(short, long, value_parser = parse_profile)]
        profile: Option<ProfileKind>,

        /// Config file (JSON); supplies the table, profile and name exceptions
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum number of records to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Display the ability id table
    Abilities {
        /// Path to the ability enumeration file
        #[arg(short, long, default_value = hma_core::config::DEFAULT_ABILITIES)]
        file: PathBuf,

        /// Format profile (extended or positional)
        #[arg(short, long, default_value = "extended", value_parser = parse_profile)]
        profile: ProfileKind,
    },

    /// Create a config file template
    CreateConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Default)]
struct MergeArgs {
    /// Reference table [default: pokemon.stats.txt]
    table: Option<PathBuf>,

    /// Ability enumeration file [default: abilities.names.txt]
    abilities: Option<PathBuf>,

    /// Override source (JSON) [default: custom_pokemon.json]
    overrides: Option<PathBuf>,

    /// Output script [default: balance_patch.tfl]
    output: Option<PathBuf>,

    /// Format profile (extended or positional)
    #[arg(short, long, value_parser = parse_profile)]
    profile: Option<ProfileKind>,

    /// Config file (JSON); explicit arguments take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_profile(s: &str) -> Result<ProfileKind, String> {
    s.parse().map_err(|e: hma_core::Error| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> hma_core::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Merge(MergeArgs::default())) {
        Commands::Merge(args) => cmd_merge(args),
        Commands::Parse {
            table,
            profile,
            config,
            limit,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(table) = table {
                config.table = table;
            }
            if let Some(profile) = profile {
                config.profile = profile;
            }
            cmd_parse(&config, limit)
        }
        Commands::Abilities { file, profile } => cmd_abilities(&file, profile),
        Commands::CreateConfig { output } => cmd_create_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> hma_core::Result<MergeConfig> {
    match path {
        Some(path) => MergeConfig::load(path),
        None => Ok(MergeConfig::default()),
    }
}

fn cmd_merge(args: MergeArgs) -> hma_core::Result<()> {
    if args.config.is_none() && args.table.is_none() {
        println!("Using default filenames in the current directory.");
    }
    let mut config = load_config(args.config.as_deref())?;

    if let Some(table) = args.table {
        config.table = table;
    }
    if let Some(abilities) = args.abilities {
        config.abilities = abilities;
    }
    if let Some(overrides) = args.overrides {
        config.overrides = overrides;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(profile) = args.profile {
        config.profile = profile;
    }

    let summary = run_merge(&config)?;
    let report = &summary.report;

    println!();
    println!("Successfully created script: {}", summary.output.display());
    println!("  Profile: {}", config.profile);
    println!("  Abilities mapped: {}", summary.abilities);
    println!("  Override records: {}", summary.overrides);
    println!("  Data lines: {}", report.data_lines);
    println!("  Records changed: {}", report.changed.len());
    for changed in &report.changed {
        println!(
            "    - {} (line {}, {} fields)",
            changed.name,
            changed.line,
            changed.fields.len()
        );
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    Ok(())
}

fn cmd_parse(config: &MergeConfig, limit: Option<usize>) -> hma_core::Result<()> {
    let table = &config.table;
    let kind = config.profile;
    let profile = kind.profile();
    let names = config.name_normalizer();
    let content = fs::read_to_string(table).map_err(|e| hma_core::Error::FileRead {
        path: table.clone(),
        source: e,
    })?;

    let mut records = Vec::new();
    let mut malformed = Vec::new();
    let mut other_lines = 0;

    for (idx, line) in content.lines().enumerate() {
        match tokenize_line(line, profile) {
            LineKind::Record(record) => records.push((idx + 1, record)),
            LineKind::Malformed(m) => malformed.push((idx + 1, m)),
            LineKind::Passthrough => other_lines += 1,
        }
    }

    println!("File: {}", table.display());
    println!("Profile: {} ({} fields)", kind, profile.field_count);
    println!("Records: {}", records.len());
    println!("Malformed: {}", malformed.len());
    println!("Other lines: {}", other_lines);
    println!();

    let row_limit = limit.unwrap_or(records.len());
    for (line_no, record) in records.iter().take(row_limit) {
        let values: Vec<&str> = record.fields().iter().map(|f| f.value()).collect();
        println!(
            "{}\t{}\t{}",
            line_no,
            names.normalize(record.raw_name()),
            values.join("\t")
        );
    }

    if records.len() > row_limit {
        println!("... ({} more records)", records.len() - row_limit);
    }

    if !malformed.is_empty() {
        println!("\nMalformed lines:");
        for (line_no, m) in &malformed {
            println!(
                "  line {}: {}: {}",
                line_no,
                m.raw_name.as_deref().unwrap_or("<unnamed>"),
                m.reason
            );
        }
    }

    Ok(())
}

fn cmd_abilities(file: &PathBuf, kind: ProfileKind) -> hma_core::Result<()> {
    let table = AbilityTable::load(file, kind.profile())?;

    println!("File: {}", file.display());
    println!("Abilities ({}):", table.len());
    println!();
    for (name, id) in table.sorted_entries() {
        println!("{}\t{}", id, name);
    }

    Ok(())
}

fn cmd_create_config(output: &PathBuf) -> hma_core::Result<()> {
    let config = MergeConfig::default();
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to point at your inputs, then run:");
    println!("  hma-cli merge --config {}", output.display());

    Ok(())
}
