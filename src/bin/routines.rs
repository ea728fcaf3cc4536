//! Routines CLI - Command-line interface for Routine Insights
//!
//! Commands:
//! - analyze: Analyze every configured country and write reports
//! - country: Analyze a single corpus
//! - doctor: Check that each country's inputs are present and valid
//! - registry: Print a device registry

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use routine_insights::config::{AnalysisOptions, CountrySource, LoggingConfig, RunConfig};
use routine_insights::logging::init_logging;
use routine_insights::pipeline::{analyze_all, analyze_country, RunSummary};
use routine_insights::report::ReportWriter;
use routine_insights::types::CountryReport;
use routine_insights::{AnalysisError, DeviceRegistry, PRODUCER_NAME, ROUTINE_INSIGHTS_VERSION};

/// Routines - usage patterns and absence hours from smart-home routine logs
#[derive(Parser)]
#[command(name = "routines")]
#[command(version = ROUTINE_INSIGHTS_VERSION)]
#[command(about = "Analyze smart-home device routines per country", long_about = None)]
struct Cli {
    /// Log level or filter directive (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every configured country and write reports
    Analyze {
        /// Run configuration (TOML); built-in country list when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Console output format
        #[arg(long, default_value = "auto")]
        format: ConsoleFormat,

        /// Print results without writing report files
        #[arg(long)]
        dry_run: bool,
    },

    /// Analyze a single routine corpus
    Country {
        /// Routine corpus file
        #[arg(long)]
        corpus: PathBuf,

        /// Device registry TOML (standard registry when omitted)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Country name used in the report
        #[arg(long, default_value = "country")]
        name: String,

        /// Number of devices in the ranking
        #[arg(long, default_value = "10")]
        top_n: usize,

        /// Keep "Unknown" and "None" in the ranking
        #[arg(long)]
        keep_sentinels: bool,

        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that each country's inputs are present and valid
    Doctor {
        /// Run configuration (TOML); built-in country list when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a device registry
    Registry {
        /// Registry TOML (standard registry when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConsoleFormat {
    /// Text on a terminal, JSON when piped
    Auto,
    /// Human-readable text
    Text,
    /// JSON run summary
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RoutinesCliError> {
    match cli.command {
        Commands::Analyze {
            config,
            output,
            format,
            dry_run,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(level) = cli.log_level {
                config.logging.level = level;
            }
            if let Some(output) = output {
                config.output.directory = output;
            }
            init_logging(&config.logging);
            cmd_analyze(&config, format, dry_run)
        }

        Commands::Country {
            corpus,
            registry,
            name,
            top_n,
            keep_sentinels,
            json,
        } => {
            init_cli_logging(cli.log_level);
            let mut source = CountrySource::new(name, corpus);
            source.registry = registry;
            let options = AnalysisOptions {
                top_n,
                exclude_sentinels_in_ranking: !keep_sentinels,
            };
            cmd_country(&source, &options, json)
        }

        Commands::Doctor { config, json } => {
            init_cli_logging(cli.log_level);
            let config = load_config(config.as_deref())?;
            cmd_doctor(&config, json)
        }

        Commands::Registry { file } => {
            init_cli_logging(cli.log_level);
            cmd_registry(file.as_deref())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig, RoutinesCliError> {
    match path {
        Some(path) => Ok(RunConfig::load(path)?),
        None => {
            let mut config = RunConfig::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }
}

fn init_cli_logging(level: Option<String>) {
    let mut logging = LoggingConfig {
        level: "warn".to_string(),
        ..LoggingConfig::default()
    };
    if let Some(level) = level {
        logging.level = level;
    }
    init_logging(&logging);
}

fn cmd_analyze(config: &RunConfig, format: ConsoleFormat, dry_run: bool) -> Result<(), RoutinesCliError> {
    config.validate()?;
    let summary = analyze_all(config);

    if !dry_run {
        let writer = ReportWriter::new(&config.output.directory, config.output.pretty);
        writer.write_summary(&summary)?;
    }

    let as_json = match format {
        ConsoleFormat::Json => true,
        ConsoleFormat::Text => false,
        ConsoleFormat::Auto => !atty::is(atty::Stream::Stdout),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        if !dry_run {
            println!(
                "\nAnalysis complete! Results saved in '{}'.",
                config.output.directory.display()
            );
        }
    }

    if summary.reports.is_empty() {
        return Err(RoutinesCliError::NothingAnalyzed);
    }
    Ok(())
}

fn cmd_country(source: &CountrySource, options: &AnalysisOptions, json: bool) -> Result<(), RoutinesCliError> {
    let report = analyze_country(source, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_country(&report);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for report in &summary.reports {
        print_country(report);
        println!();
    }
    for skipped in &summary.skipped {
        println!("Data files for {} are missing: {}", skipped.country, skipped.reason);
    }
    for failed in &summary.failed {
        println!("Analysis failed for {}: {}", failed.country, failed.error);
    }

    if !summary.reports.is_empty() {
        println!("Diversity index by country:");
        for entry in summary.diversity_comparison() {
            println!("  {:<12} {:.4}", entry.country, entry.diversity_index);
        }
    }
}

fn print_country(report: &CountryReport) {
    println!("{}", report.country);
    println!("{}", "=".repeat(report.country.len()));
    println!(
        "Timesteps: {}  Observations: {}  Diversity index: {:.4}",
        report.timesteps, report.total_observations, report.diversity_index
    );

    println!("\nTop {} devices:", report.top_devices.len());
    for device in &report.top_devices {
        println!("  {:>2}. {:<20} {}", device.rank, device.device, device.count);
    }

    let absence = &report.absence;
    println!(
        "\nPresence threshold: {:.2} (mean {:.2} - std {:.2})",
        absence.threshold, absence.mean, absence.std_dev
    );
    println!("Absence hours for {}: {:?}", report.country, absence.absence_hours);
}

fn cmd_doctor(config: &RunConfig, json: bool) -> Result<(), RoutinesCliError> {
    let mut checks = Vec::new();

    checks.push(match config.validate() {
        Ok(()) => DoctorCheck::ok("config", format!("{} countries configured", config.countries.len())),
        Err(e) => DoctorCheck::error("config", e.to_string()),
    });

    for source in &config.countries {
        let name = format!("country:{}", source.name);
        let missing = source.missing_inputs();
        if !missing.is_empty() {
            let message = missing
                .iter()
                .map(|(kind, path)| format!("{kind} not found: {}", path.display()))
                .collect::<Vec<_>>()
                .join("; ");
            checks.push(DoctorCheck::warning(&name, message));
            continue;
        }

        let registry = match &source.registry {
            Some(path) => DeviceRegistry::load(path),
            None => Ok(DeviceRegistry::standard()),
        };
        checks.push(match registry {
            Ok(registry) => DoctorCheck::ok(
                &name,
                format!("inputs present, registry has {} devices", registry.len()),
            ),
            Err(e) => DoctorCheck::error(&name, e.to_string()),
        });
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ROUTINE_INSIGHTS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Routines Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RoutinesCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_registry(file: Option<&Path>) -> Result<(), RoutinesCliError> {
    let registry = match file {
        Some(path) => DeviceRegistry::load(path)?,
        None => DeviceRegistry::standard(),
    };

    println!("[devices]");
    for (code, name) in registry.iter() {
        println!("{name} = {code}");
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message,
        }
    }

    fn warning(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message,
        }
    }

    fn error(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

// Error types

#[derive(Debug)]
enum RoutinesCliError {
    Analysis(AnalysisError),
    Io(io::Error),
    Json(serde_json::Error),
    NothingAnalyzed,
    DoctorFailed,
}

impl From<AnalysisError> for RoutinesCliError {
    fn from(e: AnalysisError) -> Self {
        RoutinesCliError::Analysis(e)
    }
}

impl From<io::Error> for RoutinesCliError {
    fn from(e: io::Error) -> Self {
        RoutinesCliError::Io(e)
    }
}

impl From<serde_json::Error> for RoutinesCliError {
    fn from(e: serde_json::Error) -> Self {
        RoutinesCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RoutinesCliError> for CliError {
    fn from(e: RoutinesCliError) -> Self {
        match e {
            RoutinesCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::MissingInput { .. } => ("MISSING_INPUT", "Check file paths"),
                    AnalysisError::CorpusFormat { .. } => (
                        "CORPUS_FORMAT",
                        "Each line must hold whitespace-separated integer device codes",
                    ),
                    AnalysisError::RegistryIntegrity(_) => (
                        "REGISTRY_INTEGRITY",
                        "Every device name and code must appear only once",
                    ),
                    AnalysisError::RegistryParse(_) => (
                        "REGISTRY_PARSE",
                        "Registries are TOML files with a [devices] table of Name = code",
                    ),
                    AnalysisError::Config(_) => ("CONFIG_ERROR", "Check the run configuration"),
                    AnalysisError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    AnalysisError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            RoutinesCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RoutinesCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            RoutinesCliError::NothingAnalyzed => CliError {
                code: "NOTHING_ANALYZED".to_string(),
                message: "No country could be analyzed".to_string(),
                hint: Some("Run `routines doctor` to check the configured inputs".to_string()),
            },
            RoutinesCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more checks failed".to_string(),
                hint: Some("Review the check output above".to_string()),
            },
        }
    }
}
