//! importcheck CLI - Contract tests for import endpoints

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use importcheck_core::suite::import_endpoint;
use importcheck_core::{Config, DryRunPlan, VerdictStatus, build_import_cases, to_http_file};
use importcheck_runner::{HttpTarget, ImportRunner};

const DEFAULT_CONFIG: &str = ".importcheck.toml";

#[derive(Parser)]
#[command(name = "importcheck")]
#[command(about = "Contract tests for import endpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the import endpoint suite
    Run {
        /// Config file (default: .importcheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// List the generated cases without sending requests
        #[arg(long)]
        dry_run: bool,

        /// Run cases concurrently (overrides config)
        #[arg(long)]
        parallel: bool,

        /// Write failed cases as a .http file
        #[arg(long)]
        reproductions: Option<PathBuf>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the config file
    Schema {
        /// Export the JSON report schema instead
        #[arg(long)]
        report: bool,
    },

    /// Show usage guide (config, cases, CI integration)
    Guide,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(p) => Config::load(p)?,
        None => Config::load_default()?,
    };
    Ok(cfg)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            dry_run,
            parallel,
            reproductions,
        } => {
            let cfg = load_config(config.as_deref())?;

            if dry_run {
                let plan = DryRunPlan::from_config(&cfg);
                match cli.output {
                    OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Silent => {}
                }
                return Ok(if plan.has_errors() { 1 } else { 0 });
            }

            run_suite(&cfg, cli.output, parallel, reproductions.as_deref())
        }

        Commands::Init => {
            if Path::new(DEFAULT_CONFIG).exists() {
                eprintln!("{DEFAULT_CONFIG} already exists");
                return Ok(1);
            }

            std::fs::write(DEFAULT_CONFIG, Config::example())
                .with_context(|| format!("writing {DEFAULT_CONFIG}"))?;
            println!("Created {DEFAULT_CONFIG}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: server to test");
            println!("  - endpoint: base path, /import is appended");
            println!("  - valid_ids / invalid_ids: fixture ids");
            println!("  - fields: expected item shape");
            Ok(0)
        }

        Commands::Schema { report } => {
            let schema = if report {
                importcheck_core::schema::generate_report_schema()
            } else {
                importcheck_core::schema::generate_config_schema()
            };
            println!("{schema}");
            Ok(0)
        }

        Commands::Guide => {
            print!("{}", include_str!("../docs/GUIDE.md"));
            Ok(0)
        }
    }
}

fn run_suite(
    cfg: &Config,
    output: OutputFormat,
    parallel: bool,
    reproductions: Option<&Path>,
) -> Result<i32> {
    let target = HttpTarget::from_config(cfg)?;
    let endpoint = import_endpoint(&cfg.endpoint);
    let cases = build_import_cases(&cfg.endpoint, &cfg.fixtures());

    if output != OutputFormat::Silent {
        eprintln!("Config:");
        eprintln!("  base_url: {}", target.base_url());
        eprintln!("  endpoint: {endpoint}");
        if !cfg.headers.is_empty() {
            eprintln!("  headers:  {} configured", cfg.headers.len());
        }
        eprintln!("  cases:    {}", cases.len());
        eprintln!();
    }

    let start = Instant::now();
    let report = ImportRunner::new(&target)
        .with_parallel(parallel || cfg.parallel)
        .run_cases(&endpoint, &cases);
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let verdict = report.verdict();
    let failed = report.total() - report.passed_count();

    match output {
        OutputFormat::Terminal => {
            let icon = if verdict.status == VerdictStatus::Pass {
                "PASS"
            } else {
                "FAIL"
            };
            println!("{icon}: {}", verdict.reason);
            println!(
                "  Cases: {} total, {} passed, {failed} failed ({duration_ms} ms)",
                report.total(),
                report.passed_count(),
            );
            println!("  Exit code: {}", verdict.exit_code);

            if failed > 0 {
                println!("\nFailures ({failed}):");
                for line in report.failure_summary().lines() {
                    println!("  {line}");
                }
            }
        }
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "verdict": {
                    "status": verdict.status.to_string(),
                    "exit_code": verdict.exit_code,
                    "reason": verdict.reason,
                },
                "stats": {
                    "total": report.total(),
                    "passed": report.passed_count(),
                    "failed": failed,
                    "duration_ms": duration_ms,
                },
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        OutputFormat::Silent => {}
    }

    if let Some(path) = reproductions {
        if failed > 0 {
            let content = to_http_file(&report, "base_url");
            match std::fs::write(path, content) {
                Ok(()) if output != OutputFormat::Silent => {
                    eprintln!("Reproductions: {}", path.display());
                }
                Ok(()) => {}
                Err(e) => eprintln!("Warning: failed to write .http file: {e}"),
            }
        }
    }

    Ok(verdict.exit_code)
}
