use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cpu_dispatch_check::extract::{self, read_var_file};
use cpu_dispatch_check::config::{BUILD_ENV, SOURCE_ENV};
use cpu_dispatch_check::{suite, CompareMode, Harness, HarnessConfig, OutputSource, Target, VarNames};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Verify CPU baseline/dispatch configuration across targets")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Console,
    VarFile,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and check the selected cases
    Run {
        /// Restrict to these targets
        #[arg(long = "target", value_enum)]
        targets: Vec<Target>,
        /// Restrict to these case names (`default` or `x86_64::default`)
        #[arg(long = "case")]
        cases: Vec<String>,
        /// Also run cases that only pass on one specific build host
        #[arg(long)]
        include_host_specific: bool,
        /// Compare feature lists ignoring token order
        #[arg(long)]
        unordered: bool,
        /// Where to read features from
        #[arg(long, value_enum, default_value_t = Format::Console)]
        source: Format,
        /// Variable dump written into the build directory
        #[arg(long, default_value = "CMakeCache.txt")]
        var_file: String,
        /// Source tree (overrides $OPENCV)
        #[arg(long)]
        opencv: Option<PathBuf>,
        /// Build directory (overrides $BUILD)
        #[arg(long)]
        build: Option<PathBuf>,
        /// Kill the configure step after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
    /// Print the built-in cases
    List {
        #[arg(long = "target", value_enum)]
        targets: Vec<Target>,
    },
    /// Extract a record from a saved configure log or variable dump
    Parse {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Console)]
        format: Format,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn load_config(
    opencv: Option<PathBuf>,
    build: Option<PathBuf>,
    timeout: Option<u64>,
) -> Result<HarnessConfig> {
    load_config_with(opencv, build, timeout, |key| env::var(key).ok())
}

/// `--opencv`/`--build` stand in for their variables; everything else still
/// comes from `lookup`.
fn load_config_with<F>(
    opencv: Option<PathBuf>,
    build: Option<PathBuf>,
    timeout: Option<u64>,
    lookup: F,
) -> Result<HarnessConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let cli_path = |key: &str| match key {
        SOURCE_ENV => opencv.as_ref(),
        BUILD_ENV => build.as_ref(),
        _ => None,
    };
    let mut cfg = HarnessConfig::from_lookup(|key| {
        cli_path(key)
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| lookup(key))
    })?;
    // keep non-UTF-8 paths exact
    if let Some(src) = opencv {
        cfg.source_dir = src;
    }
    if let Some(build) = build {
        cfg.build_dir = build;
    }
    if let Some(secs) = timeout {
        cfg = cfg.with_timeout(Some(Duration::from_secs(secs)));
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            targets,
            cases,
            include_host_specific,
            unordered,
            source,
            var_file,
            opencv,
            build,
            timeout,
        } => {
            let cfg = load_config(opencv, build, timeout)?;
            println!("OPENCV={}", cfg.source_dir.display());
            println!("BUILD={}", cfg.build_dir.display());

            let mode = if unordered {
                CompareMode::Unordered
            } else {
                CompareMode::Exact
            };
            let harness = Harness::new(cfg)?.with_mode(mode);

            let mut selected = suite::select(
                suite::builtin_cases(),
                &targets,
                &cases,
                include_host_specific,
            );
            if let Format::VarFile = source {
                for case in &mut selected {
                    case.source = OutputSource::var_file(var_file.clone());
                }
            }
            if selected.is_empty() {
                anyhow::bail!("no cases match the given filters");
            }

            let report = harness.run_all(&selected);
            print!("{report}");
            std::process::exit(report.exit_code());
        }
        Commands::List { targets } => {
            for case in suite::select(suite::builtin_cases(), &targets, &[], true) {
                let marker = if case.host_specific { " [host-specific]" } else { "" };
                println!("{}{}", case.id(), marker);
                if !case.flags.is_empty() {
                    println!("    flags:    {}", case.flags.join(" "));
                }
                println!("    expected: {}", case.expected);
            }
            Ok(())
        }
        Commands::Parse { input, format } => {
            let extracted = match format {
                Format::Console => {
                    let text = fs::read_to_string(&input)
                        .with_context(|| format!("failed to read {}", input.display()))?;
                    extract::parse_console(&text)
                }
                Format::VarFile => read_var_file(&input, &VarNames::default())?,
            };
            let r = &extracted.record;
            println!("baseline:   {}", r.baseline);
            println!("requested:  {}", r.requested);
            println!("disabled:   {}", r.disabled);
            println!("dispatched: {}", r.dispatched);
            Ok(())
        }
    }
}
