use clap::{Parser, Subcommand};
#[cfg(not(test))]
use xtask::*;

#[derive(Parser)]
#[command(author, version, about = "Development tasks for cpu-dispatch-check")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Build,
    Test,
    Clippy,
    Fmt,
    Analyze,
    /// Run the checker for the host architecture
    Check,
    /// Run the checker for every target
    #[command(name = "check-all")]
    CheckAll,
}

#[cfg(not(test))]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = detect_config();

    let status = match cli.command {
        Commands::Build => build_command().status(),
        Commands::Test => test_command().status(),
        Commands::Clippy => clippy_command().status(),
        Commands::Fmt => fmt_command().status(),
        Commands::Analyze => {
            let fmt = fmt_command().status()?;
            if !fmt.success() {
                Ok(fmt)
            } else {
                clippy_command().status()
            }
        }
        Commands::Check => {
            if cfg.target.is_none() {
                anyhow::bail!("unsupported host architecture; use `check-all`");
            }
            check_command(&cfg).status()
        }
        Commands::CheckAll => check_all_command(&cfg).status(),
    }?;

    std::process::exit(status.code().unwrap_or(1));
}
