use anyhow::Result;
use clap::{Parser, Subcommand};
use depscan::{
    checker::{default_checker, VulnerabilityChecker},
    config::Config,
    detect::resolve_local,
    extract::{extract, find_extractor},
    output::{format_result_to_string, print_error_json, print_result, OutputFormat},
    ScanResult,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const VULNERABLE: u8 = 2;
}

/// Error codes printed as `{"error": ...}` in JSON mode
mod error_codes {
    pub const UNSUPPORTED_ECOSYSTEM: &str = "unsupported-ecosystem";
    pub const PARSER_NOT_FOUND: &str = "parser-not-found";
    pub const OSV_CONNECTION_FAILED: &str = "osv-connection-failed";
}

#[derive(Parser)]
#[command(name = "depscan")]
#[command(
    author,
    version,
    about = "Scan project dependencies for known vulnerabilities"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the dependencies of a project directory
    Scan {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with code 2 if any vulnerability is found
        #[arg(long)]
        fail_on_vulns: bool,
    },

    /// List configured ecosystems and their dependency files
    ListEcosystems,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "depscan=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            path,
            format,
            output,
            fail_on_vulns,
        } => {
            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;
            run_scan(&config, &path, format, output, fail_on_vulns).await
        }
        Commands::ListEcosystems => {
            list_ecosystems(&config);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    config: &Config,
    root: &std::path::Path,
    format: OutputFormat,
    output_file: Option<PathBuf>,
    fail_on_vulns: bool,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table;

    let descriptor = match resolve_local(root, config) {
        Ok(descriptor) => descriptor,
        Err(e) => return fail(format, error_codes::UNSUPPORTED_ECOSYSTEM, &e.to_string()),
    };

    if find_extractor(&descriptor).is_none() {
        let message = format!(
            "no extractor for {} ({})",
            descriptor.name,
            descriptor.path.display()
        );
        return fail(format, error_codes::PARSER_NOT_FOUND, &message);
    }

    let extraction = extract(&descriptor);

    if is_interactive {
        let direct = extraction.packages.iter().filter(|p| p.isdirect).count();
        println!();
        println!(" Ecosystem : {}", descriptor.name);
        println!(" Target    : {}", descriptor.path.display());
        println!(
            " Found     : {} direct, {} transitive dependencies",
            direct,
            extraction.packages.len() - direct
        );
    }

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Querying OSV database...");
        Some(pb)
    } else {
        None
    };

    let outcome = match default_checker(&config.osv) {
        Ok(checker) => {
            checker
                .check(&extraction.ecosystem, extraction.packages)
                .await
        }
        Err(e) => Err(e),
    };

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result: ScanResult = match outcome {
        Ok(result) => result,
        Err(e) => return fail(format, error_codes::OSV_CONNECTION_FAILED, &e.to_string()),
    };

    if let Some(path) = output_file {
        std::fs::write(&path, format_result_to_string(&result, format)?)?;
        if is_interactive {
            println!("Results written to: {}", path.display());
        }
    } else {
        print_result(&result, format)?;
    }

    if fail_on_vulns && result.has_vulnerabilities() {
        Ok(exit_codes::VULNERABLE)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Reports a fatal scan error in the shape the output format expects.
fn fail(format: OutputFormat, code: &str, message: &str) -> Result<u8> {
    match format {
        OutputFormat::Json => print_error_json(code)?,
        OutputFormat::Table => eprintln!("Error: {}", message),
    }
    Ok(exit_codes::ERROR)
}

fn list_ecosystems(config: &Config) {
    println!("Configured ecosystems:");
    println!();

    for ecosystem in &config.ecosystems {
        println!("  {:<12} detected by: {}", ecosystem.name, ecosystem.detect.join(", "));

        let mut files: Vec<_> = ecosystem.files.iter().collect();
        files.sort_by(|a, b| b.priority.cmp(&a.priority));
        for file in files {
            println!(
                "  {:<12} {:<20} {:<6} {}",
                "",
                file.path,
                file.format.as_str(),
                file.role.as_str()
            );
        }
        println!();
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
