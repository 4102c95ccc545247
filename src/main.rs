//! RISC-V debug CI CLI
//!
//! Entry point for the `riscv-ci` command-line tool.

use clap::{Parser, Subcommand};
use riscv_ci::build::Tool;
use riscv_ci::logging::init_logging;
use riscv_ci::pipeline::{self, BuildRequest, ProcessResultsRequest};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "riscv-ci")]
#[command(about = "Build and test harness for RISC-V OpenOCD debugging", version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify debug-test logs and print the summary
    ProcessResults {
        /// Directory containing the *.log files
        #[arg(long)]
        log_dir: PathBuf,

        /// Directory receiving one sub-directory per result kind
        #[arg(long)]
        output_dir: PathBuf,

        /// Also write the run as JSON to this file
        #[arg(long)]
        json_summary: Option<PathBuf>,
    },

    /// Build and install OpenOCD from source
    BuildOpenocd {
        #[command(flatten)]
        common: BuildArgs,

        /// Build with gcov instrumentation
        #[arg(long)]
        coverage: bool,

        /// Patch applied in coverage builds (default: patches/openocd_gcov_flush.patch)
        #[arg(long)]
        patch_file: Option<PathBuf>,
    },

    /// Build and install Spike from source
    BuildSpike {
        #[command(flatten)]
        common: BuildArgs,
    },

    /// Print the checked-out revision of a git repository
    Revision {
        /// Repository directory
        #[arg(long, default_value = ".")]
        repo_dir: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Source directory
    #[arg(long)]
    src_dir: PathBuf,

    /// Installation prefix
    #[arg(long)]
    install_dir: PathBuf,

    /// Parallel make jobs (default: available CPUs)
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Per-command timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

impl BuildArgs {
    fn overrides(&self, patch_file: Option<&PathBuf>) -> Value {
        let mut map = Map::new();
        if let Some(jobs) = self.jobs {
            map.insert("jobs".to_string(), json!(jobs));
        }
        if let Some(secs) = self.timeout {
            map.insert("command_timeout_seconds".to_string(), json!(secs));
        }
        if let Some(patch) = patch_file {
            map.insert(
                "openocd".to_string(),
                json!({ "gcov_patch": patch.to_string_lossy() }),
            );
        }
        Value::Object(map)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::ProcessResults {
            log_dir,
            output_dir,
            json_summary,
        } => run_process_results(log_dir, output_dir, json_summary),
        Commands::BuildOpenocd {
            common,
            coverage,
            patch_file,
        } => {
            let overrides = common.overrides(patch_file.as_ref());
            run_build(Tool::OpenOcd, common, coverage, overrides);
        }
        Commands::BuildSpike { common } => {
            let overrides = common.overrides(None);
            run_build(Tool::Spike, common, false, overrides);
        }
        Commands::Revision { repo_dir, json } => run_revision(repo_dir, json),
    }
}

fn run_process_results(log_dir: PathBuf, output_dir: PathBuf, json_summary: Option<PathBuf>) {
    let req = ProcessResultsRequest {
        log_dir,
        output_dir,
        json_summary,
    };
    match pipeline::process_results(&req) {
        Ok(run) => {
            print!("{}", run.render());
            process::exit(run.verdict.exit_code());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run_build(tool: Tool, args: BuildArgs, coverage: bool, overrides: Value) {
    let req = BuildRequest {
        tool,
        src_dir: args.src_dir,
        install_dir: args.install_dir,
        coverage,
        config_path: args.config,
        overrides,
    };
    match pipeline::build(&req) {
        Ok(binary) => println!("{}", binary.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run_revision(repo_dir: PathBuf, json: bool) {
    let info = match pipeline::revision(&repo_dir) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };

    if json {
        match serde_json::to_string_pretty(&info) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(2);
            }
        }
    } else {
        for line in info.to_lines() {
            println!("{}", line);
        }
    }
}
