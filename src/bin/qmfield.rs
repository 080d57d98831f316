// src/bin/qmfield.rs

use clap::{Args as ClapArgs, Parser, Subcommand};
use qmfield::pipeline::{Pipeline, PipelineParams};
use qmfield::{Config, service, telemetry};
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "qmfield", about = "Magnetic field optimization pipeline")]
struct Cli {
    /// TOML configuration file; `QMFIELD_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Skip the network and use the fallback field.
    #[arg(long, global = true)]
    offline: bool,
    /// Seed the sampler and the sensor noise.
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and print the report as JSON.
    Run(RunArgs),
    /// Answer JSON-lines commands from stdin until EOF.
    Session,
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// JSON file with run parameters (location, target, particle).
    #[arg(long)]
    params: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    telemetry::init_tracing()?;

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.offline {
        config.offline = true;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let mut pipeline = Pipeline::from_config(&config)?;

    match cli.command {
        Command::Run(args) => run_once(&mut pipeline, args),
        Command::Session => {
            let stdin = io::stdin();
            let answered = service::run_session(&mut pipeline, stdin.lock(), io::stdout().lock())?;
            info!(answered, "session finished");
            Ok(())
        }
    }
}

fn run_once(pipeline: &mut Pipeline, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let params = match args.params {
        Some(path) => Some(serde_json::from_str::<PipelineParams>(&fs::read_to_string(path)?)?),
        None => None,
    };
    let report = pipeline.run(params);
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;
    if report.is_success() {
        Ok(())
    } else {
        Err("pipeline reported an error".into())
    }
}
