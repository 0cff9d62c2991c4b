use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process;
use touchforge::config::LayoutTuning;
use touchforge::error::{TfResult, TouchForgeError};
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON tuning file; flags typed on the command line still win.
    #[arg(global = true, long)]
    tuning: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Build(cmd::build::BuildArgs),
    Resolve(cmd::resolve::ResolveArgs),
    Snapshot(cmd::snapshot::SnapshotArgs),
    Compare(cmd::compare::CompareArgs),
    Render(cmd::render::RenderArgs),
}

fn resolve_tuning(
    path: Option<&str>,
    cli_tuning: &LayoutTuning,
    sub_matches: &ArgMatches,
) -> TfResult<LayoutTuning> {
    match path {
        Some(path) => {
            info!("Loading tuning from {}", path);
            let mut tuning = LayoutTuning::load_from_file(path)?;
            tuning.merge_from_cli(cli_tuning, sub_matches);
            tuning.validate()?;
            Ok(tuning)
        }
        None => {
            cli_tuning.validate()?;
            Ok(cli_tuning.clone())
        }
    }
}

fn run(cli: &Cli, matches: &ArgMatches) -> TfResult<()> {
    let sub_matches = matches
        .subcommand()
        .map(|(_, m)| m)
        .ok_or_else(|| TouchForgeError::Config("no subcommand given".to_string()))?;
    let tuning_path = cli.tuning.as_deref();

    match &cli.command {
        Commands::Build(args) => {
            let tuning = resolve_tuning(tuning_path, &args.tuning, sub_matches)?;
            cmd::build::run(args, tuning)
        }
        Commands::Resolve(args) => cmd::resolve::run(args),
        Commands::Snapshot(args) => {
            let tuning = resolve_tuning(tuning_path, &args.tuning, sub_matches)?;
            cmd::snapshot::run(args, tuning)
        }
        Commands::Compare(args) => cmd::compare::run(args),
        Commands::Render(args) => cmd::render::run(args),
    }
}

fn main() {
    // Raw matches tell user-typed flags apart from defaults.
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli, &matches) {
        error!("{}", e);
        process::exit(1);
    }
}
