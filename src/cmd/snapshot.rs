use crate::reports;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use touchforge::config::LayoutTuning;
use touchforge::error::TfResult;
use touchforge::snapshot::{build_bundle, discover_games, load_name_list};
use touchforge::{LayoutEngine, SchemaInput};
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Directory of schema JSON files, one per game.
    #[arg(short, long)]
    pub dir: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    /// Only snapshot games named in this file.
    #[arg(long)]
    pub list: Option<PathBuf>,

    #[command(flatten)]
    pub tuning: LayoutTuning,
}

pub fn run(args: &SnapshotArgs, tuning: LayoutTuning) -> TfResult<()> {
    let allow = args.list.as_ref().map(load_name_list).transpose()?;
    let paths = discover_games(&args.dir, allow.as_ref())?;
    info!("Found {} schemas in {}", paths.len(), args.dir.display());

    let mut inputs = Vec::new();
    let mut unreadable = Vec::new();
    for (name, path) in paths {
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| SchemaInput::from_json(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(input) => inputs.push((name, input)),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                unreadable.push((name, e));
            }
        }
    }

    let engine = LayoutEngine::builder().tuning(tuning).build();
    let mut bundle = build_bundle(&engine, &inputs);
    bundle.failures.extend(unreadable);

    bundle.write_to_file(&args.output)?;
    info!("Wrote snapshot to {}", args.output.display());

    reports::print_snapshot_summary(&bundle);
    println!("fingerprint: {}", bundle.fingerprint()?);
    Ok(())
}
