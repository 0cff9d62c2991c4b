use crate::reports;
use clap::Args;
use std::path::PathBuf;
use touchforge::compare::{compare, ConfigDirs};
use touchforge::error::{TfResult, TouchForgeError};
use touchforge::snapshot::{load_name_list, SnapshotBundle};

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Current layout snapshot JSON.
    #[arg(long)]
    pub current: PathBuf,

    /// Gold layout snapshot JSON.
    #[arg(long)]
    pub gold: PathBuf,

    /// Directory of current schema files, compared as canonical configs.
    #[arg(long, requires = "gold_configs")]
    pub configs: Option<PathBuf>,

    #[arg(long, requires = "configs")]
    pub gold_configs: Option<PathBuf>,

    /// Games to compare; defaults to every game in the gold snapshot.
    #[arg(long)]
    pub list: Option<PathBuf>,

    /// Exit non-zero when anything differs.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

pub fn run(args: &CompareArgs) -> TfResult<()> {
    let current = SnapshotBundle::load_from_file(&args.current)?;
    let gold = SnapshotBundle::load_from_file(&args.gold)?;
    let names = args.list.as_ref().map(load_name_list).transpose()?;

    let dirs = match (&args.configs, &args.gold_configs) {
        (Some(c), Some(g)) => Some(ConfigDirs {
            current: c.clone(),
            gold: g.clone(),
        }),
        _ => None,
    };

    let report = compare(&current, &gold, dirs.as_ref(), names.as_ref())?;
    reports::print_comparison(&report);

    if args.strict && !report.is_clean() {
        return Err(TouchForgeError::Config(
            "snapshot differs from gold".to_string(),
        ));
    }
    Ok(())
}
