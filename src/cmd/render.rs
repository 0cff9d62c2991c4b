use clap::Args;
use std::path::PathBuf;
use touchforge::error::TfResult;
use touchforge::render::render_bundle;
use touchforge::snapshot::{load_name_list, SnapshotBundle};

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Layout snapshot JSON.
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long)]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub list: Option<PathBuf>,
}

pub fn run(args: &RenderArgs) -> TfResult<()> {
    let bundle = SnapshotBundle::load_from_file(&args.input)?;
    let allow = args.list.as_ref().map(load_name_list).transpose()?;
    let written = render_bundle(&bundle, &args.output_dir, allow.as_ref())?;
    println!(
        "Wrote {} renders to {}",
        written.len(),
        args.output_dir.display()
    );
    Ok(())
}
