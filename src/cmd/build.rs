use crate::reports;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use touchforge::config::LayoutTuning;
use touchforge::error::{SchemaError, TfResult};
use touchforge::geometry::{SafeArea, Viewport};
use touchforge::snapshot::{regression_viewports, viewport_by_name};
use touchforge::{LayoutEngine, SchemaInput};
use tracing::info;

const DEFAULT_VIEWPORT: &str = "phone-landscape";

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Schema JSON (analysis or flat shape).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Named regression viewport.
    #[arg(long, conflicts_with_all = ["width", "height", "safe_area"])]
    pub viewport: Option<String>,

    #[arg(long, requires = "height")]
    pub width: Option<f64>,

    #[arg(long, requires = "width")]
    pub height: Option<f64>,

    /// Insets as T,R,B,L.
    #[arg(long)]
    pub safe_area: Option<String>,

    /// Print the full layout result as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub tuning: LayoutTuning,
}

fn viewport_from_args(args: &BuildArgs) -> TfResult<Viewport> {
    if let (Some(width), Some(height)) = (args.width, args.height) {
        let safe_area = match &args.safe_area {
            Some(s) => SafeArea::parse(s)?,
            None => SafeArea::default(),
        };
        return Ok(Viewport::builder()
            .width(width)
            .height(height)
            .safe_area(safe_area)
            .build());
    }

    let name = args.viewport.as_deref().unwrap_or(DEFAULT_VIEWPORT);
    viewport_by_name(name).ok_or_else(|| {
        let known: Vec<&str> = regression_viewports().iter().map(|(n, _)| *n).collect();
        SchemaError::InvalidViewport(format!(
            "unknown viewport '{}' (known: {})",
            name,
            known.join(", ")
        ))
        .into()
    })
}

pub fn run(args: &BuildArgs, tuning: LayoutTuning) -> TfResult<()> {
    let viewport = viewport_from_args(args)?;
    info!("Reading schema from {}", args.input.display());
    let input = SchemaInput::from_json(&fs::read_to_string(&args.input)?)?;

    let engine = LayoutEngine::builder().tuning(tuning).build();
    let result = engine.build_layout(&input, &viewport)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        reports::print_layout(&result);
        reports::print_metrics(&result.metrics);
    }
    Ok(())
}
