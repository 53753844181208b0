//! The `pagelint resize` command: check, then downsample oversized pages.

use clap::Args;

use pagelint_core::Config;

use super::check::{self, apply_overrides, build_context, CheckArgs};

/// Arguments for the `resize` command.
#[derive(Args, Debug, Default)]
pub struct ResizeArgs {
    #[command(flatten)]
    pub check: CheckArgs,

    /// First scale attempted, in percent
    #[arg(long)]
    pub percent: Option<f64>,

    /// Decrement between attempts, in percentage points
    #[arg(long)]
    pub step: Option<f64>,

    /// Smallest scale attempted, in percent
    #[arg(long)]
    pub floor: Option<f64>,
}

/// Execute the resize command.
pub async fn execute(args: ResizeArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args.check);
    if let Some(percent) = args.percent {
        config.resize.initial_percent = percent;
    }
    if let Some(step) = args.step {
        config.resize.step_percent = step;
    }
    if let Some(floor) = args.floor {
        config.resize.floor_percent = floor;
    }

    tracing::info!(
        "Resizing oversized pages from {}% down to {}% in {}% steps",
        config.resize.initial_percent,
        config.resize.floor_percent,
        config.resize.step_percent
    );
    let ctx = build_context(config, &args.check, true)?;
    check::run(ctx).await
}
