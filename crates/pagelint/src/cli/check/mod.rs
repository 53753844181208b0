//! The `pagelint check` command for checking an archive.

mod render;
mod setup;
pub mod types;

pub use types::OutputFormat;

use clap::Args;
use pagelint_core::{
    Config, ContentType, FolderReport, PageProcessor, PipelineRun, ProcessOptions, ReportFormat,
    ReportWriter, RunReport,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub(crate) use setup::{apply_overrides, build_context};

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Archive root containing one folder per episode
    #[arg(required = true)]
    pub root: String,

    /// Content type whose limits apply (comic, magazine_comic)
    #[arg(short, long)]
    pub content_type: Option<ContentType>,

    /// Digits page numbers are zero-padded to
    #[arg(long)]
    pub min_digits: Option<usize>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Report format (defaults to report.format from config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Do not rename files on disk
    #[arg(long)]
    pub no_rename: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Manual Default impl for constructing CheckArgs outside of clap.
///
/// Values match the clap defaults above.
impl Default for CheckArgs {
    fn default() -> Self {
        Self {
            root: String::new(),
            content_type: None,
            min_digits: None,
            output: None,
            format: None,
            parallel: None,
            no_rename: false,
            pretty: false,
        }
    }
}

/// Everything needed to run the pipeline and write its report.
pub(crate) struct CheckContext {
    pub processor: PageProcessor,
    pub options: ProcessOptions,
    pub root: PathBuf,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub pretty: bool,
}

/// Execute the check command.
pub async fn execute(args: CheckArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    let ctx = build_context(config, &args, false)?;
    run(ctx).await
}

/// Run the pipeline and write the report in the requested format.
pub(crate) async fn run(ctx: CheckContext) -> anyhow::Result<()> {
    // Before spawning: the pipeline renames and overwrites files on disk
    let mut out = open_output(ctx.output.as_deref())?;
    let pipeline = ctx.processor.spawn(&ctx.root, &ctx.options)?;
    let progress = render::create_spinner();

    let report = match ctx.format {
        OutputFormat::Jsonl => {
            // Folders are written as they arrive
            let mut writer = ReportWriter::new(&mut out, ReportFormat::JsonLines, false);
            let report = collect(pipeline, &progress, |folder| writer.write_folder(folder)).await?;
            writer.write_summary(&report.stats)?;
            writer.flush()?;
            report
        }
        OutputFormat::Json => {
            let report = collect(pipeline, &progress, |_| Ok(())).await?;
            let mut writer = ReportWriter::new(&mut out, ReportFormat::Json, ctx.pretty);
            writer.write_run(&report)?;
            writer.flush()?;
            report
        }
        OutputFormat::Text => {
            let report = collect(pipeline, &progress, |_| Ok(())).await?;
            let styled = ctx.output.is_none() && console::Term::stdout().is_term();
            render::write_report(&mut out, &report, styled)?;
            out.flush()?;
            report
        }
    };

    if let Some(path) = &ctx.output {
        tracing::info!("Report written to {:?}", path);
    }
    render::print_summary(&report.stats, ctx.options.resize);
    Ok(())
}

/// Drain the report stream, feeding each folder to `on_folder` first.
async fn collect<F>(
    mut pipeline: PipelineRun,
    progress: &indicatif::ProgressBar,
    mut on_folder: F,
) -> anyhow::Result<RunReport>
where
    F: FnMut(&FolderReport) -> io::Result<()>,
{
    let mut folders = Vec::new();
    while let Some(folder) = pipeline.recv().await {
        progress.inc(1);
        progress.set_message(folder.episode.clone());
        on_folder(&folder)?;
        folders.push(folder);
    }
    let stats = pipeline.finish().await;
    progress.finish_and_clear();

    folders.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(RunReport { folders, stats })
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}
