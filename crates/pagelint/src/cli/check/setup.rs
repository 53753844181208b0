//! Check setup: config loading and CLI overrides.

use pagelint_core::config::expand_path;
use pagelint_core::{Config, PageProcessor, ProcessOptions};

use super::types::OutputFormat;
use super::{CheckArgs, CheckContext};

/// Apply the command-line overrides to the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &CheckArgs) {
    if let Some(content_type) = args.content_type {
        config.processing.content_type = content_type;
    }
    if let Some(min_digits) = args.min_digits {
        config.rename.min_digits = min_digits;
    }
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if args.pretty {
        config.report.pretty = true;
    }
}

/// Validate the root and assemble the processor.
pub fn build_context(config: Config, args: &CheckArgs, resize: bool) -> anyhow::Result<CheckContext> {
    let root = expand_path(&args.root);
    if !root.exists() {
        anyhow::bail!(
            "Archive root does not exist: {:?}\n\n  Hint: Check the path and try again.",
            root
        );
    }

    let format = match args.format {
        Some(format) => format,
        None => OutputFormat::from_config(&config.report.format).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown report.format {:?} in config; using text",
                config.report.format
            );
            OutputFormat::Text
        }),
    };
    let pretty = config.report.pretty;

    let options = ProcessOptions {
        skip_rename: args.no_rename,
        resize,
    };
    tracing::debug!(
        "Content type {}, {} worker(s), rename {}",
        config.processing.content_type,
        config.processing.parallel_workers,
        config.rename.enabled && !args.no_rename
    );

    let processor = PageProcessor::new(config)?;
    Ok(CheckContext {
        processor,
        options,
        root,
        output: args.output.as_deref().map(expand_path),
        format,
        pretty,
    })
}
