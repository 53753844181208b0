//! The `pagelint rename` command: zero-pad page numbers only.

use clap::Args;
use pagelint_core::config::expand_path;
use pagelint_core::{Config, PageProcessor};

/// Arguments for the `rename` command.
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Archive root containing one folder per episode
    #[arg(required = true)]
    pub root: String,

    /// Digits page numbers are zero-padded to
    #[arg(long)]
    pub min_digits: Option<usize>,
}

/// Execute the rename command.
pub async fn execute(args: RenameArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(min_digits) = args.min_digits {
        config.rename.min_digits = min_digits;
    }
    let processor = PageProcessor::new(config)?;
    let root = expand_path(&args.root);

    let renamed = tokio::task::spawn_blocking(move || processor.rename_only(&root)).await??;

    for record in &renamed {
        if let Some(old) = &record.renamed_from {
            println!("{}/{} -> {}", record.folder, old, record.name);
        }
    }
    eprintln!("Renamed {} file(s)", renamed.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uses_the_given_config() {
        let dir = tempfile::tempdir().unwrap();
        let ep = dir.path().join("003_episode");
        std::fs::create_dir_all(&ep).unwrap();
        std::fs::write(ep.join("003_7.jpg"), b"x").unwrap();

        let mut config = Config::default();
        config.rename.min_digits = 4;
        let args = RenameArgs {
            root: dir.path().to_string_lossy().into_owned(),
            min_digits: None,
        };
        execute(args, config).await.unwrap();

        assert!(ep.join("003_0007.jpg").exists());
    }
}
