//! The `pagelint config` command for configuration management.

use clap::{Args, Subcommand};
use pagelint_core::{Config, ConfigError, ContentType};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// `loaded` is the result of loading the config file; only `show` needs it.
pub async fn execute(args: ConfigArgs, loaded: Result<Config, ConfigError>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let path = Config::default_path();
            let config = loaded?;
            let source = if path.exists() {
                path.display().to_string()
            } else {
                "built-in defaults".to_string()
            };
            println!("{}", render(&config, &source)?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&path, render(&Config::default(), "pagelint config init")?)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// TOML with a header naming where it came from and the active limits.
fn render(config: &Config, source: &str) -> anyhow::Result<String> {
    let content_type: ContentType = config.processing.content_type;
    let profile = config.profile();
    let header = format!(
        "# Source: {source}\n\
         # Active profile: {content_type} (max width {}px, page {} KiB, thumbnail {} KiB, folder {} KiB)\n\n",
        profile.max_width, profile.image_size_kb, profile.thumbnail_size_kb, profile.folder_size_kb
    );
    Ok(header + &config.to_toml()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_config_parses_back() {
        let text = render(&Config::default(), "test").unwrap();
        assert!(text.starts_with("# Source: test\n"));
        assert!(text.contains("# Active profile: comic (max width 1600px"));

        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.rename.min_digits, 3);
    }

    #[tokio::test]
    async fn only_show_needs_a_loaded_config() {
        let broken = || Err(ConfigError::ValidationError("bad value".into()));

        let show = ConfigArgs {
            command: ConfigCommand::Show,
        };
        let err = execute(show, broken()).await.unwrap_err();
        assert!(err.to_string().contains("bad value"));

        let path = ConfigArgs {
            command: ConfigCommand::Path,
        };
        assert!(execute(path, broken()).await.is_ok());
    }
}
