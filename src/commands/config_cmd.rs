use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::config::Config;

use super::{CommandError, OutputFormat};

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), CommandError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => show_text(config),
                }
                Ok(())
            }

            ConfigSubcommand::Init { force } => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);
                init(&config_path, *force)?;
                println!("Wrote {}", config_path.display());
                Ok(())
            }
        }
    }
}

fn show_text(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("data_dir: {}", config.data_dir.value.display());
    println!("  source: {}", config.data_dir.source);
    println!();

    let sync = &config.sync;
    println!("sync:");
    println!(
        "  server_url: {}",
        sync.server_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  token: {}",
        if sync.token.is_some() { "********" } else { "(not set)" }
    );
    println!("  auto_sync: {}", sync.auto_sync);
    println!("  write_mode: {}", sync.write_mode);
    println!("  max_retries: {}", sync.max_retries);
    println!("  request_timeout_secs: {}", sync.request_timeout_secs);
}

/// Writes the starter config to `path`, refusing to clobber an existing
/// file unless `force` is set.
fn init(path: &Path, force: bool) -> Result<(), CommandError> {
    if path.exists() && !force {
        return Err(CommandError::Io(
            path.to_path_buf(),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "config file already exists (use --force to overwrite)",
            ),
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CommandError::Io(parent.to_path_buf(), e))?;
    }

    let mut file = fs::File::create(path).map_err(|e| CommandError::Io(path.to_path_buf(), e))?;
    file.write_all(Config::template().as_bytes())
        .map_err(|e| CommandError::Io(path.to_path_buf(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_loadable_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("agua").join("config.yaml");

        init(&path, false).unwrap();

        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "sync:\n  auto_sync: true\n").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "sync:\n  auto_sync: true\n"
        );

        init(&path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("write_mode"));
    }
}
