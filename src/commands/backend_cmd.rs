//! Backend command handlers - selection and migration.

use crate::backend;
use crate::cli::BackendCommands;
use crate::config::Config;
use crate::error::{Result, ToknError};

pub async fn handle_backend(config: &mut Config, command: &BackendCommands) -> Result<()> {
    match command {
        BackendCommands::Show => {
            println!("{}", config.backend());
            Ok(())
        }
        BackendCommands::Use { backend } => {
            config
                .set_backend(backend)
                .map_err(ToknError::config)?;
            let path = Config::find_existing_config()
                .unwrap_or_else(Config::default_config_path);
            config
                .save(&path)
                .map_err(|e| ToknError::config(format!("Failed to save config: {}", e)))?;
            println!("Using {} backend (saved to {})", backend, path.display());
            Ok(())
        }
        BackendCommands::Migrate { from, to } => {
            if from == to {
                return Err(ToknError::validation(
                    "Source and destination backends are the same",
                ));
            }
            let source = backend::backend_for(config, Some(from.as_str()))?;
            let dest = backend::backend_for(config, Some(to.as_str()))?;
            let count = backend::migrate(source.as_ref(), dest.as_ref()).await?;
            println!("Migrated {} tokens from {} to {}", count, from, to);
            Ok(())
        }
    }
}
