use clap::Parser;

use tokn::cli::{Cli, Commands};
use tokn::{Config, backend, commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(&mut config, &cli).await;
    match result {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Dispatch one command. Returns true when the process should exit non-zero
/// despite the command itself running to completion (partial rotations).
async fn run(config: &mut Config, cli: &Cli) -> tokn::Result<bool> {
    let override_type = cli.global.backend.as_deref();

    match &cli.command {
        Commands::Track {
            name,
            service,
            rotation_type,
            locations,
            expiry_days,
            notes,
        } => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_track(
                backend.as_ref(),
                name,
                service,
                rotation_type,
                locations,
                *expiry_days,
                notes,
            )
            .await?;
            Ok(false)
        }
        Commands::List { expiring } => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_list(backend.as_ref(), *expiring).await?;
            Ok(false)
        }
        Commands::Rotate { name, all, dry_run } => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_rotate(backend, name.as_deref(), *all, *dry_run).await
        }
        Commands::Sync => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_sync(backend.as_ref()).await?;
            Ok(false)
        }
        Commands::Update {
            name,
            expiry_days,
            notes,
            locations,
        } => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_update(
                backend.as_ref(),
                name,
                *expiry_days,
                notes.as_deref(),
                locations,
            )
            .await?;
            Ok(false)
        }
        Commands::Describe { name } => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_describe(backend.as_ref(), name).await?;
            Ok(false)
        }
        Commands::Remove { name } => {
            let backend = backend::backend_for(config, override_type)?;
            commands::handle_remove(backend.as_ref(), name).await?;
            Ok(false)
        }
        Commands::Backend { command } => {
            commands::handle_backend(config, command).await?;
            Ok(false)
        }
    }
}
