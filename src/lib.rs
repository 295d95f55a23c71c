//! tokn - A CLI tool and library for rotating API tokens.
//!
//! This crate provides functionality to:
//! - Track tokens (metadata only, never credential values) across services
//! - Auto-rotate tokens for services with rotation APIs (Cloudflare, Linode,
//!   Akamai) and surface manual procedures for the rest
//! - Propagate a rotated value to every place it lives (credential files,
//!   Doppler secrets, Postman environments) with backup/rollback
//! - Persist the token registry locally or in Doppler
//!
//! # Example
//!
//! ```no_run
//! use tokn::{Config, backend, RotationOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let backend = backend::backend_for(&config, None)?;
//!     let orchestrator = RotationOrchestrator::new(backend).await?;
//!
//!     for (name, token) in orchestrator.registry().iter() {
//!         println!("{}: {} ({})", name, token.service, token.status());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod locations;
pub mod providers;
pub mod registry;
pub mod rotation;
pub mod utils;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{Result, ToknError};
pub use registry::{Registry, Token};
pub use rotation::{RotationOrchestrator, RotationOutcome, RotationPlan};
