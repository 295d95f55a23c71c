//! Command and subcommand definitions.

use clap::Subcommand;

/// Top-level commands available in tokn.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start tracking a token
    Track {
        /// Unique name for the token
        name: String,

        /// Service the token belongs to (e.g. cloudflare, linode, github)
        #[arg(short, long)]
        service: String,

        /// Rotation type: auto or manual
        #[arg(short, long, default_value = "manual")]
        rotation_type: String,

        /// Location where the token lives: TYPE:PATH[:key=value,...]
        /// Repeatable; the first location is the source of truth.
        #[arg(short, long = "location", required = true)]
        locations: Vec<String>,

        /// Days until the token expires
        #[arg(short, long, default_value_t = 90)]
        expiry_days: i64,

        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// List all tracked tokens
    List {
        /// Show only tokens that are expired or expiring soon
        #[arg(short, long)]
        expiring: bool,
    },
    /// Rotate a token (or all tokens)
    Rotate {
        /// Name of the token to rotate
        name: Option<String>,

        /// Rotate every tracked token
        #[arg(short, long, conflicts_with = "name")]
        all: bool,

        /// Show what would be rotated without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Reload the registry from the backend
    Sync,
    /// Update a tracked token's metadata
    Update {
        /// Name of the token to update
        name: String,

        /// New expiry, in days from now
        #[arg(short, long)]
        expiry_days: Option<i64>,

        /// Replace the notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Replace the locations: TYPE:PATH[:key=value,...] (repeatable)
        #[arg(short, long = "location")]
        locations: Vec<String>,
    },
    /// Show full detail for one token
    Describe {
        /// Name of the token
        name: String,
    },
    /// Stop tracking a token
    Remove {
        /// Name of the token to remove
        name: String,
    },
    /// Manage the metadata backend
    Backend {
        #[command(subcommand)]
        command: BackendCommands,
    },
}

/// Backend management subcommands.
#[derive(Subcommand, Debug)]
pub enum BackendCommands {
    /// Show the active backend
    Show,
    /// Switch the active backend and persist the choice
    Use {
        /// Backend type: local or doppler
        backend: String,
    },
    /// Copy the registry from one backend to another
    Migrate {
        /// Source backend type
        from: String,
        /// Destination backend type
        to: String,
    },
}
