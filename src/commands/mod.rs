//! Command handlers for the tokn CLI.
//!
//! One handler module per command; handlers own their terminal output and
//! return errors for main to report.

mod backend_cmd;
mod describe;
mod list;
mod remove;
mod rotate;
mod sync;
mod track;
mod update;

pub use backend_cmd::handle_backend;
pub use describe::handle_describe;
pub use list::handle_list;
pub use remove::handle_remove;
pub use rotate::handle_rotate;
pub use sync::handle_sync;
pub use track::handle_track;
pub use update::handle_update;
