//! Utility functions shared across the application.

mod parsing;
mod permissions;
mod scrub;

pub use parsing::parse_location_spec;
pub use permissions::restrict_file_permissions;
pub use scrub::scrub_secrets;
