pub mod comments;
pub mod config;
pub mod core;
pub mod marks;
pub mod reports;
pub mod results;
pub mod snapshot;
