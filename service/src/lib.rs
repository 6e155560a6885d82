//! Process-wide infrastructure shared by the server crates: command line and
//! environment configuration, and console logging.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::Logger;
