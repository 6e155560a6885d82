use clap::builder::TypedValueParser as _;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Message returned by the JSON snapshot endpoint unless configured otherwise.
pub const DEFAULT_SNAPSHOT_MESSAGE: &str = "This is a message from the server";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Where login events come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LoginEventSourceMode {
    /// One process-wide source publishes on its own cadence.
    Shared,
    /// Every open stream's heartbeat tick publishes one event to all streams.
    PerSession,
}

impl fmt::Display for LoginEventSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoginEventSourceMode::Shared => write!(f, "shared"),
            LoginEventSourceMode::PerSession => write!(f, "per-session"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3001)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// Reconnection delay in milliseconds announced to stream clients
    #[arg(long, env, default_value_t = 5000)]
    pub retry_millis: u64,

    /// Milliseconds between the time-of-day lines written to each stream
    #[arg(long, env, default_value_t = 1000)]
    pub heartbeat_interval_millis: u64,

    /// Milliseconds between login events published by the shared source
    #[arg(long, env, default_value_t = 1000)]
    pub login_event_interval_millis: u64,

    /// Publish login events from one shared source or from every stream's heartbeat
    #[arg(long, env, value_enum, default_value_t = LoginEventSourceMode::Shared)]
    pub login_event_source: LoginEventSourceMode,

    /// Username carried by generated login events
    #[arg(long, env, default_value = events::DEFAULT_USERNAME)]
    pub login_username: String,

    /// Message returned by the JSON snapshot endpoint
    #[arg(long, env, default_value = DEFAULT_SNAPSHOT_MESSAGE)]
    pub snapshot_message: String,

    /// Seconds of stream inactivity before a keep-alive comment is sent
    #[arg(long, env, default_value_t = 15)]
    pub keep_alive_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Socket address string to bind, e.g. `127.0.0.1:3001`.
    pub fn listen_addr(&self) -> String {
        let interface = self.interface.as_deref().unwrap_or("127.0.0.1");
        format!("{interface}:{}", self.port)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_millis)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_millis)
    }

    pub fn login_event_interval(&self) -> Duration {
        Duration::from_millis(self.login_event_interval_millis)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("login_stream_rs").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = parse(&[]);
        assert_eq!(config.port, 3001);
        assert_eq!(config.listen_addr(), "127.0.0.1:3001");
        assert_eq!(config.retry(), Duration::from_millis(5000));
        assert_eq!(config.heartbeat_interval(), Duration::from_millis(1000));
        assert_eq!(config.login_event_interval(), Duration::from_millis(1000));
        assert_eq!(config.login_event_source, LoginEventSourceMode::Shared);
        assert_eq!(config.login_username, "Alexander");
        assert_eq!(config.snapshot_message, DEFAULT_SNAPSHOT_MESSAGE);
        assert_eq!(config.keep_alive(), Duration::from_secs(15));
        assert_eq!(config.log_level_filter, LevelFilter::Info);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--port",
            "8080",
            "--interface",
            "0.0.0.0",
            "--login-event-source",
            "per-session",
            "--log-level-filter",
            "DEBUG",
            "--runtime-env",
            "production",
        ]);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.login_event_source, LoginEventSourceMode::PerSession);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
        assert_eq!(config.runtime_env(), RustEnv::Production);
    }

    #[test]
    fn test_rejects_unknown_source_mode() {
        let result = Config::try_parse_from(["login_stream_rs", "--login-event-source", "both"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rust_env_parses_case_insensitively() {
        assert_eq!("STAGING".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("bogus".parse::<RustEnv>(), Err(RustEnvParseError));
        assert_eq!(RustEnv::Production.to_string(), "production");
    }
}
