use anyhow::Result;
use clap::Parser;
use colored::*;
use std::time::Duration;

mod output;
mod scenarios;
mod sse_client;

use output::print_test_summary;
use sse_client::Connection;

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "Login event stream integration testing tool")]
struct Cli {
    /// Base URL of the server (e.g., http://localhost:3001)
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Seconds to collect events for in the fan-out and reconnect tests
    #[arg(long, default_value_t = 3)]
    window_secs: u64,

    /// Number of streams the reconnect test opens and closes
    #[arg(long, default_value_t = 5)]
    cycles: usize,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Test that a stream delivers heartbeats and login events
    ConnectionTest,
    /// Test that a login event reaches every open stream
    FanOutTest,
    /// Test that closed streams stop publishing and receiving
    ReconnectTest,
    /// Run all tests
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let window = Duration::from_secs(cli.window_secs);

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());
    println!("{} Establishing SSE connections...", "→".blue());
    let mut sse1 = Connection::establish(&cli.base_url, "Client 1".to_string()).await?;
    let mut sse2 = Connection::establish(&cli.base_url, "Client 2".to_string()).await?;
    println!("{} Client 1 SSE connection established", "✓".green());
    println!("{} Client 2 SSE connection established", "✓".green());

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(scenarios::test_connection(&mut sse1, &mut sse2).await?);
        }
        ScenarioChoice::FanOutTest => {
            results.push(scenarios::test_fan_out(&mut sse1, &mut sse2, window).await?);
        }
        ScenarioChoice::ReconnectTest => {
            drop(sse1);
            drop(sse2);
            results.push(reconnect(&cli, window).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_connection(&mut sse1, &mut sse2).await?);
            results.push(scenarios::test_fan_out(&mut sse1, &mut sse2, window).await?);
            drop(sse1);
            drop(sse2);
            results.push(reconnect(&cli, window).await?);
        }
    }

    print_test_summary(&results);

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

async fn reconnect(cli: &Cli, window: Duration) -> Result<output::TestResult> {
    // One open stream yields about one login event per second in either
    // source mode; allow two extra for tick alignment.
    let max_events = cli.window_secs as usize + 2;
    scenarios::test_reconnect(&cli.base_url, cli.cycles, window, max_events).await
}
