use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::output::{print_event, TestResult};
use crate::sse_client::{Connection, Event};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks a `user_logged_in` payload: string id 0..=10, username and time.
fn validate_login(event: &Event) -> Result<(), String> {
    let json = event.json().map_err(|e| e.to_string())?;

    let id = json["id"]
        .as_str()
        .ok_or_else(|| format!("id is not a string: {}", json["id"]))?;
    match id.parse::<u8>() {
        Ok(n) if n <= 10 => {}
        _ => return Err(format!("id out of range: {id}")),
    }

    for field in ["username", "time"] {
        match json[field].as_str() {
            Some(value) if !value.is_empty() => {}
            _ => return Err(format!("{field} missing or empty")),
        }
    }
    Ok(())
}

pub async fn test_connection(sse1: &mut Connection, sse2: &mut Connection) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Connection ===".bright_cyan().bold());

    for sse in [sse1, sse2] {
        println!("{} Waiting for {} heartbeat...", "→".blue(), sse.label);
        match sse.wait_for_event("heartbeat", EVENT_TIMEOUT).await {
            Ok(event) if event.data.starts_with("The time is ") => {
                print_event(&sse.label, &event);
            }
            Ok(event) => {
                return Ok(TestResult::fail(
                    "connection",
                    format!("Unexpected heartbeat text: {}", event.data),
                    start.elapsed(),
                ));
            }
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                return Ok(TestResult::fail(
                    "connection",
                    format!("{}: {}", sse.label, e),
                    start.elapsed(),
                ));
            }
        }

        println!("{} Waiting for {} login event...", "→".blue(), sse.label);
        match sse.wait_for_event("user_logged_in", EVENT_TIMEOUT).await {
            Ok(event) => {
                print_event(&sse.label, &event);
                if let Err(reason) = validate_login(&event) {
                    println!("{} Event data invalid!", "✗".red());
                    return Ok(TestResult::fail("connection", reason, start.elapsed()));
                }
            }
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                return Ok(TestResult::fail(
                    "connection",
                    format!("{}: {}", sse.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!("{} Both streams delivered heartbeats and login events", "✓".green());
    Ok(TestResult::pass("connection", start.elapsed()))
}

pub async fn test_fan_out(
    sse1: &mut Connection,
    sse2: &mut Connection,
    window: Duration,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Fan-out ===".bright_cyan().bold());
    sse1.drain();
    sse2.drain();

    println!(
        "{} Collecting login events on both streams for {:?}...",
        "→".blue(),
        window
    );
    let (first, second) = tokio::join!(
        sse1.collect_events("user_logged_in", window),
        sse2.collect_events("user_logged_in", window)
    );

    let shared = first
        .iter()
        .filter(|a| second.iter().any(|b| a.data == b.data))
        .count();

    println!(
        "   {}: {} events, {}: {} events, {} seen by both",
        sse1.label,
        first.len(),
        sse2.label,
        second.len(),
        shared
    );

    if shared == 0 {
        return Ok(TestResult::fail(
            "fan_out",
            "No login event was delivered to both streams".to_string(),
            start.elapsed(),
        ));
    }

    println!("{} Login events fan out to every open stream", "✓".green());
    Ok(TestResult::pass("fan_out", start.elapsed()))
}

/// Opens and closes streams repeatedly, then checks that a fresh stream still
/// sees login events at the rate one open stream should produce.
pub async fn test_reconnect(
    base_url: &str,
    cycles: usize,
    window: Duration,
    max_events: usize,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Reconnect ===".bright_cyan().bold());

    for cycle in 1..=cycles {
        let mut conn = Connection::establish(base_url, format!("Cycle {cycle}")).await?;
        conn.wait_for_event("heartbeat", EVENT_TIMEOUT).await?;
        drop(conn);
    }
    println!("{} Opened and closed {} streams", "✓".green(), cycles);

    // Give the server a heartbeat period to notice the closed connections.
    tokio::time::sleep(Duration::from_secs(2)).await;

    let mut fresh = Connection::establish(base_url, "Client fresh".to_string()).await?;
    let logins = fresh.collect_events("user_logged_in", window).await;

    println!(
        "   {} login events in {:?} on the fresh stream",
        logins.len(),
        window
    );

    if logins.is_empty() {
        return Ok(TestResult::fail(
            "reconnect",
            "Fresh stream received no login events".to_string(),
            start.elapsed(),
        ));
    }
    if logins.len() > max_events {
        return Ok(TestResult::fail(
            "reconnect",
            format!(
                "{} login events exceed {}; closed streams may still be publishing",
                logins.len(),
                max_events
            ),
            start.elapsed(),
        ));
    }

    println!("{} Closed streams left nothing behind", "✓".green());
    Ok(TestResult::pass("reconnect", start.elapsed()))
}
