//! Sage application binary - composition root.
//!
//! Ties the crates together into a runnable demo:
//! 1. Load configuration from TOML
//! 2. Wire the dialog controller to in-memory collaborators
//! 3. Drive it from a stdin line loop
//!
//! Input conventions:
//! - `/summary`, `/plan`, `/cancel`, ... are commands
//! - `cb <choice_id>` simulates pressing the button with that id
//! - anything else is a plain text message

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local};
use tokio::io::{AsyncBufReadExt, BufReader};

use sage_core::{CalendarEvent, Event, Reply, Result as SageResult, SageConfig, UserId};
use sage_dialog::{
    AdminNotifier, DialogController, Generator, KeywordModerator, StaticCalendarSource,
    StaticNoteSource,
};

/// The single user of the stdin demo.
const DEMO_USER: UserId = 1;

/// Canned [`Generator`] for running the engine without a remote model.
struct DemoGenerator;

#[async_trait]
impl Generator for DemoGenerator {
    async fn generate(&self, prompt: &str) -> SageResult<String> {
        tracing::debug!(prompt_len = prompt.len(), "demo generation");
        if prompt.contains("study plan") {
            Ok("Day 1: review the core definitions - re-read your notes\n\
                Day 2: work through the main topics - write a one-page outline\n\
                Day 3: practice problems - time yourself\n\
                Day 4: review weak spots - revisit anything you got wrong\n\
                Day 5: full rehearsal - explain each topic out loud"
                .to_string())
        } else {
            Ok("Summary of your notes:\n\
                - The material covers the core topics in your own words\n\
                - Worked examples appear throughout\n\n\
                Key takeaways:\n\
                1. Revisit the definitions first\n\
                2. The examples map directly to likely exam questions\n\
                3. Practice recall, not re-reading"
                .to_string())
        }
    }
}

/// [`AdminNotifier`] that surfaces notifications in the log.
struct LogNotifier;

#[async_trait]
impl AdminNotifier for LogNotifier {
    async fn notify(&self, message: &str) {
        tracing::warn!(notification = message, "admin notification");
    }
}

/// Seed notes for the demo.
fn demo_notes() -> StaticNoteSource {
    StaticNoteSource::new(vec![
        (
            "Data Science".to_string(),
            "Supervised learning: regression and classification. \
             Unsupervised learning: clustering, dimensionality reduction. \
             Model evaluation: train/test split, cross-validation, overfitting."
                .to_string(),
        ),
        (
            "Biology".to_string(),
            "Cell structure: membrane, nucleus, mitochondria. \
             Cell division: mitosis and meiosis. \
             Photosynthesis: light-dependent and light-independent reactions."
                .to_string(),
        ),
        ("Scratchpad".to_string(), String::new()),
    ])
}

/// Seed calendar events relative to today.
fn demo_events() -> Vec<CalendarEvent> {
    let today = Local::now().date_naive();
    let event = |id: &str, summary: &str, days: i64| {
        let date = (today + Duration::days(days)).to_string();
        CalendarEvent {
            id: id.to_string(),
            summary: summary.to_string(),
            start_iso: date.clone(),
            end_iso: date,
        }
    };
    vec![
        event("1", "DS Midterm", 7),
        event("2", "Biology Quiz", 5),
        event("3", "Bio Exam", 14),
        event("4", "Dentist appointment", 3),
    ]
}

/// Resolve the config file path (SAGE_CONFIG env, or ~/.sage/config.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("SAGE_CONFIG") {
        return PathBuf::from(p);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sage").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Turn one input line into a transport event.
fn parse_line(line: &str) -> Option<Event> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(rest) = line.strip_prefix('/') {
        let name = rest.split_whitespace().next().unwrap_or("");
        return Some(Event::Command {
            user_id: DEMO_USER,
            name: name.to_string(),
        });
    }
    if let Some(choice_id) = line.strip_prefix("cb ") {
        return Some(Event::Callback {
            user_id: DEMO_USER,
            choice_id: choice_id.trim().to_string(),
        });
    }
    Some(Event::Text {
        user_id: DEMO_USER,
        text: line.to_string(),
    })
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Text { text, .. } => println!("{}\n", text),
        Reply::Choices { text, choices, .. } => {
            println!("{}", text);
            for choice in choices {
                println!("  [{}] {}", choice.choice_id, choice.label);
            }
            println!();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config.
    let config_file = config_path();
    let config = SageConfig::load_or_default(&config_file);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Sage v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let controller = DialogController::new(
        &config,
        Arc::new(demo_notes()),
        Arc::new(StaticCalendarSource::new(demo_events())),
        Arc::new(KeywordModerator::new(vec!["restricted".to_string()])),
        Arc::new(DemoGenerator),
        Arc::new(LogNotifier),
    );

    println!("Sage study companion. Type /summary or /plan; 'cb <id>' presses a button.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(event) = parse_line(&line) else {
            continue;
        };
        for reply in controller.handle_event(event).await {
            print_reply(&reply);
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}
