//! Traffic Light Demo
//!
//! Drives a terminal traffic light through a fixed script of overlapping
//! requests: each one is fired without waiting for the previous animation,
//! so ALERT blinking and CLOSED's yellow phase get preempted mid-flight.
//!
//! Key concepts:
//! - Requests issued from independent tasks
//! - Cooperative preemption of running animations
//! - A custom `Surface` that paints ANSI colors
//!
//! Run with: cargo run --example traffic_light
//!
//! Set `STOPLIGHT_CONFIG` to a JSON file to override timing, and `RUST_LOG`
//! to see the controller's tracing output on stderr.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use stoplight::core::{Frame, LightState};
use stoplight::surface::Surface;
use stoplight::{ControllerConfig, TransitionController};
use tracing_subscriber::EnvFilter;

const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[33m";
const REVERSE: &str = "\x1b[;7m";
const RESET: &str = "\x1b[0;0m";

const POSITION_LOG: &str = "\x1b[1H";
const POSITION_COLOR: &str = "\x1b[2H";

const STEP: Duration = Duration::from_secs(5);

struct TerminalSurface;

impl TerminalSurface {
    fn paint(frame: Frame) -> String {
        let code = frame.code().to_uppercase();
        match frame {
            Frame::Green => format!("{REVERSE}{GREEN}{code} {RESET}"),
            Frame::Yellow => format!("{REVERSE}{YELLOW}{code} {RESET}"),
            Frame::Red => format!("{REVERSE}{RED}{code} {RESET}"),
            Frame::AlertLit => format!("{REVERSE}{YELLOW}{code} {RESET}"),
            Frame::AlertDim => format!("{YELLOW}{code} {RESET}"),
        }
    }

    fn write_at(position: &str, line: &str) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{position}\x1b[2K{line}")?;
        stdout.flush()
    }
}

impl Surface for TerminalSurface {
    fn render(&self, _state: LightState, frame: Frame) {
        let line = format!("Traffic Light: {} {}", Self::paint(frame), frame.phase());
        let _ = Self::write_at(POSITION_COLOR, &line);
    }

    fn log(&self, message: &str) {
        let _ = Self::write_at(POSITION_LOG, message);
    }
}

fn load_config() -> Result<ControllerConfig, Box<dyn std::error::Error>> {
    match std::env::var("STOPLIGHT_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(ControllerConfig::from_json(&json)?)
        }
        Err(_) => Ok(ControllerConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let controller = TransitionController::builder()
        .surface(Arc::new(TerminalSurface))
        .config(load_config()?)
        .build()?;

    print!("\x1b[2J");

    let script = [
        LightState::Alert,
        LightState::Closed,
        LightState::Open,
        LightState::Closed,
        LightState::Alert,
        LightState::Open,
    ];

    let mut handles = Vec::new();
    for state in script {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move { controller.transition(state).await }));
        tokio::time::sleep(STEP).await;
    }

    for handle in handles {
        handle.await??;
    }
    controller.surface().log("Script finished");

    let history = controller.history();
    println!();
    println!("=== {} transitions ===", history.len());
    for record in history.records() {
        println!(
            "  #{:<2} {:<6} {:?} ({:?})",
            record.seq,
            record.state.name(),
            record.outcome,
            record.handoff
        );
    }

    Ok(())
}
