// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// whir-scan: headless scanner driver.
//
// Reads decoded frames from stdin (one per line, `EAN13:9783161484100`),
// pushes them through a simulated camera into a scanner, and prints one line
// per captured code on stdout. Logs go to stderr.

mod scan;
mod services;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use whir_bridge::SimulatedCamera;
use whir_bridge::traits::CaptureBackend;
use whir_core::error::{Result, WhirError};
use whir_core::human_errors::humanize_error;
use whir_core::types::ScanState;
use whir_scanner::{Scanner, ScannerHandle};

use scan::{ConsoleView, LookupDelegate, ScanOutcome};
use services::app_services::{AppServices, CliOptions};
use services::frames::parse_frame;

const USAGE: &str = "\
usage: whir-scan [--config FILE] [--mode isbn|product] [--continuous] [--front] [--lookup FILE]

Reads one frame per line from stdin, e.g. `EAN13:9783161484100` or `QR:hello`.";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        let human = humanize_error(&e);
        tracing::error!(error = %e, suggestion = %human.suggestion, "{}", human.message);
        std::process::exit(1);
    }
}

fn parse_args() -> Result<Option<CliOptions>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }
    let bad = |e: pico_args::Error| WhirError::Config(e.to_string());

    let options = CliOptions {
        config: args.opt_value_from_str("--config").map_err(bad)?,
        mode: args.opt_value_from_str("--mode").map_err(bad)?,
        continuous: args.contains("--continuous"),
        front: args.contains("--front"),
        lookup: args.opt_value_from_str("--lookup").map_err(bad)?,
    };
    let rest = args.finish();
    if !rest.is_empty() {
        return Err(WhirError::Config(format!("unexpected arguments: {rest:?}")));
    }
    Ok(Some(options))
}

async fn run() -> Result<()> {
    let Some(options) = parse_args()? else {
        println!("{USAGE}");
        return Ok(());
    };
    let services = AppServices::init(&options)?;
    tracing::info!(data_dir = %services.data_dir.display(), "whir-scan starting");

    let camera = Arc::new(SimulatedCamera::new());
    let backend: Arc<dyn CaptureBackend> = camera.clone();
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel();
    let delegate = LookupDelegate::new(Arc::clone(&services.lookup), outcome_tx);

    let (handle, task) = Scanner::new(services.config.clone(), backend)
        .with_view(ConsoleView)
        .spawn(delegate)?;

    let result = drive(&handle, &camera, &mut outcomes).await;

    handle.shutdown()?;
    task.await
        .map_err(|e| WhirError::Bridge(format!("scanner task failed: {e}")))?;
    print_outcomes(&mut outcomes);

    let snapshot = handle.snapshot();
    tracing::info!(
        frames = snapshot.frames,
        deliveries = snapshot.deliveries,
        "whir-scan finished"
    );
    result
}

/// Feed stdin frames to the camera, one scan attempt at a time.
async fn drive(
    handle: &ScannerHandle,
    camera: &SimulatedCamera,
    outcomes: &mut mpsc::UnboundedReceiver<ScanOutcome>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let ready = handle
            .wait_until(|s| {
                (s.state == ScanState::Scanning && s.capturing)
                    || s.state == ScanState::Unauthorized
            })
            .await?;
        print_outcomes(outcomes);
        if ready.state == ScanState::Unauthorized {
            return Err(WhirError::CameraAccessDenied);
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                None
            }
        };
        let Some(line) = line else {
            return Ok(());
        };

        let frame = match parse_frame(&line) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "skipping line");
                continue;
            }
        };
        let seen = handle.snapshot().frames;
        if camera.emit(frame) {
            handle.wait_until(|s| s.frames > seen).await?;
        }
    }
}

fn print_outcomes(outcomes: &mut mpsc::UnboundedReceiver<ScanOutcome>) {
    while let Ok(outcome) = outcomes.try_recv() {
        println!("{outcome}");
    }
}
