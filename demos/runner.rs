// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use superluminal_perf::ProfilerColor;

pub fn set_up_tracing() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let format = tracing_subscriber::fmt::layer().pretty();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .init();
}

/// Simple program to try out the Superluminal instrumentation
#[derive(Parser, Debug)]
struct Args {
    /// Path to PerformanceAPI, instead of the installation directory
    #[arg(long)]
    library: Option<PathBuf>,
    #[arg(long, default_value_t = 100)]
    sleep_ms: u64,
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

fn work(sleep: Duration) {
    let _event = superluminal_perf::begin_event_with_color(
        "Work",
        Some("sleeping"),
        ProfilerColor::rgb(0x40, 0xA0, 0x40),
    );
    std::thread::sleep(sleep);
}

fn main() -> Result<(), anyhow::Error> {
    set_up_tracing();
    let args = Args::parse();

    superluminal_perf::initialize(args.library.as_deref())?;
    tracing::info!(
        available = superluminal_perf::is_available(),
        version = ?superluminal_perf::api_version(),
        "initialized"
    );

    superluminal_perf::set_current_thread_name("Hello!");
    let sleep = Duration::from_millis(args.sleep_ms);

    let marker = superluminal_perf::begin_event("MyMarker", None);
    std::thread::scope(|s| {
        for i in 0..args.workers {
            s.spawn(move || {
                superluminal_perf::set_current_thread_name(&format!("Worker {i}"));
                work(sleep);
            });
        }
    });
    tracing::info!("workers finished, waiting {sleep:?}");
    std::thread::sleep(sleep);
    marker.end();

    Ok(())
}
