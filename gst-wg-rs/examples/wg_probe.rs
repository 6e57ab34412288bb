// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Probes a media file, builds a source graph for it and tears it down.
//!
//! ```bash
//! cargo run -p gst-wg-rs --example wg_probe -- clip.ogg --task-pool
//! ```

mod common;

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use wg::{Dispatcher, GraphState, SourceCreateParams, SourceDestroyParams, SourceGetStateParams};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Opts {
    /// Media file to probe.
    path: PathBuf,

    /// URL reported as the data origin (defaults to the file path).
    #[arg(long)]
    url: Option<String>,

    /// JSON configuration file (defaults to the file named by WG_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run streaming tasks on the wg task pool.
    #[arg(long)]
    task_pool: bool,

    /// Number of bytes handed to the prober.
    #[arg(long, default_value_t = 64 * 1024)]
    probe_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    common::setup_logging();
    let opts = Opts::parse();

    let config = common::load_config(opts.config.as_deref())?;
    gstwg::init()?;

    let backend = if opts.task_pool {
        gstwg::GstBackend::with_task_pool(config.task_pool.clone())
    } else {
        gstwg::GstBackend::new()
    };
    let dispatcher = Dispatcher::with_config(backend, config);

    let mut data = std::fs::read(&opts.path)?;
    data.truncate(opts.probe_size);
    let url = opts
        .url
        .clone()
        .unwrap_or_else(|| opts.path.display().to_string());

    let mut create = SourceCreateParams::new(Some(&url), &data);
    let status = dispatcher.source_create(&mut create);
    if !status.is_success() {
        error!(?status, "Failed to create source for {}", url);
        return Err(format!("source creation failed: {status:?}").into());
    }

    let mut state = SourceGetStateParams::new(create.source);
    dispatcher.source_get_state(&mut state);
    info!(
        handle = %create.source,
        caps = %dispatcher.source_caps(create.source)?,
        state = %state.state,
        "Source ready"
    );
    if state.state != GraphState::Paused {
        error!(state = %state.state, "Source did not preroll");
    }

    let status = dispatcher.source_destroy(&SourceDestroyParams {
        source: create.source,
    });
    info!(?status, "Source destroyed");
    Ok(())
}
