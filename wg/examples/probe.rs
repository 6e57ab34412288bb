// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Probes files with the in-memory backend and reports what a source graph
//! for each would look like.
//!
//! ```bash
//! cargo run -p wg --example probe -- song.flac clip.mkv
//! ```

mod common;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use wg::memory::MemoryBackend;
use wg::{Error, Source};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Opts {
    /// Files to probe.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// JSON configuration file (defaults to the file named by WG_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Error> {
    common::setup_logging();
    let opts = Opts::parse();
    let config = common::load_config(opts.config.as_deref())?;
    let backend = MemoryBackend::builder()
        .recognizers(wg::memory::default_recognizers())
        .factories(wg::memory::default_factories())
        .task_pool(config.task_pool.clone())
        .build();

    for path in &opts.paths {
        let data = std::fs::read(path)?;
        let url = path.display().to_string();
        match Source::create_with_config(&backend, &config, Some(&url), &data) {
            Ok(source) => {
                info!(
                    file = %url,
                    caps = %source.caps(),
                    probability = %source.probability(),
                    elements = ?source.container().element_names(),
                    "Source graph"
                );
                source.destroy(&backend);
            }
            Err(err) => warn!(file = %url, %err, "No source graph"),
        }
    }
    Ok(())
}
