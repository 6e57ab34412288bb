// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the wg examples.

use std::path::Path;

use wg::config::Config;

/// Installs a stdout subscriber at INFO, overridable through `RUST_LOG`.
pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

/// Reads `path` when given, otherwise whatever `WG_CONFIG` points at.
pub fn load_config(path: Option<&Path>) -> wg::Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}
