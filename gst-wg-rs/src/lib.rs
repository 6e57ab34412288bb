//! GStreamer backend for wg
//!
//! This crate plugs GStreamer into the [`wg`] pipeline glue:
//!
//! - **[`GstBackend`]**: implements [`wg::Backend`] on top of `gst::Bin`,
//!   `gst::Pad`, `gst::ElementFactory` and the typefind helpers
//! - **[`WgTaskPool`]**: a `gst::TaskPool` subclass that runs every pushed
//!   function on a fresh thread of a [`wg::TaskPool`]
//! - **[`bus::install_task_pool`]**: a bus sync handler that hands the pool
//!   to streaming tasks as they are created
//!
//! ## GStreamer Concepts (for non-GStreamer developers)
//! - **Caps (Capabilities)**: Media format descriptions (`audio/x-wav`, ...)
//! - **Typefind**: Format detection from the first bytes of a stream
//! - **Bin**: A container element; state changes propagate to its children
//! - **Streaming task**: The thread driving an element's processing loop
//!
//! ## Example
//! ```no_run
//! use wg::Dispatcher;
//!
//! gstwg::init().unwrap();
//! let dispatcher = Dispatcher::new(gstwg::GstBackend::new());
//! let data = std::fs::read("clip.ogg").unwrap();
//! let handle = dispatcher.create_source(Some("clip.ogg"), &data).unwrap();
//! println!("{}", dispatcher.source_caps(handle).unwrap());
//! dispatcher.destroy_source(handle).unwrap();
//! ```

// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use gstreamer as gst;
use tracing::info;

/// `wg::Backend` implementation on GStreamer objects
mod backend;

/// Bus handling (streaming task pool installation)
pub mod bus;

/// `gst::TaskPool` subclass driven by `wg::TaskPool`
pub mod taskpool;

pub use backend::GstBackend;
pub use taskpool::WgTaskPool;

/// GStreamer debug category for wg messages
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "wgsource",
        gst::DebugColorFlags::empty(),
        Some("wg media source glue"),
    )
});

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes GStreamer for this process.
///
/// Safe to call more than once; only the first successful call logs.
pub fn init() -> Result<(), glib::Error> {
    gst::init()?;
    if !INITIALIZED.swap(true, Ordering::SeqCst) {
        let (major, minor, micro, nano) = gst::version();
        info!(major, minor, micro, nano, "Initialized GStreamer");
        gst::info!(CAT, "wg GStreamer backend ready");
    }
    Ok(())
}

/// Whether [`init`] has succeeded in this process.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}
