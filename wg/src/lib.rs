// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! # wg - media pipeline glue
//!
//! Builds prerolled media source graphs from in-memory buffers and provides
//! the thread-per-task pool those graphs run their streaming threads on.
//!
//! ## Overview
//!
//! The crate sits between a host that hands over raw bytes and a media
//! framework that knows how to demux and decode them. The framework is
//! abstracted behind the [`Backend`] trait; [`memory::MemoryBackend`] is a
//! complete in-process implementation, and the `gst-wg-rs` crate provides
//! one on top of GStreamer.
//!
//! ### Key Concepts
//!
//! - **Caps**: the content type of a buffer ([`ContentType`] in the memory backend)
//! - **Probe**: format detection on the first bytes of a buffer ([`probe::detect_caps`])
//! - **Container**: the graph holding the elements of one source
//! - **Source**: a prerolled container plus the free-standing pad feeding it ([`Source`])
//! - **Task pool**: one OS thread per pushed task ([`TaskPool`])
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   params + Status   ┌──────────────┐
//! │ host/driver│ ──────────────────► │  Dispatcher  │ (handle arenas)
//! └────────────┘                     └──────┬───────┘
//!                                           │
//!                          ┌────────────────┼─────────────────┐
//!                          ▼                ▼                 ▼
//!                    probe::detect   locator::find     Source::create
//!                          │                │                 │
//!                          └────────► Backend ◄───────────────┘
//!                                           │
//!                                       TaskPool
//! ```
//!
//! ## Examples
//!
//! ### Creating a source through the call surface
//!
//! ```
//! use wg::memory::MemoryBackend;
//! use wg::{Dispatcher, GraphState, SourceCreateParams, SourceGetStateParams, Status};
//!
//! let dispatcher = Dispatcher::new(MemoryBackend::new());
//!
//! let mut ogg = b"OggS\x00\x02".to_vec();
//! ogg.resize(64, 0);
//! let mut create = SourceCreateParams::new(Some("file:///music/track.ogg"), &ogg);
//! assert_eq!(dispatcher.source_create(&mut create), Status::Success);
//!
//! let mut state = SourceGetStateParams::new(create.source);
//! assert_eq!(dispatcher.source_get_state(&mut state), Status::Success);
//! assert_eq!(state.state, GraphState::Paused);
//! ```
//!
//! ### Loading configuration
//!
//! ```
//! use wg::config::Config;
//!
//! let config = Config::from_json(r#"{ "task_pool": { "thread_name": "media" } }"#).unwrap();
//! assert_eq!(config.task_pool.thread_name, "media");
//! assert_eq!(config.pipeline.container_name, "wg_source");
//! ```
//!
//! ## Thread Safety
//!
//! - [`Dispatcher`] is `Send + Sync` when its backend is; calls may come from any thread
//! - Source creation blocks the calling thread until the graph has prerolled
//! - [`TaskPool`] tasks run on their own named OS threads

mod backend;
mod calls;
mod caps;
mod error;
mod handle;
mod source;
mod task_pool;
mod transform;

pub mod config;
pub mod locator;
pub mod memory;
pub mod pad;
pub mod probe;

pub use backend::{Backend, GraphState, StateChange};
pub use calls::{
    Dispatcher, SourceCreateParams, SourceDestroyParams, SourceGetStateParams,
    TransformCreateParams, TransformDestroyParams,
};
pub use caps::{ContentType, ContentTypeBuilder, Structure};
pub use error::{Error, Result, Status, ThreadError, ThreadErrorCode};
pub use handle::{Handle, HandleTable};
pub use locator::{FactoryKind, Rank};
pub use pad::PadDirection;
pub use probe::Probability;
pub use source::{BuildStage, Source};
pub use task_pool::{Spawner, Task, TaskHandle, TaskPool, ThreadSpawner};
pub use transform::Transform;
