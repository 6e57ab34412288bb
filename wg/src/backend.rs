// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! The media framework seen from the pipeline glue.
//!
//! Everything the glue needs from a multimedia framework (format detection,
//! pads, the element registry, container graphs and their state machine) is
//! reached through [`Backend`]. The framework's objects appear as associated
//! types so a backend can hand out its own reference-counted handles
//! directly, with no boxing or downcasting on the glue side.
//!
//! Two implementations exist: [`crate::memory::MemoryBackend`], a
//! self-contained registry used by tests and tools, and the GStreamer
//! backend in the `gst-wg-rs` crate.

use std::fmt;
use std::time::Duration;

use crate::locator::{FactoryKind, Rank};
use crate::pad::{PadDirection, PadTemplate};
use crate::probe::Probability;
use crate::Result;

/// Container graph states, in transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphState {
    /// No pending state.
    VoidPending,
    /// Initial state: no resources allocated.
    Null,
    /// Resources allocated, not processing.
    Ready,
    /// Prerolled; ready to process data but the clock is not running.
    Paused,
    /// Processing with a running clock.
    Playing,
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphState::VoidPending => "VOID_PENDING",
            GraphState::Null => "NULL",
            GraphState::Ready => "READY",
            GraphState::Paused => "PAUSED",
            GraphState::Playing => "PLAYING",
        };
        f.write_str(name)
    }
}

/// Successful outcome of a state change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// The transition completed synchronously.
    Success,
    /// The transition continues in the background; wait for it.
    Async,
    /// Completed, but the graph cannot preroll (live sources).
    NoPreroll,
}

/// Capabilities the pipeline glue requires from a media framework.
pub trait Backend: Send + Sync {
    /// Content-type descriptor.
    type Caps: Clone + fmt::Display + Send + Sync;
    /// Registry entry able to instantiate an element.
    type Factory: Clone + Send;
    /// Processing element.
    type Element: Clone + Send;
    /// Connection point.
    type Pad: Clone + Send;
    /// Container graph.
    type Container: Clone + Send;

    /// Whether the framework has been initialized for this process.
    fn is_initialized(&self) -> bool;

    /// Runs every registered format recognizer over `data` and returns the
    /// best match, if any.
    fn type_find(&self, data: &[u8], extension: Option<&str>) -> Option<(Self::Caps, Probability)>;

    /// The unconstrained descriptor.
    fn any_caps(&self) -> Self::Caps;

    /// Instantiates a pad from a template; `None` if either cannot be built.
    fn new_pad(&self, template: &PadTemplate<Self::Caps>) -> Option<Self::Pad>;

    fn set_pad_active(&self, pad: &Self::Pad, active: bool) -> Result<()>;

    fn pad_name(&self, pad: &Self::Pad) -> String;

    /// Registered factories advertising `kind` with at least `min_rank`.
    fn factories(&self, kind: FactoryKind, min_rank: Rank) -> Vec<Self::Factory>;

    fn factory_name(&self, factory: &Self::Factory) -> String;

    fn factory_rank(&self, factory: &Self::Factory) -> Rank;

    /// Whether any pad template of `direction` on `factory` accepts `caps`.
    fn factory_accepts(
        &self,
        factory: &Self::Factory,
        caps: &Self::Caps,
        direction: PadDirection,
    ) -> bool;

    fn create_element(&self, factory: &Self::Factory) -> Option<Self::Element>;

    fn element_name(&self, element: &Self::Element) -> String;

    fn new_container(&self, name: &str) -> Option<Self::Container>;

    /// Adds `element` to `container` and syncs it with the container state.
    fn add_element(&self, container: &Self::Container, element: &Self::Element) -> Result<()>;

    /// Links the source side of `upstream` to the sink side of `downstream`.
    fn link_elements(&self, upstream: &Self::Element, downstream: &Self::Element) -> Result<()>;

    /// Links a free-standing source pad to a compatible sink pad on `element`.
    fn link_pad(&self, pad: &Self::Pad, element: &Self::Element) -> Result<()>;

    fn set_state(&self, container: &Self::Container, state: GraphState) -> Result<StateChange>;

    /// State the container is in right now, ignoring pending transitions.
    fn current_state(&self, container: &Self::Container) -> GraphState;

    /// Blocks until any pending transition finishes and returns the current
    /// state. `None` waits forever; [`crate::Error::Timeout`] is returned when
    /// a bounded wait expires first.
    fn wait_state(&self, container: &Self::Container, timeout: Option<Duration>)
    -> Result<GraphState>;
}
