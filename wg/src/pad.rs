// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Pad factory: typed connection points for container graphs.

use tracing::{debug, error};

use crate::backend::Backend;

/// Data flow direction of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadDirection {
    /// Producer side.
    Src,
    /// Consumer side.
    Sink,
}

impl PadDirection {
    /// Conventional template name for this direction.
    pub fn template_name(self) -> &'static str {
        match self {
            PadDirection::Src => "src",
            PadDirection::Sink => "sink",
        }
    }
}

/// When pads created from a template exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadPresence {
    Always,
    Sometimes,
    Request,
}

/// Description from which concrete pads are instantiated.
#[derive(Debug, Clone)]
pub struct PadTemplate<C> {
    pub name: &'static str,
    pub direction: PadDirection,
    pub presence: PadPresence,
    pub caps: C,
}

impl<C> PadTemplate<C> {
    /// An always-present template named after its direction.
    pub fn new(direction: PadDirection, caps: C) -> Self {
        PadTemplate {
            name: direction.template_name(),
            direction,
            presence: PadPresence::Always,
            caps,
        }
    }
}

/// Creates a pad of `direction` constrained to `caps`, or to ANY when no
/// caps are given.
///
/// Returns `None` when the backend cannot build the template or the pad;
/// the caller must unwind whatever it has built so far.
pub fn create_pad_with_caps<B: Backend>(
    backend: &B,
    direction: PadDirection,
    caps: Option<&B::Caps>,
) -> Option<B::Pad> {
    let caps = caps.cloned().unwrap_or_else(|| backend.any_caps());
    let template = PadTemplate::new(direction, caps);
    match backend.new_pad(&template) {
        Some(pad) => {
            debug!(
                pad = %backend.pad_name(&pad),
                caps = %template.caps,
                "Created {} pad",
                template.name
            );
            Some(pad)
        }
        None => {
            error!(caps = %template.caps, "Failed to create {} pad", template.name);
            None
        }
    }
}
