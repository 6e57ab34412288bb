// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline builder for media sources.
//!
//! [`Source::create`] turns a byte buffer into a prerolled container graph:
//!
//! ```text
//! Empty ──probe──► Probed ──pad + element + link──► Linked ──activate──► Active
//!                                                                          │
//!                            Running ◄──── wait for PAUSED (blocking) ─────┘
//! ```
//!
//! Any failure along the way moves the build to [`BuildStage::Failed`]: the
//! container is forced to NULL and every resource acquired so far is
//! released in reverse order before the error is returned. No partially
//! built source is ever handed out, and nothing is retried.
//!
//! The wait for PAUSED has no timeout unless
//! [`PipelineConfig::state_timeout_ms`] is set, so a misbehaving element can
//! stall creation indefinitely.

use std::fmt;

use tracing::{debug, error, info};

use crate::backend::{Backend, GraphState};
use crate::config::{Config, PipelineConfig};
use crate::locator::{self, Chain, FactoryKind, Rank};
use crate::pad::{self, PadDirection};
use crate::probe::{self, Probability};
use crate::{Error, Result};

/// Progress of a source build, reported in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Empty,
    Probed,
    Linked,
    Active,
    Running,
    Failed,
    Destroyed,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Resources acquired by an in-progress build.
///
/// Dropping it tears the partial graph down; [`Partial::finish`] hands the
/// resources over to a [`Source`] instead.
struct Partial<'a, B: Backend> {
    backend: &'a B,
    stage: BuildStage,
    container: Option<B::Container>,
    src_pad: Option<B::Pad>,
}

impl<'a, B: Backend> Partial<'a, B> {
    fn new(backend: &'a B) -> Self {
        Partial {
            backend,
            stage: BuildStage::Empty,
            container: None,
            src_pad: None,
        }
    }

    fn advance(&mut self, stage: BuildStage) {
        debug!(from = %self.stage, to = %stage, "Source build stage");
        self.stage = stage;
    }

    fn finish(mut self) -> Option<(B::Container, B::Pad)> {
        Some((self.container.take()?, self.src_pad.take()?))
    }
}

impl<B: Backend> Drop for Partial<'_, B> {
    fn drop(&mut self) {
        if self.container.is_none() && self.src_pad.is_none() {
            return;
        }
        error!(stage = %self.stage, "Failed to create source");
        self.stage = BuildStage::Failed;
        if let Some(container) = &self.container {
            if let Err(err) = self.backend.set_state(container, GraphState::Null) {
                error!(%err, "Failed to stop partially built container");
            }
        }
        // Release in reverse order of acquisition.
        drop(self.src_pad.take());
        drop(self.container.take());
    }
}

/// A prerolled container graph fed through a free-standing source pad.
pub struct Source<B: Backend> {
    container: B::Container,
    src_pad: B::Pad,
    caps: B::Caps,
    probability: Probability,
}

impl<B: Backend> fmt::Debug for Source<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("caps", &self.caps.to_string())
            .field("probability", &self.probability)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Source<B> {
    /// Builds a source for `data` with default configuration.
    pub fn create(backend: &B, url: Option<&str>, data: &[u8]) -> Result<Self> {
        Self::create_with_config(backend, &Config::default(), url, data)
    }

    /// Builds a source for `data`, whose origin `url` (if known) is used as
    /// a format hint.
    ///
    /// # Errors
    ///
    /// - [`Error::UnrecognizedInput`] if the format cannot be detected
    /// - [`Error::ResourceExhausted`] if the container or pad cannot be built
    /// - [`Error::LinkFailed`] if no element handles the format or linking fails
    /// - [`Error::StateChange`] / [`Error::Timeout`] if the graph does not
    ///   reach PAUSED
    pub fn create_with_config(
        backend: &B,
        config: &Config,
        url: Option<&str>,
        data: &[u8],
    ) -> Result<Self> {
        let probe = probe::detect_caps(backend, url, data)?;
        let mut partial = Partial::new(backend);
        partial.advance(BuildStage::Probed);

        let (first, container, src_pad) =
            Self::link(&mut partial, &probe.caps, &config.pipeline, config.locator.min_rank)?;
        partial.advance(BuildStage::Linked);

        backend.set_pad_active(&src_pad, true)?;
        partial.advance(BuildStage::Active);

        Self::preroll(backend, &container, &config.pipeline)?;
        partial.advance(BuildStage::Running);

        debug!(first = %backend.element_name(&first), "Source graph prerolled");
        let (container, src_pad) = partial
            .finish()
            .ok_or_else(|| Error::ResourceExhausted("source resources vanished".to_owned()))?;

        let source = Source {
            container,
            src_pad,
            caps: probe.caps,
            probability: probe.probability,
        };
        info!(caps = %source.caps, "Created source");
        Ok(source)
    }

    /// Builds the container, the source pad and the first element, and links
    /// them. Resources are registered with `partial` as soon as they exist.
    fn link(
        partial: &mut Partial<'_, B>,
        caps: &B::Caps,
        config: &PipelineConfig,
        min_rank: Rank,
    ) -> Result<(B::Element, B::Container, B::Pad)> {
        let backend = partial.backend;

        let container = backend.new_container(&config.container_name).ok_or_else(|| {
            Error::ResourceExhausted(format!("container {}", config.container_name))
        })?;
        partial.container = Some(container.clone());

        let src_pad = pad::create_pad_with_caps(backend, PadDirection::Src, Some(caps))
            .ok_or_else(|| Error::ResourceExhausted("source pad".to_owned()))?;
        partial.src_pad = Some(src_pad.clone());

        let any_caps = backend.any_caps();
        let element = locator::find_element(backend, FactoryKind::Decodable, caps, &any_caps, min_rank)
            .ok_or_else(|| Error::LinkFailed(format!("no decodable element for {caps}")))?;

        let mut chain = Chain::default();
        locator::append_element(backend, &container, element, &mut chain)?;
        let first = chain
            .first
            .ok_or_else(|| Error::LinkFailed("empty element chain".to_owned()))?;

        locator::link_src_to_element(backend, &src_pad, &first)?;
        Ok((first, container, src_pad))
    }

    /// Requests PAUSED and blocks until the transition settles.
    fn preroll(backend: &B, container: &B::Container, config: &PipelineConfig) -> Result<()> {
        let change = backend.set_state(container, GraphState::Paused)?;
        debug!(?change, "Requested PAUSED");
        match backend.wait_state(container, config.state_timeout())? {
            GraphState::Paused | GraphState::Playing => Ok(()),
            state => Err(Error::StateChange(format!(
                "container settled in {state} instead of PAUSED"
            ))),
        }
    }

    /// Stops the container and releases the graph and the source pad.
    pub fn destroy(self, backend: &B) {
        let Source {
            container,
            src_pad,
            caps,
            ..
        } = self;
        if let Err(err) = backend.set_state(&container, GraphState::Null) {
            error!(%err, "Failed to stop source container");
        }
        drop(container);
        drop(src_pad);
        info!(caps = %caps, stage = %BuildStage::Destroyed, "Destroyed source");
    }

    /// Content type detected for the input buffer.
    pub fn caps(&self) -> &B::Caps {
        &self.caps
    }

    pub fn probability(&self) -> Probability {
        self.probability
    }

    pub fn container(&self) -> &B::Container {
        &self.container
    }

    pub fn src_pad(&self) -> &B::Pad {
        &self.src_pad
    }

    /// Current state of the container, without waiting for pending changes.
    pub fn state(&self, backend: &B) -> GraphState {
        backend.current_state(&self.container)
    }
}
