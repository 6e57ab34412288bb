//! `wg::Backend` on GStreamer.
//!
//! Containers are `gst::Pipeline`s viewed as `gst::Bin`s, so every source
//! graph owns a bus on which its streaming tasks announce themselves. When
//! a [`WgTaskPool`] is configured, each new container gets a sync handler
//! that moves those tasks onto the pool.

// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use glib::translate::IntoGlib;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_base as gst_base;
use tracing::{debug, warn};

use wg::config::TaskPoolConfig;
use wg::locator::{FactoryKind, Rank};
use wg::pad::{PadPresence, PadTemplate};
use wg::{Backend, Error, GraphState, PadDirection, Probability, Result, StateChange};

use crate::{CAT, WgTaskPool, bus};

/// GStreamer implementation of [`wg::Backend`].
#[derive(Debug, Clone, Default)]
pub struct GstBackend {
    task_pool: Option<WgTaskPool>,
}

impl GstBackend {
    /// Backend leaving streaming tasks on GStreamer's default pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend running the streaming tasks of every container it creates
    /// on a [`WgTaskPool`] built from `config`.
    pub fn with_task_pool(config: TaskPoolConfig) -> Self {
        GstBackend {
            task_pool: Some(WgTaskPool::new(config)),
        }
    }

    pub fn task_pool(&self) -> Option<&WgTaskPool> {
        self.task_pool.as_ref()
    }
}

fn factory_type(kind: FactoryKind) -> gst::ElementFactoryType {
    match kind {
        FactoryKind::Decodable => gst::ElementFactoryType::DECODABLE,
        FactoryKind::Decoder => gst::ElementFactoryType::DECODER,
        FactoryKind::Demuxer => gst::ElementFactoryType::DEMUXER,
        FactoryKind::Parser => gst::ElementFactoryType::PARSER,
        FactoryKind::Encoder => gst::ElementFactoryType::ENCODER,
        FactoryKind::Muxer => gst::ElementFactoryType::MUXER,
    }
}

fn graph_state(state: gst::State) -> GraphState {
    match state {
        gst::State::Null => GraphState::Null,
        gst::State::Ready => GraphState::Ready,
        gst::State::Paused => GraphState::Paused,
        gst::State::Playing => GraphState::Playing,
        _ => GraphState::VoidPending,
    }
}

fn gst_state(state: GraphState) -> gst::State {
    match state {
        GraphState::VoidPending => gst::State::VoidPending,
        GraphState::Null => gst::State::Null,
        GraphState::Ready => gst::State::Ready,
        GraphState::Paused => gst::State::Paused,
        GraphState::Playing => gst::State::Playing,
    }
}

impl Backend for GstBackend {
    type Caps = gst::Caps;
    type Factory = gst::ElementFactory;
    type Element = gst::Element;
    type Pad = gst::Pad;
    type Container = gst::Bin;

    fn is_initialized(&self) -> bool {
        crate::is_initialized()
    }

    fn type_find(&self, data: &[u8], extension: Option<&str>) -> Option<(gst::Caps, Probability)> {
        match gst_base::type_find_helper_for_data_with_extension(
            None::<&gst::Object>,
            data,
            extension,
        ) {
            Ok((caps, probability)) => {
                let percent = probability.into_glib().max(0) as u32;
                Some((caps, Probability::from_percent(percent)))
            }
            Err(err) => {
                debug!(%err, "Typefind found nothing");
                None
            }
        }
    }

    fn any_caps(&self) -> gst::Caps {
        gst::Caps::new_any()
    }

    fn new_pad(&self, template: &PadTemplate<gst::Caps>) -> Option<gst::Pad> {
        let direction = match template.direction {
            PadDirection::Src => gst::PadDirection::Src,
            PadDirection::Sink => gst::PadDirection::Sink,
        };
        let presence = match template.presence {
            PadPresence::Always => gst::PadPresence::Always,
            PadPresence::Sometimes => gst::PadPresence::Sometimes,
            PadPresence::Request => gst::PadPresence::Request,
        };
        let pad_template =
            match gst::PadTemplate::new(template.name, direction, presence, &template.caps) {
                Ok(pad_template) => pad_template,
                Err(err) => {
                    warn!(%err, "Failed to create pad template");
                    return None;
                }
            };
        Some(gst::Pad::builder_from_template(&pad_template).build())
    }

    fn set_pad_active(&self, pad: &gst::Pad, active: bool) -> Result<()> {
        pad.set_active(active)
            .map_err(|err| Error::StateChange(format!("activating {}: {err}", pad.name())))
    }

    fn pad_name(&self, pad: &gst::Pad) -> String {
        pad.name().to_string()
    }

    fn factories(&self, kind: FactoryKind, min_rank: Rank) -> Vec<gst::ElementFactory> {
        gst::ElementFactory::factories_with_type(factory_type(kind), gst::Rank::NONE)
            .into_iter()
            .filter(|factory| factory.rank().into_glib() >= min_rank.0)
            .collect()
    }

    fn factory_name(&self, factory: &gst::ElementFactory) -> String {
        factory.name().to_string()
    }

    fn factory_rank(&self, factory: &gst::ElementFactory) -> Rank {
        Rank(factory.rank().into_glib())
    }

    fn factory_accepts(
        &self,
        factory: &gst::ElementFactory,
        caps: &gst::Caps,
        direction: PadDirection,
    ) -> bool {
        match direction {
            PadDirection::Sink => factory.can_sink_any_caps(caps),
            PadDirection::Src => factory.can_src_any_caps(caps),
        }
    }

    fn create_element(&self, factory: &gst::ElementFactory) -> Option<gst::Element> {
        match factory.create().build() {
            Ok(element) => Some(element),
            Err(err) => {
                warn!(factory = %factory.name(), %err, "Factory failed to create element");
                None
            }
        }
    }

    fn element_name(&self, element: &gst::Element) -> String {
        element.name().to_string()
    }

    fn new_container(&self, name: &str) -> Option<gst::Bin> {
        let pipeline = gst::Pipeline::builder().name(name).build();
        if let Some(pool) = &self.task_pool {
            let bus = pipeline.bus()?;
            bus::install_task_pool(&bus, pool);
        }
        Some(pipeline.upcast())
    }

    fn add_element(&self, container: &gst::Bin, element: &gst::Element) -> Result<()> {
        container
            .add(element)
            .map_err(|err| Error::LinkFailed(format!("adding {}: {err}", element.name())))?;
        element
            .sync_state_with_parent()
            .map_err(|err| Error::LinkFailed(format!("syncing {}: {err}", element.name())))
    }

    fn link_elements(&self, upstream: &gst::Element, downstream: &gst::Element) -> Result<()> {
        upstream.link(downstream).map_err(|err| {
            Error::LinkFailed(format!("{} ! {}: {err}", upstream.name(), downstream.name()))
        })
    }

    fn link_pad(&self, pad: &gst::Pad, element: &gst::Element) -> Result<()> {
        let sink = element.compatible_pad(pad, None).ok_or_else(|| {
            Error::LinkFailed(format!("{} has no pad compatible with {}", element.name(), pad.name()))
        })?;
        pad.link(&sink)
            .map(|_| ())
            .map_err(|err| Error::LinkFailed(format!("{err:?}")))
    }

    fn set_state(&self, container: &gst::Bin, state: GraphState) -> Result<StateChange> {
        gst::debug!(CAT, obj = container, "Setting state {}", state);
        match container.set_state(gst_state(state)) {
            Ok(gst::StateChangeSuccess::Success) => Ok(StateChange::Success),
            Ok(gst::StateChangeSuccess::Async) => Ok(StateChange::Async),
            Ok(gst::StateChangeSuccess::NoPreroll) => Ok(StateChange::NoPreroll),
            Err(err) => Err(Error::StateChange(format!("{}: {err}", container.name()))),
        }
    }

    fn current_state(&self, container: &gst::Bin) -> GraphState {
        graph_state(container.current_state())
    }

    fn wait_state(&self, container: &gst::Bin, timeout: Option<Duration>) -> Result<GraphState> {
        let timeout =
            timeout.map(|timeout| gst::ClockTime::from_nseconds(timeout.as_nanos() as u64));
        let (result, current, pending) = container.state(timeout);
        match result {
            Ok(gst::StateChangeSuccess::Async) => {
                gst::warning!(CAT, obj = container, "Still changing to {:?}", pending);
                Err(Error::Timeout)
            }
            Ok(_) => Ok(graph_state(current)),
            Err(err) => Err(Error::StateChange(format!("{}: {err}", container.name()))),
        }
    }
}
