// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Element factories of the in-memory registry.

use std::time::Duration;

use crate::caps::ContentType;
use crate::locator::{ElementClass, FactoryKind, Rank};
use crate::pad::PadDirection;

/// How elements created by a factory behave inside a graph.
#[derive(Debug, Clone, Default)]
pub struct ElementBehaviour {
    /// The factory fails to instantiate elements.
    pub fail_create: bool,

    /// Elements refuse to leave NULL/READY.
    pub fail_state_change: bool,

    /// Elements preroll asynchronously, completing after this delay.
    pub preroll_delay: Option<Duration>,
}

/// Registry entry describing one element type.
#[derive(Debug, Clone)]
pub struct FactoryInfo {
    pub name: String,
    pub rank: Rank,
    pub classes: Vec<ElementClass>,
    pub sink_caps: ContentType,
    pub src_caps: ContentType,
    pub behaviour: ElementBehaviour,
}

impl FactoryInfo {
    pub fn new(
        name: impl Into<String>,
        rank: Rank,
        class: ElementClass,
        sink_caps: ContentType,
        src_caps: ContentType,
    ) -> Self {
        FactoryInfo {
            name: name.into(),
            rank,
            classes: vec![class],
            sink_caps,
            src_caps,
            behaviour: ElementBehaviour::default(),
        }
    }

    pub fn failing_creation(mut self) -> Self {
        self.behaviour.fail_create = true;
        self
    }

    pub fn failing_state_change(mut self) -> Self {
        self.behaviour.fail_state_change = true;
        self
    }

    pub fn with_preroll_delay(mut self, delay: Duration) -> Self {
        self.behaviour.preroll_delay = Some(delay);
        self
    }

    pub fn is_kind(&self, kind: FactoryKind) -> bool {
        self.classes.iter().any(|class| kind.includes(*class))
    }

    pub fn accepts(&self, caps: &ContentType, direction: PadDirection) -> bool {
        match direction {
            PadDirection::Sink => self.sink_caps.can_intersect(caps),
            PadDirection::Src => self.src_caps.can_intersect(caps),
        }
    }
}

/// The factories installed by [`super::MemoryBackend::new`].
pub fn default_factories() -> Vec<FactoryInfo> {
    let parser_rank = Rank(Rank::PRIMARY.0 + 1);
    let demuxer = |name: &str, rank: Rank, sink: &str| {
        FactoryInfo::new(
            name,
            rank,
            ElementClass::Demuxer,
            ContentType::new_simple(sink),
            ContentType::any(),
        )
    };

    vec![
        FactoryInfo::new(
            "wavparse",
            Rank::PRIMARY,
            ElementClass::Demuxer,
            ContentType::new_simple("audio/x-wav"),
            ContentType::builder("audio/x-raw").structure("audio/mpeg").build(),
        ),
        demuxer("avidemux", Rank::PRIMARY, "video/x-msvideo"),
        demuxer("oggdemux", Rank::PRIMARY, "application/ogg"),
        demuxer("matroskademux", Rank::PRIMARY, "video/x-matroska"),
        demuxer("qtdemux", Rank::PRIMARY, "video/quicktime"),
        demuxer("asfdemux", Rank::SECONDARY, "video/x-ms-asf"),
        demuxer("id3demux", Rank::PRIMARY, "application/x-id3"),
        FactoryInfo::new(
            "flacparse",
            parser_rank,
            ElementClass::Parser,
            ContentType::new_simple("audio/x-flac"),
            ContentType::builder("audio/x-flac").field("framed", true).build(),
        ),
        FactoryInfo::new(
            "aacparse",
            parser_rank,
            ElementClass::Parser,
            ContentType::builder("audio/mpeg").field("mpegversion", 4).build(),
            ContentType::builder("audio/mpeg")
                .field("mpegversion", 4)
                .field("framed", true)
                .build(),
        ),
    ]
}
