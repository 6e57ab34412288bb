// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Element locator and chain assembly.
//!
//! [`find_element`] picks a processing element from the backend's registry
//! by capability tag and by the formats it must consume and produce.
//! [`append_element`] and [`link_src_to_element`] wire the result into a
//! container graph.
//!
//! Among equally qualified factories the choice follows the registry's rank
//! and then factory name, so which element is picked depends on what the
//! host has installed. Callers must not rely on a specific element.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::backend::Backend;
use crate::pad::PadDirection;
use crate::{Error, Result};

/// Registry rank of an element factory; higher ranks are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub i32);

impl Rank {
    pub const NONE: Rank = Rank(0);
    pub const MARGINAL: Rank = Rank(64);
    pub const SECONDARY: Rank = Rank(128);
    pub const PRIMARY: Rank = Rank(256);
}

impl Default for Rank {
    fn default() -> Self {
        Rank::MARGINAL
    }
}

/// Functional class advertised by an element factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementClass {
    Decoder,
    Demuxer,
    Parser,
    Depayloader,
    Decryptor,
    Encoder,
    Muxer,
    Converter,
}

/// Capability tag used to query the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryKind {
    /// Anything that takes the input one step closer to raw media:
    /// decoders, demuxers, parsers, depayloaders and decryptors.
    Decodable,
    Decoder,
    Demuxer,
    Parser,
    Encoder,
    Muxer,
}

impl FactoryKind {
    /// Whether a factory of `class` is selected by this tag.
    pub fn includes(self, class: ElementClass) -> bool {
        match self {
            FactoryKind::Decodable => matches!(
                class,
                ElementClass::Decoder
                    | ElementClass::Demuxer
                    | ElementClass::Parser
                    | ElementClass::Depayloader
                    | ElementClass::Decryptor
            ),
            FactoryKind::Decoder => class == ElementClass::Decoder,
            FactoryKind::Demuxer => class == ElementClass::Demuxer,
            FactoryKind::Parser => class == ElementClass::Parser,
            FactoryKind::Encoder => class == ElementClass::Encoder,
            FactoryKind::Muxer => class == ElementClass::Muxer,
        }
    }
}

/// First and last element of a linear chain inside a container.
pub struct Chain<E> {
    pub first: Option<E>,
    pub last: Option<E>,
}

impl<E> Default for Chain<E> {
    fn default() -> Self {
        Chain {
            first: None,
            last: None,
        }
    }
}

/// Finds and instantiates an element of `kind` that consumes `sink_caps`
/// and produces `src_caps`.
///
/// Candidates are ordered by rank (highest first), then by name. The first
/// candidate that can be instantiated wins; factories that fail to create
/// an element are skipped.
pub fn find_element<B: Backend>(
    backend: &B,
    kind: FactoryKind,
    sink_caps: &B::Caps,
    src_caps: &B::Caps,
    min_rank: Rank,
) -> Option<B::Element> {
    let mut candidates: Vec<_> = backend
        .factories(kind, min_rank)
        .into_iter()
        .filter(|f| backend.factory_accepts(f, sink_caps, PadDirection::Sink))
        .filter(|f| backend.factory_accepts(f, src_caps, PadDirection::Src))
        .map(|f| (Reverse(backend.factory_rank(&f)), backend.factory_name(&f), f))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    for (_, name, factory) in candidates {
        match backend.create_element(&factory) {
            Some(element) => {
                debug!(factory = %name, element = %backend.element_name(&element), "Created element");
                return Some(element);
            }
            None => warn!(factory = %name, "Failed to create element"),
        }
    }

    warn!(
        ?kind,
        sink_caps = %sink_caps,
        src_caps = %src_caps,
        "Failed to create element matching caps"
    );
    None
}

/// Adds `element` to `container` and links it after the current chain tail.
///
/// # Errors
///
/// Returns [`Error::LinkFailed`] when the element cannot be added or linked;
/// the chain is left unchanged in that case.
pub fn append_element<B: Backend>(
    backend: &B,
    container: &B::Container,
    element: B::Element,
    chain: &mut Chain<B::Element>,
) -> Result<()> {
    let name = backend.element_name(&element);

    let linked = backend.add_element(container, &element).and_then(|()| match &chain.last {
        Some(last) => backend.link_elements(last, &element),
        None => Ok(()),
    });
    if let Err(err) = linked {
        error!(element = %name, %err, "Failed to link element");
        return Err(Error::LinkFailed(format!("{name}: {err}")));
    }

    debug!(element = %name, "Linked element");
    if chain.first.is_none() {
        chain.first = Some(element.clone());
    }
    chain.last = Some(element);
    Ok(())
}

/// Links a free-standing source pad to a compatible pad on `element`.
pub fn link_src_to_element<B: Backend>(backend: &B, pad: &B::Pad, element: &B::Element) -> Result<()> {
    backend.link_pad(pad, element).map_err(|err| {
        let message = format!(
            "{} to {}: {err}",
            backend.pad_name(pad),
            backend.element_name(element)
        );
        error!("Failed to link {message}");
        Error::LinkFailed(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodable_covers_the_decoding_side_only() {
        assert!(FactoryKind::Decodable.includes(ElementClass::Demuxer));
        assert!(FactoryKind::Decodable.includes(ElementClass::Parser));
        assert!(FactoryKind::Decodable.includes(ElementClass::Decryptor));
        assert!(!FactoryKind::Decodable.includes(ElementClass::Encoder));
        assert!(!FactoryKind::Decodable.includes(ElementClass::Converter));
        assert!(FactoryKind::Muxer.includes(ElementClass::Muxer));
    }

    #[test]
    fn ranks_order_by_preference() {
        assert!(Rank::PRIMARY > Rank::SECONDARY);
        assert!(Rank::SECONDARY > Rank::MARGINAL);
        assert!(Rank::MARGINAL > Rank::NONE);
        assert_eq!(Rank::default(), Rank::MARGINAL);
    }

    mod with_memory_backend {
        use super::*;
        use crate::caps::ContentType;
        use crate::memory::{FactoryInfo, MemoryBackend};

        fn backend_with(factories: Vec<FactoryInfo>) -> MemoryBackend {
            MemoryBackend::builder().factories(factories).build()
        }

        fn demuxer(name: &str, rank: Rank) -> FactoryInfo {
            FactoryInfo::new(
                name,
                rank,
                ElementClass::Demuxer,
                ContentType::new_simple("video/x-test"),
                ContentType::any(),
            )
        }

        #[test]
        fn highest_rank_then_name_wins() {
            let backend = backend_with(vec![
                demuxer("zdemux", Rank::PRIMARY),
                demuxer("ademux", Rank::PRIMARY),
                demuxer("bestdemux", Rank::SECONDARY),
            ]);
            let caps = ContentType::new_simple("video/x-test");
            let element =
                find_element(&backend, FactoryKind::Decodable, &caps, &ContentType::any(), Rank::MARGINAL)
                    .unwrap();
            assert_eq!(element.factory_name(), "ademux");
        }

        #[test]
        fn failing_factory_falls_through_to_next() {
            let backend = backend_with(vec![
                demuxer("brokendemux", Rank::PRIMARY).failing_creation(),
                demuxer("workingdemux", Rank::SECONDARY),
            ]);
            let caps = ContentType::new_simple("video/x-test");
            let element =
                find_element(&backend, FactoryKind::Demuxer, &caps, &ContentType::any(), Rank::MARGINAL)
                    .unwrap();
            assert_eq!(element.factory_name(), "workingdemux");
        }

        #[test]
        fn low_rank_and_wrong_caps_are_excluded() {
            let backend = backend_with(vec![demuxer("lowdemux", Rank::NONE)]);
            let caps = ContentType::new_simple("video/x-test");
            let other = ContentType::new_simple("video/x-other");
            assert!(
                find_element(&backend, FactoryKind::Demuxer, &caps, &ContentType::any(), Rank::MARGINAL)
                    .is_none()
            );
            assert!(
                find_element(&backend, FactoryKind::Demuxer, &other, &ContentType::any(), Rank::NONE)
                    .is_none()
            );
        }

        #[test]
        fn chain_tracks_first_and_last() {
            let backend = backend_with(vec![
                FactoryInfo::new(
                    "xdemux",
                    Rank::PRIMARY,
                    ElementClass::Demuxer,
                    ContentType::new_simple("video/x-test"),
                    ContentType::new_simple("video/x-es"),
                ),
                FactoryInfo::new(
                    "xparse",
                    Rank::PRIMARY,
                    ElementClass::Parser,
                    ContentType::new_simple("video/x-es"),
                    ContentType::new_simple("video/x-es"),
                ),
            ]);
            let container = backend.new_container("chain").unwrap();
            let demux = backend.create_element(&backend.factories(FactoryKind::Demuxer, Rank::NONE)[0]).unwrap();
            let parse = backend.create_element(&backend.factories(FactoryKind::Parser, Rank::NONE)[0]).unwrap();

            let mut chain = Chain::default();
            append_element(&backend, &container, demux, &mut chain).unwrap();
            append_element(&backend, &container, parse, &mut chain).unwrap();
            assert_eq!(chain.first.as_ref().map(|e| e.factory_name()), Some("xdemux"));
            assert_eq!(chain.last.as_ref().map(|e| e.factory_name()), Some("xparse"));
            assert!(chain.last.as_ref().is_some_and(|e| e.is_sink_linked()));
            assert_eq!(container.element_names().len(), 2);
        }

        #[test]
        fn incompatible_append_leaves_chain_unchanged() {
            let backend = backend_with(vec![
                FactoryInfo::new(
                    "audiodemux",
                    Rank::PRIMARY,
                    ElementClass::Demuxer,
                    ContentType::new_simple("audio/x-test"),
                    ContentType::new_simple("audio/x-es"),
                ),
                demuxer("videodemux", Rank::PRIMARY),
            ]);
            let container = backend.new_container("chain").unwrap();
            let factories = backend.factories(FactoryKind::Demuxer, Rank::NONE);
            let audio = backend.create_element(&factories[0]).unwrap();
            let video = backend.create_element(&factories[1]).unwrap();

            let mut chain = Chain::default();
            append_element(&backend, &container, audio, &mut chain).unwrap();
            let err = append_element(&backend, &container, video, &mut chain).unwrap_err();
            assert!(matches!(err, Error::LinkFailed(_)));
            assert_eq!(chain.last.as_ref().map(|e| e.factory_name()), Some("audiodemux"));
        }
    }
}
