// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Self-contained media backend.
//!
//! [`MemoryBackend`] implements [`Backend`] without any external media
//! framework: format detection is done by magic-byte [`Recognizer`]s, the
//! registry is a list of [`FactoryInfo`]s, and containers track their state
//! behind a condition variable. Asynchronous prerolls run on the backend's
//! [`TaskPool`], the way a framework's streaming threads would.
//!
//! Every pad, element and container counts itself in
//! [`MemoryBackend::live_objects`] until its last reference is dropped,
//! which makes resource leaks observable in tests.
//!
//! ```
//! use wg::memory::MemoryBackend;
//! use wg::Source;
//!
//! let backend = MemoryBackend::new();
//! let mut wav = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
//! wav.resize(44, 0);
//!
//! let source = Source::create(&backend, Some("clip.wav"), &wav).unwrap();
//! assert_eq!(source.caps().media_type(), Some("audio/x-wav"));
//! source.destroy(&backend);
//! assert_eq!(backend.live_objects(), 0);
//! ```

mod graph;
mod recognizer;
mod registry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::trace;

pub use graph::{MemoryContainer, MemoryElement, MemoryPad};
pub use recognizer::{MagicRecognizer, Recognizer, default_recognizers};
pub use registry::{ElementBehaviour, FactoryInfo, default_factories};

use crate::backend::{Backend, GraphState, StateChange};
use crate::caps::ContentType;
use crate::config::TaskPoolConfig;
use crate::locator::{FactoryKind, Rank};
use crate::pad::{PadDirection, PadTemplate};
use crate::probe::Probability;
use crate::task_pool::{Spawner, TaskPool};
use crate::{Error, Result};

/// In-process implementation of [`Backend`].
pub struct MemoryBackend {
    initialized: AtomicBool,
    recognizers: Vec<Box<dyn Recognizer>>,
    factories: Vec<Arc<FactoryInfo>>,
    pool: TaskPool,
    live: Arc<AtomicUsize>,
    element_count: AtomicUsize,
    fail_pads: bool,
    fail_containers: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// An initialized backend with the default recognizers and factories.
    pub fn new() -> Self {
        Self::builder()
            .recognizers(default_recognizers())
            .factories(default_factories())
            .build()
    }

    /// An initialized backend with nothing registered.
    pub fn builder() -> MemoryBackendBuilder {
        MemoryBackendBuilder::default()
    }

    /// Marks the framework as initialized for this process.
    pub fn init(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Number of pads, elements and containers still referenced.
    pub fn live_objects(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Pool running asynchronous prerolls.
    pub fn task_pool(&self) -> &TaskPool {
        &self.pool
    }
}

/// Builder for [`MemoryBackend`].
pub struct MemoryBackendBuilder {
    initialized: bool,
    recognizers: Vec<Box<dyn Recognizer>>,
    factories: Vec<FactoryInfo>,
    pool_config: TaskPoolConfig,
    spawner: Option<Arc<dyn Spawner>>,
    fail_pads: bool,
    fail_containers: bool,
}

impl Default for MemoryBackendBuilder {
    fn default() -> Self {
        MemoryBackendBuilder {
            initialized: true,
            recognizers: Vec::new(),
            factories: Vec::new(),
            pool_config: TaskPoolConfig::default(),
            spawner: None,
            fail_pads: false,
            fail_containers: false,
        }
    }
}

impl MemoryBackendBuilder {
    pub fn recognizer(mut self, recognizer: impl Recognizer + 'static) -> Self {
        self.recognizers.push(Box::new(recognizer));
        self
    }

    pub fn recognizers(mut self, recognizers: Vec<Box<dyn Recognizer>>) -> Self {
        self.recognizers.extend(recognizers);
        self
    }

    pub fn factory(mut self, factory: FactoryInfo) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn factories(mut self, factories: Vec<FactoryInfo>) -> Self {
        self.factories.extend(factories);
        self
    }

    /// The backend reports the framework as not initialized until
    /// [`MemoryBackend::init`] is called.
    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }

    pub fn task_pool(mut self, config: TaskPoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    pub fn spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Pad creation always fails.
    pub fn failing_pads(mut self) -> Self {
        self.fail_pads = true;
        self
    }

    /// Container creation always fails.
    pub fn failing_containers(mut self) -> Self {
        self.fail_containers = true;
        self
    }

    pub fn build(self) -> MemoryBackend {
        let pool = match self.spawner {
            Some(spawner) => TaskPool::with_spawner(self.pool_config, spawner),
            None => TaskPool::new(self.pool_config),
        };
        MemoryBackend {
            initialized: AtomicBool::new(self.initialized),
            recognizers: self.recognizers,
            factories: self.factories.into_iter().map(Arc::new).collect(),
            pool,
            live: Arc::new(AtomicUsize::new(0)),
            element_count: AtomicUsize::new(0),
            fail_pads: self.fail_pads,
            fail_containers: self.fail_containers,
        }
    }
}

impl Backend for MemoryBackend {
    type Caps = ContentType;
    type Factory = Arc<FactoryInfo>;
    type Element = MemoryElement;
    type Pad = MemoryPad;
    type Container = MemoryContainer;

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn type_find(&self, data: &[u8], extension: Option<&str>) -> Option<(ContentType, Probability)> {
        let mut best: Option<(ContentType, Probability)> = None;
        for recognizer in &self.recognizers {
            if let Some((caps, probability)) = recognizer.recognize(data, extension) {
                trace!(recognizer = recognizer.name(), %caps, %probability, "Recognizer matched");
                if best.as_ref().is_none_or(|(_, p)| probability > *p) {
                    best = Some((caps, probability));
                }
            }
        }
        best
    }

    fn any_caps(&self) -> ContentType {
        ContentType::any()
    }

    fn new_pad(&self, template: &PadTemplate<ContentType>) -> Option<MemoryPad> {
        if self.fail_pads || template.caps.is_empty() {
            return None;
        }
        Some(MemoryPad::new(
            template.name,
            template.direction,
            template.caps.clone(),
            &self.live,
        ))
    }

    fn set_pad_active(&self, pad: &MemoryPad, active: bool) -> Result<()> {
        pad.set_active(active);
        Ok(())
    }

    fn pad_name(&self, pad: &MemoryPad) -> String {
        pad.name().to_owned()
    }

    fn factories(&self, kind: FactoryKind, min_rank: Rank) -> Vec<Arc<FactoryInfo>> {
        self.factories
            .iter()
            .filter(|f| f.rank >= min_rank && f.is_kind(kind))
            .cloned()
            .collect()
    }

    fn factory_name(&self, factory: &Arc<FactoryInfo>) -> String {
        factory.name.clone()
    }

    fn factory_rank(&self, factory: &Arc<FactoryInfo>) -> Rank {
        factory.rank
    }

    fn factory_accepts(
        &self,
        factory: &Arc<FactoryInfo>,
        caps: &ContentType,
        direction: PadDirection,
    ) -> bool {
        factory.accepts(caps, direction)
    }

    fn create_element(&self, factory: &Arc<FactoryInfo>) -> Option<MemoryElement> {
        if factory.behaviour.fail_create {
            return None;
        }
        let index = self.element_count.fetch_add(1, Ordering::Relaxed);
        Some(MemoryElement::new(
            format!("{}{index}", factory.name),
            factory,
            &self.live,
        ))
    }

    fn element_name(&self, element: &MemoryElement) -> String {
        element.name().to_owned()
    }

    fn new_container(&self, name: &str) -> Option<MemoryContainer> {
        (!self.fail_containers).then(|| MemoryContainer::new(name, &self.live))
    }

    fn add_element(&self, container: &MemoryContainer, element: &MemoryElement) -> Result<()> {
        container.add(element)
    }

    fn link_elements(&self, upstream: &MemoryElement, downstream: &MemoryElement) -> Result<()> {
        upstream.link(downstream)
    }

    fn link_pad(&self, pad: &MemoryPad, element: &MemoryElement) -> Result<()> {
        pad.link(element)
    }

    fn set_state(&self, container: &MemoryContainer, state: GraphState) -> Result<StateChange> {
        if state == GraphState::VoidPending {
            return Err(Error::StateChange("cannot target VOID_PENDING".to_owned()));
        }
        container.set_state(state, &self.pool)
    }

    fn current_state(&self, container: &MemoryContainer) -> GraphState {
        container.current_state()
    }

    fn wait_state(&self, container: &MemoryContainer, timeout: Option<Duration>) -> Result<GraphState> {
        container.wait_state(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_probability_wins() {
        let backend = MemoryBackend::builder()
            .recognizer(
                MagicRecognizer::new("weak", ContentType::new_simple("application/x-weak"), b"AB")
                    .with_probability(Probability::Possible),
            )
            .recognizer(MagicRecognizer::new(
                "strong",
                ContentType::new_simple("application/x-strong"),
                b"ABC",
            ))
            .build();
        let (caps, probability) = backend.type_find(b"ABCD", None).unwrap();
        assert_eq!(caps.media_type(), Some("application/x-strong"));
        assert_eq!(probability, Probability::Likely);
    }

    #[test]
    fn first_registered_wins_ties() {
        let backend = MemoryBackend::builder()
            .recognizer(MagicRecognizer::new("one", ContentType::new_simple("a/one"), b"X"))
            .recognizer(MagicRecognizer::new("two", ContentType::new_simple("a/two"), b"X"))
            .build();
        let (caps, _) = backend.type_find(b"XYZ", None).unwrap();
        assert_eq!(caps.media_type(), Some("a/one"));
    }

    #[test]
    fn objects_are_counted_until_dropped() {
        let backend = MemoryBackend::new();
        let container = backend.new_container("bin").unwrap();
        let pad = backend
            .new_pad(&PadTemplate::new(PadDirection::Src, ContentType::any()))
            .unwrap();
        let extra = container.clone();
        assert_eq!(backend.live_objects(), 2);
        drop(container);
        assert_eq!(backend.live_objects(), 2);
        drop(extra);
        drop(pad);
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn element_cannot_join_two_containers() {
        let backend = MemoryBackend::new();
        let factory = backend.factories(FactoryKind::Demuxer, Rank::NONE)[0].clone();
        let element = backend.create_element(&factory).unwrap();
        let first = backend.new_container("first").unwrap();
        let second = backend.new_container("second").unwrap();
        backend.add_element(&first, &element).unwrap();
        assert!(matches!(
            backend.add_element(&second, &element),
            Err(Error::LinkFailed(_))
        ));
        assert_eq!(element.parent().as_deref(), Some("first"));
    }

    #[test]
    fn async_preroll_is_awaited() {
        let backend = MemoryBackend::builder()
            .factory(
                FactoryInfo::new(
                    "slowdemux",
                    Rank::PRIMARY,
                    crate::locator::ElementClass::Demuxer,
                    ContentType::any(),
                    ContentType::any(),
                )
                .with_preroll_delay(Duration::from_millis(20)),
            )
            .build();
        let factory = backend.factories(FactoryKind::Decodable, Rank::NONE)[0].clone();
        let element = backend.create_element(&factory).unwrap();
        let container = backend.new_container("bin").unwrap();
        backend.add_element(&container, &element).unwrap();

        let change = backend.set_state(&container, GraphState::Paused).unwrap();
        assert_eq!(change, StateChange::Async);
        assert_eq!(backend.wait_state(&container, None).unwrap(), GraphState::Paused);
        assert_eq!(backend.task_pool().outstanding(), 1);

        backend.set_state(&container, GraphState::Null).unwrap();
        assert_eq!(backend.task_pool().outstanding(), 0);
        assert_eq!(backend.current_state(&container), GraphState::Null);
    }
}
