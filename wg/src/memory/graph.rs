// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Pads, elements and containers of the in-memory backend.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace};

use super::registry::ElementBehaviour;
use crate::backend::{GraphState, StateChange};
use crate::caps::ContentType;
use crate::pad::PadDirection;
use crate::task_pool::{TaskHandle, TaskPool};
use crate::{Error, Result};

/// Counts one live backend object until dropped.
#[derive(Debug)]
pub(crate) struct LiveToken(Arc<AtomicUsize>);

impl LiveToken {
    pub(crate) fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        LiveToken(counter.clone())
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct PadInner {
    name: String,
    direction: PadDirection,
    caps: ContentType,
    active: AtomicBool,
    peer: Mutex<Option<String>>,
    _live: LiveToken,
}

/// Connection point; clones share the same pad.
#[derive(Clone)]
pub struct MemoryPad(Arc<PadInner>);

impl MemoryPad {
    pub(crate) fn new(
        name: &str,
        direction: PadDirection,
        caps: ContentType,
        live: &Arc<AtomicUsize>,
    ) -> Self {
        MemoryPad(Arc::new(PadInner {
            name: name.to_owned(),
            direction,
            caps,
            active: AtomicBool::new(false),
            peer: Mutex::new(None),
            _live: LiveToken::new(live),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn direction(&self) -> PadDirection {
        self.0.direction
    }

    pub fn caps(&self) -> &ContentType {
        &self.0.caps
    }

    pub fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.0.active.store(active, Ordering::SeqCst);
    }

    /// Name of the element this pad is linked to.
    pub fn peer(&self) -> Option<String> {
        self.0.peer.lock().ok().and_then(|peer| peer.clone())
    }

    pub(crate) fn link(&self, element: &MemoryElement) -> Result<()> {
        if self.0.direction != PadDirection::Src {
            return Err(Error::LinkFailed(format!("{} is not a source pad", self.0.name)));
        }
        if !self.0.caps.can_intersect(&element.0.sink_caps) {
            return Err(Error::LinkFailed(format!(
                "{} does not accept {}",
                element.0.name, self.0.caps
            )));
        }
        let mut peer = self
            .0
            .peer
            .lock()
            .map_err(|_| Error::LinkFailed("pad lock poisoned".to_owned()))?;
        if peer.is_some() {
            return Err(Error::LinkFailed(format!("{} is already linked", self.0.name)));
        }
        element.claim_sink()?;
        *peer = Some(element.0.name.clone());
        Ok(())
    }
}

impl fmt::Debug for MemoryPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPad")
            .field("name", &self.0.name)
            .field("direction", &self.0.direction)
            .field("caps", &self.0.caps)
            .finish()
    }
}

struct ElementInner {
    name: String,
    factory: String,
    sink_caps: ContentType,
    src_caps: ContentType,
    behaviour: ElementBehaviour,
    parent: Mutex<Option<String>>,
    sink_linked: AtomicBool,
    src_linked: AtomicBool,
    _live: LiveToken,
}

/// Processing element; clones share the same element.
#[derive(Clone)]
pub struct MemoryElement(Arc<ElementInner>);

impl MemoryElement {
    pub(crate) fn new(
        name: String,
        factory: &super::FactoryInfo,
        live: &Arc<AtomicUsize>,
    ) -> Self {
        MemoryElement(Arc::new(ElementInner {
            name,
            factory: factory.name.clone(),
            sink_caps: factory.sink_caps.clone(),
            src_caps: factory.src_caps.clone(),
            behaviour: factory.behaviour.clone(),
            parent: Mutex::new(None),
            sink_linked: AtomicBool::new(false),
            src_linked: AtomicBool::new(false),
            _live: LiveToken::new(live),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn factory_name(&self) -> &str {
        &self.0.factory
    }

    /// Name of the container holding this element.
    pub fn parent(&self) -> Option<String> {
        self.0.parent.lock().ok().and_then(|parent| parent.clone())
    }

    pub fn is_sink_linked(&self) -> bool {
        self.0.sink_linked.load(Ordering::SeqCst)
    }

    fn claim_sink(&self) -> Result<()> {
        if self.0.sink_linked.swap(true, Ordering::SeqCst) {
            return Err(Error::LinkFailed(format!("{} sink is already linked", self.0.name)));
        }
        Ok(())
    }

    pub(crate) fn link(&self, downstream: &MemoryElement) -> Result<()> {
        if !self.0.src_caps.can_intersect(&downstream.0.sink_caps) {
            return Err(Error::LinkFailed(format!(
                "{} cannot feed {}",
                self.0.name, downstream.0.name
            )));
        }
        if self.0.src_linked.swap(true, Ordering::SeqCst) {
            return Err(Error::LinkFailed(format!("{} src is already linked", self.0.name)));
        }
        downstream.claim_sink().inspect_err(|_| {
            self.0.src_linked.store(false, Ordering::SeqCst);
        })
    }
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryElement")
            .field("name", &self.0.name)
            .field("factory", &self.0.factory)
            .finish()
    }
}

struct ContainerState {
    current: GraphState,
    pending: GraphState,
    error: Option<String>,
    elements: Vec<MemoryElement>,
    prerolls: Vec<TaskHandle>,
}

struct ContainerInner {
    name: String,
    state: Mutex<ContainerState>,
    changed: Condvar,
    _live: LiveToken,
}

/// Container graph; clones share the same container.
#[derive(Clone)]
pub struct MemoryContainer(Arc<ContainerInner>);

impl MemoryContainer {
    pub(crate) fn new(name: &str, live: &Arc<AtomicUsize>) -> Self {
        MemoryContainer(Arc::new(ContainerInner {
            name: name.to_owned(),
            state: Mutex::new(ContainerState {
                current: GraphState::Null,
                pending: GraphState::VoidPending,
                error: None,
                elements: Vec::new(),
                prerolls: Vec::new(),
            }),
            changed: Condvar::new(),
            _live: LiveToken::new(live),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, ContainerState>> {
        self.0
            .state
            .lock()
            .map_err(|_| Error::StateChange(format!("{} state lock poisoned", self.0.name)))
    }

    /// Names of the contained elements, in insertion order.
    pub fn element_names(&self) -> Vec<String> {
        self.lock()
            .map(|state| state.elements.iter().map(|e| e.name().to_owned()).collect())
            .unwrap_or_default()
    }

    pub fn current_state(&self) -> GraphState {
        self.lock().map(|state| state.current).unwrap_or(GraphState::VoidPending)
    }

    pub(crate) fn add(&self, element: &MemoryElement) -> Result<()> {
        let mut parent = element
            .0
            .parent
            .lock()
            .map_err(|_| Error::LinkFailed("element lock poisoned".to_owned()))?;
        if let Some(existing) = parent.as_ref() {
            return Err(Error::LinkFailed(format!(
                "{} already belongs to {existing}",
                element.name()
            )));
        }

        let mut state = self.lock()?;
        // Syncing with the parent: a running container requires the new
        // element to reach its state too.
        if state.current >= GraphState::Paused && element.0.behaviour.fail_state_change {
            return Err(Error::LinkFailed(format!(
                "{} cannot reach {}",
                element.name(),
                state.current
            )));
        }
        state.elements.push(element.clone());
        *parent = Some(self.0.name.clone());
        Ok(())
    }

    pub(crate) fn set_state(&self, target: GraphState, pool: &TaskPool) -> Result<StateChange> {
        if target <= GraphState::Ready {
            return Ok(self.shut_down(target, pool));
        }

        let mut state = self.lock()?;
        if let Some(element) = state
            .elements
            .iter()
            .find(|e| e.0.behaviour.fail_state_change)
        {
            let message = format!("{} refused {target}", element.name());
            state.error = Some(message.clone());
            return Err(Error::StateChange(message));
        }

        let delay = state
            .elements
            .iter()
            .filter_map(|e| e.0.behaviour.preroll_delay)
            .max();
        let Some(delay) = delay else {
            state.current = target;
            state.pending = GraphState::VoidPending;
            state.error = None;
            self.0.changed.notify_all();
            return Ok(StateChange::Success);
        };

        state.pending = target;
        state.error = None;
        let container = self.clone();
        match pool.push(move || container.complete_preroll(target, delay)) {
            Ok(task) => state.prerolls.push(task),
            Err(err) => {
                state.pending = GraphState::VoidPending;
                return Err(err.into());
            }
        }
        debug!(container = %self.0.name, ?delay, "Prerolling asynchronously");
        Ok(StateChange::Async)
    }

    fn complete_preroll(&self, target: GraphState, delay: Duration) {
        std::thread::sleep(delay);
        let Ok(mut state) = self.lock() else {
            return;
        };
        // A shutdown in the meantime cancels the transition.
        if state.pending == target {
            state.current = target;
            state.pending = GraphState::VoidPending;
            trace!(container = %self.0.name, %target, "Preroll complete");
        }
        self.0.changed.notify_all();
    }

    fn shut_down(&self, target: GraphState, pool: &TaskPool) -> StateChange {
        let prerolls = match self.lock() {
            Ok(mut state) => {
                state.current = target;
                state.pending = GraphState::VoidPending;
                state.error = None;
                self.0.changed.notify_all();
                std::mem::take(&mut state.prerolls)
            }
            Err(_) => Vec::new(),
        };
        for task in prerolls {
            // Joined outside the lock: the task takes it to finish.
            pool.join(task);
        }
        StateChange::Success
    }

    pub(crate) fn wait_state(&self, timeout: Option<Duration>) -> Result<GraphState> {
        let state = self.lock()?;
        let state = match timeout {
            None => self
                .0
                .changed
                .wait_while(state, |s| s.pending != GraphState::VoidPending)
                .map_err(|_| Error::StateChange("state lock poisoned".to_owned()))?,
            Some(timeout) => {
                let (state, result) = self
                    .0
                    .changed
                    .wait_timeout_while(state, timeout, |s| s.pending != GraphState::VoidPending)
                    .map_err(|_| Error::StateChange("state lock poisoned".to_owned()))?;
                if result.timed_out() && state.pending != GraphState::VoidPending {
                    return Err(Error::Timeout);
                }
                state
            }
        };
        match &state.error {
            Some(message) => Err(Error::StateChange(message.clone())),
            None => Ok(state.current),
        }
    }
}

impl fmt::Debug for MemoryContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContainer")
            .field("name", &self.0.name)
            .field("state", &self.current_state())
            .finish()
    }
}
