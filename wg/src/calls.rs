// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Parameter-block call surface.
//!
//! An external driver translates its own requests into the parameter blocks
//! below and hands them to a [`Dispatcher`]. Each call fills in its output
//! fields and returns a [`Status`]; no structured error crosses this
//! boundary. The typed methods (`create_source`, ...) expose the same
//! operations with full [`Error`] values.
//!
//! Sources and transforms live in generation-checked arenas. Destroying a
//! handle twice is reported as a failure instead of touching freed memory.

use std::sync::{Mutex, MutexGuard};

use tracing::{error, info, warn};

use crate::backend::{Backend, GraphState};
use crate::config::Config;
use crate::handle::{Handle, HandleTable};
use crate::source::Source;
use crate::transform::Transform;
use crate::{Error, Result, Status};

/// Input and output of [`Dispatcher::source_create`].
#[derive(Debug)]
pub struct SourceCreateParams<'a> {
    /// Origin of the data, used as a format hint.
    pub url: Option<&'a str>,
    pub data: &'a [u8],
    /// Set on success.
    pub source: Handle,
}

impl<'a> SourceCreateParams<'a> {
    pub fn new(url: Option<&'a str>, data: &'a [u8]) -> Self {
        SourceCreateParams {
            url,
            data,
            source: Handle::NULL,
        }
    }
}

/// Input of [`Dispatcher::source_destroy`].
#[derive(Debug, Clone, Copy)]
pub struct SourceDestroyParams {
    pub source: Handle,
}

/// Input and output of [`Dispatcher::source_get_state`].
#[derive(Debug, Clone, Copy)]
pub struct SourceGetStateParams {
    pub source: Handle,
    /// Set on success.
    pub state: GraphState,
}

impl SourceGetStateParams {
    pub fn new(source: Handle) -> Self {
        SourceGetStateParams {
            source,
            state: GraphState::VoidPending,
        }
    }
}

/// Output of [`Dispatcher::transform_create`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformCreateParams {
    /// Set on success.
    pub transform: Handle,
}

/// Input of [`Dispatcher::transform_destroy`].
#[derive(Debug, Clone, Copy)]
pub struct TransformDestroyParams {
    pub transform: Handle,
}

/// Owns the backend and every live source and transform.
pub struct Dispatcher<B: Backend> {
    backend: B,
    config: Config,
    sources: Mutex<HandleTable<Source<B>>>,
    transforms: Mutex<HandleTable<Transform>>,
}

fn lock<'a, T>(mutex: &'a Mutex<HandleTable<T>>, what: &str) -> Result<MutexGuard<'a, HandleTable<T>>> {
    mutex.lock().map_err(|e| {
        error!("Failed to lock {what} table: {e}");
        Error::ResourceExhausted(format!("{what} table poisoned"))
    })
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, Config::default())
    }

    pub fn with_config(backend: B, config: Config) -> Self {
        Dispatcher {
            backend,
            config,
            sources: Mutex::new(HandleTable::new()),
            transforms: Mutex::new(HandleTable::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds a source and stores it. The table lock is not held while the
    /// graph prerolls.
    pub fn create_source(&self, url: Option<&str>, data: &[u8]) -> Result<Handle> {
        let source = Source::create_with_config(&self.backend, &self.config, url, data)?;
        let handle = lock(&self.sources, "source")?.insert(source);
        info!(%handle, "Created source handle");
        Ok(handle)
    }

    pub fn destroy_source(&self, handle: Handle) -> Result<()> {
        let source = lock(&self.sources, "source")?.remove(handle).ok_or_else(|| {
            warn!(%handle, "Destroying unknown source");
            Error::InvalidHandle(handle)
        })?;
        source.destroy(&self.backend);
        Ok(())
    }

    pub fn source_state(&self, handle: Handle) -> Result<GraphState> {
        let sources = lock(&self.sources, "source")?;
        let source = sources.get(handle).ok_or(Error::InvalidHandle(handle))?;
        Ok(source.state(&self.backend))
    }

    /// Content type detected for the source, in textual form.
    pub fn source_caps(&self, handle: Handle) -> Result<String> {
        let sources = lock(&self.sources, "source")?;
        let source = sources.get(handle).ok_or(Error::InvalidHandle(handle))?;
        Ok(source.caps().to_string())
    }

    pub fn create_transform(&self) -> Result<Handle> {
        let transform = Transform::create(&self.backend)?;
        Ok(lock(&self.transforms, "transform")?.insert(transform))
    }

    pub fn destroy_transform(&self, handle: Handle) -> Result<()> {
        let transform = lock(&self.transforms, "transform")?
            .remove(handle)
            .ok_or_else(|| {
                warn!(%handle, "Destroying unknown transform");
                Error::InvalidHandle(handle)
            })?;
        transform.destroy();
        Ok(())
    }

    /// Destroys every live source and transform. Their handles become
    /// invalid.
    pub fn destroy_all(&self) {
        let sources = match lock(&self.sources, "source") {
            Ok(mut sources) => sources.drain(),
            Err(_) => Vec::new(),
        };
        for source in sources {
            source.destroy(&self.backend);
        }
        if let Ok(mut transforms) = lock(&self.transforms, "transform") {
            for transform in transforms.drain() {
                transform.destroy();
            }
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn transform_count(&self) -> usize {
        self.transforms.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn source_create(&self, params: &mut SourceCreateParams<'_>) -> Status {
        let result = self.create_source(params.url, params.data);
        if let Ok(handle) = &result {
            params.source = *handle;
        }
        Status::from_result(&result)
    }

    pub fn source_destroy(&self, params: &SourceDestroyParams) -> Status {
        Status::from_result(&self.destroy_source(params.source))
    }

    pub fn source_get_state(&self, params: &mut SourceGetStateParams) -> Status {
        let result = self.source_state(params.source);
        if let Ok(state) = &result {
            params.state = *state;
        }
        Status::from_result(&result)
    }

    pub fn transform_create(&self, params: &mut TransformCreateParams) -> Status {
        let result = self.create_transform();
        if let Ok(handle) = &result {
            params.transform = *handle;
        }
        Status::from_result(&result)
    }

    pub fn transform_destroy(&self, params: &TransformDestroyParams) -> Status {
        Status::from_result(&self.destroy_transform(params.transform))
    }
}

impl<B: Backend> Drop for Dispatcher<B> {
    fn drop(&mut self) {
        let sources = self.source_count();
        let transforms = self.transform_count();
        if sources + transforms > 0 {
            warn!(sources, transforms, "Dispatcher dropped with live records");
            self.destroy_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn dropping_dispatcher_destroys_lone_transforms() {
        let dispatcher = Dispatcher::new(MemoryBackend::new());
        dispatcher.create_transform().unwrap();
        dispatcher.create_transform().unwrap();
        drop(dispatcher);

        assert!(logs_contain("Dispatcher dropped with live records"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("Destroyed transform")).count() {
                2 => Ok(()),
                n => Err(format!("expected 2 destroyed transforms, saw {n}")),
            }
        });
    }

    #[test]
    #[traced_test]
    fn dropping_empty_dispatcher_is_quiet() {
        let dispatcher = Dispatcher::new(MemoryBackend::new());
        let handle = dispatcher.create_transform().unwrap();
        dispatcher.destroy_transform(handle).unwrap();
        drop(dispatcher);

        assert!(!logs_contain("Dispatcher dropped with live records"));
    }
}
