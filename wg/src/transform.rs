// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Transform records.
//!
//! A transform currently carries no state of its own; only its lifecycle is
//! defined. Creation requires the media framework to be initialized.

use tracing::{error, info};

use crate::backend::Backend;
use crate::{Error, Result};

/// Processing-state record for a transform.
#[derive(Debug, Default)]
pub struct Transform {
    _private: (),
}

impl Transform {
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] when the framework behind `backend` has
    /// not been initialized.
    pub fn create<B: Backend>(backend: &B) -> Result<Self> {
        if !backend.is_initialized() {
            error!("Media framework is not initialized");
            return Err(Error::Unavailable);
        }
        info!("Created transform");
        Ok(Transform::default())
    }

    pub fn destroy(self) {
        info!("Destroyed transform");
    }
}
