// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Capability prober: guesses the content type of a byte buffer.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::backend::Backend;
use crate::{Error, Result};

/// Confidence of a format recognizer in its guess.
///
/// Values match the usual type-finding scale, so they can be compared and
/// converted to and from framework probabilities numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Probability {
    None = 0,
    Minimum = 1,
    Possible = 50,
    Likely = 80,
    NearlyCertain = 99,
    Maximum = 100,
}

impl Probability {
    /// Maps a raw percentage onto the highest tier it reaches.
    pub fn from_percent(value: u32) -> Self {
        match value {
            0 => Probability::None,
            1..=49 => Probability::Minimum,
            50..=79 => Probability::Possible,
            80..=98 => Probability::Likely,
            99 => Probability::NearlyCertain,
            _ => Probability::Maximum,
        }
    }

    pub fn as_percent(self) -> u32 {
        self as u32
    }

    /// Guesses above `Possible` are trusted; anything lower may well fail
    /// further down the pipeline.
    pub fn is_confident(self) -> bool {
        self > Probability::Possible
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_percent())
    }
}

/// Outcome of a successful probe.
#[derive(Debug, Clone)]
pub struct Probe<C> {
    pub caps: C,
    pub probability: Probability,
}

/// Returns the extension of `url` (text after the last `.`), if any.
pub fn extension_hint(url: Option<&str>) -> Option<&str> {
    url.and_then(|url| url.rsplit_once('.'))
        .map(|(_, extension)| extension)
}

/// Detects the content type of `data`, using the extension of `url` as a
/// hint for the recognizers.
///
/// # Errors
///
/// Returns [`Error::UnrecognizedInput`] when no recognizer matches or the
/// best match has probability [`Probability::None`].
pub fn detect_caps<B: Backend>(backend: &B, url: Option<&str>, data: &[u8]) -> Result<Probe<B::Caps>> {
    let extension = extension_hint(url);
    let url = url.unwrap_or("(null)");

    let Some((caps, probability)) = backend
        .type_find(data, extension)
        .filter(|(_, probability)| *probability > Probability::None)
    else {
        error!(url, size = data.len(), "Failed to detect caps");
        return Err(Error::UnrecognizedInput);
    };

    if probability.is_confident() {
        info!(url, size = data.len(), %caps, %probability, "Detected caps");
    } else {
        warn!(
            url,
            size = data.len(),
            %caps,
            %probability,
            "Detected caps with low probability"
        );
    }

    Ok(Probe { caps, probability })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use tracing_test::traced_test;

    #[test]
    fn extension_is_taken_after_last_dot() {
        assert_eq!(extension_hint(Some("C:\\media\\clip.v2.mkv")), Some("mkv"));
        assert_eq!(extension_hint(Some("stream")), None);
        assert_eq!(extension_hint(None), None);
        assert_eq!(extension_hint(Some("trailing.")), Some(""));
    }

    #[test]
    fn tiers_are_ordered_and_thresholded() {
        assert!(Probability::Maximum > Probability::NearlyCertain);
        assert!(Probability::Likely.is_confident());
        assert!(!Probability::Possible.is_confident());
        assert!(!Probability::Minimum.is_confident());
        assert_eq!(Probability::from_percent(80), Probability::Likely);
        assert_eq!(Probability::from_percent(65), Probability::Possible);
        assert_eq!(Probability::from_percent(250), Probability::Maximum);
    }

    #[traced_test]
    #[test]
    fn weak_detection_is_accepted_with_a_warning() {
        let backend = MemoryBackend::new();
        let probe = detect_caps(&backend, None, b"ID3\x04\x00\x00\x00\x00\x00\x00").unwrap();
        assert_eq!(probe.probability, Probability::Possible);
        assert!(logs_contain("Detected caps with low probability"));
    }

    #[traced_test]
    #[test]
    fn extension_hint_promotes_detection() {
        let backend = MemoryBackend::new();
        let probe = detect_caps(&backend, Some("/tmp/song.mp3"), b"ID3\x04\x00").unwrap();
        assert_eq!(probe.probability, Probability::Likely);
        assert!(logs_contain("Detected caps"));
        assert!(!logs_contain("low probability"));
    }

    #[traced_test]
    #[test]
    fn unknown_bytes_are_rejected() {
        let backend = MemoryBackend::new();
        let err = detect_caps(&backend, Some("noise.bin"), &[0u8; 32]).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedInput));
        assert!(logs_contain("Failed to detect caps"));
    }
}
