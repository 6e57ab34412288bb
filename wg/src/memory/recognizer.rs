// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Magic-byte format recognizers.

use crate::caps::ContentType;
use crate::probe::Probability;

/// A format recognizer consulted by [`super::MemoryBackend::type_find`].
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the detected content type and how sure the recognizer is, or
    /// `None` if the buffer does not look like its format at all.
    fn recognize(&self, data: &[u8], extension: Option<&str>) -> Option<(ContentType, Probability)>;
}

/// Recognizes a format by fixed byte patterns at fixed offsets.
///
/// All patterns must match. A matching file extension raises the reported
/// probability by one tier.
#[derive(Debug, Clone)]
pub struct MagicRecognizer {
    name: String,
    caps: ContentType,
    patterns: Vec<(usize, Vec<u8>)>,
    extensions: Vec<String>,
    probability: Probability,
}

impl MagicRecognizer {
    /// Recognizer matching `magic` at offset 0 with [`Probability::Likely`].
    pub fn new(name: impl Into<String>, caps: ContentType, magic: &[u8]) -> Self {
        MagicRecognizer {
            name: name.into(),
            caps,
            patterns: vec![(0, magic.to_vec())],
            extensions: Vec::new(),
            probability: Probability::Likely,
        }
    }

    /// Additionally requires `magic` at `offset`.
    pub fn and_magic(mut self, offset: usize, magic: &[u8]) -> Self {
        self.patterns.push((offset, magic.to_vec()));
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();
        self
    }

    pub fn with_probability(mut self, probability: Probability) -> Self {
        self.probability = probability;
        self
    }

    fn matches(&self, data: &[u8]) -> bool {
        self.patterns.iter().all(|(offset, magic)| {
            data.get(*offset..offset + magic.len())
                .is_some_and(|window| window == magic.as_slice())
        })
    }
}

fn raised(probability: Probability) -> Probability {
    match probability {
        Probability::None => Probability::None,
        Probability::Minimum => Probability::Possible,
        Probability::Possible => Probability::Likely,
        Probability::Likely => Probability::NearlyCertain,
        Probability::NearlyCertain | Probability::Maximum => Probability::Maximum,
    }
}

impl Recognizer for MagicRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, data: &[u8], extension: Option<&str>) -> Option<(ContentType, Probability)> {
        if !self.matches(data) {
            return None;
        }
        let hinted = extension.is_some_and(|ext| {
            self.extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        });
        let probability = if hinted {
            raised(self.probability)
        } else {
            self.probability
        };
        Some((self.caps.clone(), probability))
    }
}

/// The recognizers installed by [`super::MemoryBackend::new`].
pub fn default_recognizers() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(
            MagicRecognizer::new("wav", ContentType::new_simple("audio/x-wav"), b"RIFF")
                .and_magic(8, b"WAVE")
                .with_extensions(&["wav"]),
        ),
        Box::new(
            MagicRecognizer::new("avi", ContentType::new_simple("video/x-msvideo"), b"RIFF")
                .and_magic(8, b"AVI ")
                .with_extensions(&["avi"]),
        ),
        Box::new(
            MagicRecognizer::new("ogg", ContentType::new_simple("application/ogg"), b"OggS")
                .with_extensions(&["ogg", "oga", "ogv"]),
        ),
        Box::new(
            MagicRecognizer::new(
                "matroska",
                ContentType::new_simple("video/x-matroska"),
                &[0x1a, 0x45, 0xdf, 0xa3],
            )
            .with_extensions(&["mkv", "mka", "webm"]),
        ),
        Box::new(
            MagicRecognizer::new("quicktime", ContentType::new_simple("video/quicktime"), b"")
                .and_magic(4, b"ftyp")
                .with_extensions(&["mp4", "m4a", "mov"]),
        ),
        Box::new(
            MagicRecognizer::new(
                "asf",
                ContentType::new_simple("video/x-ms-asf"),
                &[0x30, 0x26, 0xb2, 0x75, 0x8e, 0x66, 0xcf, 0x11],
            )
            .with_extensions(&["asf", "wma", "wmv"]),
        ),
        Box::new(
            MagicRecognizer::new("flac", ContentType::new_simple("audio/x-flac"), b"fLaC")
                .with_extensions(&["flac"]),
        ),
        // ID3 tags prefix many formats, so the guess stays low.
        Box::new(
            MagicRecognizer::new("id3", ContentType::new_simple("application/x-id3"), b"ID3")
                .with_extensions(&["mp3"])
                .with_probability(Probability::Possible),
        ),
        Box::new(
            MagicRecognizer::new(
                "adts",
                ContentType::builder("audio/mpeg")
                    .field("mpegversion", 4)
                    .field("stream-format", "adts")
                    .build(),
                &[0xff, 0xf1],
            )
            .with_extensions(&["aac"])
            .with_probability(Probability::Minimum),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_header() -> Vec<u8> {
        let mut data = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        data.resize(44, 0);
        data
    }

    #[test]
    fn all_patterns_must_match() {
        let wav = MagicRecognizer::new("wav", ContentType::new_simple("audio/x-wav"), b"RIFF")
            .and_magic(8, b"WAVE");
        assert!(wav.recognize(&wav_header(), None).is_some());
        assert!(wav.recognize(b"RIFF\0\0\0\0AVI LIST", None).is_none());
        assert!(wav.recognize(b"RIFF", None).is_none());
    }

    #[test]
    fn extension_hint_raises_probability() {
        let wav = MagicRecognizer::new("wav", ContentType::new_simple("audio/x-wav"), b"RIFF")
            .and_magic(8, b"WAVE")
            .with_extensions(&["wav"]);
        let (_, plain) = wav.recognize(&wav_header(), None).unwrap();
        let (_, hinted) = wav.recognize(&wav_header(), Some("WAV")).unwrap();
        let (_, other) = wav.recognize(&wav_header(), Some("mp3")).unwrap();
        assert_eq!(plain, Probability::Likely);
        assert_eq!(hinted, Probability::NearlyCertain);
        assert_eq!(other, Probability::Likely);
    }

    #[test]
    fn extension_alone_is_not_a_match() {
        let flac = MagicRecognizer::new("flac", ContentType::new_simple("audio/x-flac"), b"fLaC")
            .with_extensions(&["flac"]);
        assert!(flac.recognize(b"not flac at all", Some("flac")).is_none());
    }
}
