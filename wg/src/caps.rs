// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Content-type descriptors.
//!
//! A [`ContentType`] describes a media format as a list of named structures
//! (`audio/x-raw, format=S16LE, channels=2`), or as one of the two special
//! sets ANY (matches everything) and EMPTY (matches nothing). Descriptors are
//! immutable and reference counted; cloning shares the same allocation.
//!
//! The textual form follows the familiar caps notation:
//!
//! ```
//! use wg::ContentType;
//!
//! let caps: ContentType = "audio/x-raw, format=S16LE; audio/x-wav".parse().unwrap();
//! assert_eq!(caps.structures().len(), 2);
//! assert!(caps.can_intersect(&ContentType::new_simple("audio/x-wav")));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::Error;

/// One named media structure with string-valued fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    name: String,
    fields: BTreeMap<String, String>,
}

impl Structure {
    pub fn new(name: impl Into<String>) -> Self {
        Structure {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Two structures intersect when their names match and every field
    /// present on both sides carries the same value.
    pub fn can_intersect(&self, other: &Structure) -> bool {
        self.name == other.name
            && self
                .fields
                .iter()
                .all(|(key, value)| other.fields.get(key).is_none_or(|v| v == value))
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.fields {
            write!(f, ", {key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Inner {
    Any,
    Structures(Vec<Structure>),
}

/// Immutable, reference-counted content-type descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentType(Arc<Inner>);

impl ContentType {
    /// The descriptor matching every format.
    pub fn any() -> Self {
        ContentType(Arc::new(Inner::Any))
    }

    /// The descriptor matching no format.
    pub fn empty() -> Self {
        ContentType(Arc::new(Inner::Structures(Vec::new())))
    }

    /// A descriptor with a single field-less structure.
    pub fn new_simple(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    pub fn builder(name: impl Into<String>) -> ContentTypeBuilder {
        ContentTypeBuilder {
            structures: Vec::new(),
            current: Structure::new(name),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(*self.0, Inner::Any)
    }

    pub fn is_empty(&self) -> bool {
        matches!(&*self.0, Inner::Structures(s) if s.is_empty())
    }

    pub fn structures(&self) -> &[Structure] {
        match &*self.0 {
            Inner::Any => &[],
            Inner::Structures(s) => s,
        }
    }

    /// Name of the first structure, e.g. `"audio/x-wav"`.
    pub fn media_type(&self) -> Option<&str> {
        self.structures().first().map(Structure::name)
    }

    /// Returns `true` if at least one format is described by both sides.
    pub fn can_intersect(&self, other: &ContentType) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.is_any() || other.is_any() {
            return true;
        }
        self.structures()
            .iter()
            .any(|a| other.structures().iter().any(|b| a.can_intersect(b)))
    }

    /// Number of live references to this descriptor.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Inner::Any => f.write_str("ANY"),
            Inner::Structures(s) if s.is_empty() => f.write_str("EMPTY"),
            Inner::Structures(s) => {
                for (i, structure) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{structure}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentType({self})")
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "ANY" => return Ok(ContentType::any()),
            "EMPTY" | "" => return Ok(ContentType::empty()),
            _ => {}
        }

        let mut structures = Vec::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let mut tokens = part.split(',').map(str::trim);
            let name = tokens
                .next()
                .filter(|n| !n.is_empty() && !n.contains('='))
                .ok_or_else(|| Error::Config(format!("Missing structure name in \"{part}\"")))?;
            let mut structure = Structure::new(name);
            for token in tokens {
                let (key, value) = token
                    .split_once('=')
                    .ok_or_else(|| Error::Config(format!("Malformed field \"{token}\"")))?;
                // Accept typed values such as `(string)S16LE`.
                let value = value
                    .trim()
                    .strip_prefix('(')
                    .and_then(|v| v.split_once(')').map(|(_, rest)| rest))
                    .unwrap_or(value.trim());
                structure
                    .fields
                    .insert(key.trim().to_owned(), value.to_owned());
            }
            structures.push(structure);
        }
        Ok(ContentType(Arc::new(Inner::Structures(structures))))
    }
}

/// Builder for multi-structure [`ContentType`]s.
pub struct ContentTypeBuilder {
    structures: Vec<Structure>,
    current: Structure,
}

impl ContentTypeBuilder {
    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.current.fields.insert(key.into(), value.to_string());
        self
    }

    /// Finishes the current structure and starts a new one named `name`.
    pub fn structure(mut self, name: impl Into<String>) -> Self {
        let done = std::mem::replace(&mut self.current, Structure::new(name));
        self.structures.push(done);
        self
    }

    pub fn build(mut self) -> ContentType {
        self.structures.push(self.current);
        ContentType(Arc::new(Inner::Structures(self.structures)))
    }
}
