//! Key parts and composite keys.
//!
//! A key part names a key-schema attribute and the string value it must hold.
//! The textual form is `attribute:value`; everything after the first colon is
//! the value.

use std::fmt;
use std::str::FromStr;

use crate::error::MalformedKey;

/// Separator between the attribute name and the value.
pub const KEY_SEPARATOR: char = ':';

/// One component of a key: an attribute name and its string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPart {
    attribute: String,
    value: String,
}

impl KeyPart {
    /// Creates a key part without any parsing.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Parses `attribute:value`.
    ///
    /// Fails when the separator is missing or the attribute name is empty.
    pub fn parse(input: &str) -> Result<Self, MalformedKey> {
        match input.split_once(KEY_SEPARATOR) {
            Some((attribute, value)) if !attribute.is_empty() => Ok(Self::new(attribute, value)),
            _ => Err(MalformedKey {
                input: input.to_string(),
            }),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for KeyPart {
    type Err = MalformedKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.attribute, self.value)
    }
}

/// A record identifier: a partition part and an optional sort part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    partition: KeyPart,
    sort: Option<KeyPart>,
}

impl CompositeKey {
    /// Creates a partition-only key.
    pub fn new(partition: KeyPart) -> Self {
        Self {
            partition,
            sort: None,
        }
    }

    /// Adds a sort component.
    pub fn with_sort(mut self, sort: KeyPart) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Parses a key from its textual parts. An empty `sort` means no sort component.
    pub fn parse(partition: &str, sort: &str) -> Result<Self, MalformedKey> {
        let key = Self::new(partition.parse()?);
        if sort.is_empty() {
            return Ok(key);
        }
        Ok(key.with_sort(sort.parse()?))
    }

    pub fn partition(&self) -> &KeyPart {
        &self.partition
    }

    pub fn sort(&self) -> Option<&KeyPart> {
        self.sort.as_ref()
    }

    /// `(attribute, value)` pairs of the physical key, partition first.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(&self.partition)
            .chain(self.sort.as_ref())
            .map(|part| (part.attribute(), part.value()))
    }
}
