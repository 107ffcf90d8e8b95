//! Serialized document shapes for element lists on disk and on the wire.

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Errors that can occur while decoding an element document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The JSON was malformed or did not match an element list.
    #[error("Invalid element document: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Page payload written by conversion and accepted by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    /// Flat element list.
    pub elements: Vec<Element>,
    /// Number of elements.
    #[serde(default)]
    pub count: usize,
}

impl PageDocument {
    /// Wrap an element list.
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            count: elements.len(),
            elements,
        }
    }
}

impl From<Vec<Element>> for PageDocument {
    fn from(elements: Vec<Element>) -> Self {
        Self::new(elements)
    }
}

/// Either a bare element array or an object with an `elements` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ElementsFile {
    /// `[ {...}, ... ]`
    Bare(Vec<Element>),
    /// `{ "elements": [ ... ], ... }`
    Wrapped {
        /// The element list.
        elements: Vec<Element>,
    },
}

impl ElementsFile {
    /// Parse an element document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Invalid`] if the text is neither shape.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Take the element list.
    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        match self {
            Self::Bare(elements) | Self::Wrapped { elements } => elements,
        }
    }
}
