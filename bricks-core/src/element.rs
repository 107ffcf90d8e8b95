//! Page elements - the nodes of the element graph.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::settings::{deserialize_settings, Settings};

/// Number of hex characters in a generated element ID.
pub const ELEMENT_ID_LEN: usize = 6;

/// Unique identifier for an element within one element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Generate a fresh six-character hex ID not present in `used`.
    ///
    /// The new ID is recorded in `used` before it is returned.
    pub fn generate(used: &mut HashSet<String>) -> Self {
        loop {
            let entropy = Uuid::new_v4().simple().to_string();
            let candidate = &entropy[..ELEMENT_ID_LEN];
            if used.insert(candidate.to_string()) {
                return Self(candidate.to_string());
            }
        }
    }

    /// Wrap an existing ID string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID is empty (stored data sometimes omits it).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The parent slot of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Parent {
    /// Top-level element. Serialized as `0`.
    #[default]
    Root,
    /// Child of another element.
    Element(ElementId),
}

impl Parent {
    /// Whether this is the root sentinel.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The parent element ID, if any.
    #[must_use]
    pub fn id(&self) -> Option<&ElementId> {
        match self {
            Self::Root => None,
            Self::Element(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Parent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str("0"),
            Self::Element(id) => write!(f, "{id}"),
        }
    }
}

impl From<ElementId> for Parent {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl Serialize for Parent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Root => serializer.serialize_u8(0),
            Self::Element(id) => serializer.serialize_str(id.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for Parent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawParent {
            Number(serde_json::Number),
            Text(String),
            Missing(()),
        }

        Ok(match RawParent::deserialize(deserializer)? {
            RawParent::Number(n) if n.as_f64().is_some_and(|v| v.abs() < f64::EPSILON) => {
                Self::Root
            }
            // Stored pages occasionally carry numeric parent IDs.
            RawParent::Number(n) => Self::Element(ElementId(n.to_string())),
            RawParent::Text(s) if s.is_empty() || s == "0" => Self::Root,
            RawParent::Text(s) => Self::Element(ElementId(s)),
            RawParent::Missing(()) => Self::Root,
        })
    }
}

/// The element type, serialized as the builder's element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    /// Root-level layout section.
    Section,
    /// Generic container (`div`, `aside`, `nav`).
    Div,
    /// Heading, `h1`..`h6`.
    Heading,
    /// Paragraph-level text.
    TextBasic,
    /// Inline link.
    TextLink,
    /// Button.
    Button,
    /// Image.
    Image,
    /// Video.
    Video,
    /// Ordered or unordered list.
    List,
    /// Form.
    Form,
    /// Code block.
    Code,
    /// Any other builder element name.
    Other(String),
}

impl ElementKind {
    /// The builder element name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Section => "section",
            Self::Div => "div",
            Self::Heading => "heading",
            Self::TextBasic => "text-basic",
            Self::TextLink => "text-link",
            Self::Button => "button",
            Self::Image => "image",
            Self::Video => "video",
            Self::List => "list",
            Self::Form => "form",
            Self::Code => "code",
            Self::Other(name) => name,
        }
    }

    /// Parse a builder element name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "section" => Self::Section,
            "div" => Self::Div,
            "heading" => Self::Heading,
            "text-basic" => Self::TextBasic,
            "text-link" => Self::TextLink,
            "button" => Self::Button,
            "image" => Self::Image,
            "video" => Self::Video,
            "list" => Self::List,
            "form" => Self::Form,
            "code" => Self::Code,
            other => Self::Other(other.to_string()),
        }
    }

    /// Map an HTML tag (case-insensitive) to an element kind.
    ///
    /// Returns `None` for tags that are unwrapped during conversion.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "section" | "header" | "footer" | "main" | "article" => Self::Section,
            "div" | "aside" | "nav" => Self::Div,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Heading,
            "p" | "span" | "blockquote" => Self::TextBasic,
            "a" => Self::TextLink,
            "button" => Self::Button,
            "img" => Self::Image,
            "video" => Self::Video,
            "ul" | "ol" => Self::List,
            "form" => Self::Form,
            "code" | "pre" => Self::Code,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether elements of this kind carry visible text in `settings.text`.
    #[must_use]
    pub fn is_text_bearing(&self) -> bool {
        matches!(
            self,
            Self::Heading | Self::TextBasic | Self::TextLink | Self::Button
        )
    }
}

impl Default for ElementKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ElementKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A page element: one node of the element graph.
///
/// `children` is derived data. For well-formed lists it is exactly the
/// ordered set of elements whose `parent` is this element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    #[serde(default)]
    pub id: ElementId,
    /// Element type.
    #[serde(default, rename = "name")]
    pub kind: ElementKind,
    /// Containing element, or root.
    #[serde(default)]
    pub parent: Parent,
    /// Ordered child IDs.
    #[serde(default)]
    pub children: Vec<ElementId>,
    /// Open settings bag.
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub settings: Settings,
    /// Optional human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Top-level fields not modeled above (`themeStyles`, `cid`, ...),
    /// passed through unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Element {
    /// Create a new element with empty children and settings.
    #[must_use]
    pub fn new(id: ElementId, kind: ElementKind, parent: Parent) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            settings: Settings::new(),
            label: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the settings bag.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the child IDs.
    #[must_use]
    pub fn with_children(mut self, children: Vec<ElementId>) -> Self {
        self.children = children;
        self
    }
}

/// Rebuild every element's `children` from the `parent` references.
///
/// Children appear in list order. Elements without children get an empty list.
pub fn rebuild_children(elements: &mut [Element]) {
    let mut index: std::collections::HashMap<ElementId, Vec<ElementId>> =
        std::collections::HashMap::new();
    for element in elements.iter() {
        if let Some(parent) = element.parent.id() {
            index
                .entry(parent.clone())
                .or_default()
                .push(element.id.clone());
        }
    }
    for element in elements.iter_mut() {
        element.children = index.remove(&element.id).unwrap_or_default();
    }
}
