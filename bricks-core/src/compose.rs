//! Template composition: merge several element lists into one page.
//!
//! Every element gets a fresh ID drawn from one composition-wide used set, so
//! no ID repeats anywhere in the merged output. Parent and child references
//! are rewritten through a per-template remap table.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId, Parent};

/// Errors that can occur during composition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    /// The template list was empty.
    #[error("no templates to compose")]
    NoTemplates,
}

/// A global class record carried alongside a template.
///
/// Only `id` and `name` are interpreted; every other field passes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalClass {
    /// Global class ID.
    #[serde(default)]
    pub id: String,
    /// Class name, the deduplication key.
    #[serde(default)]
    pub name: String,
    /// Any other fields (settings, category, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A named, reusable element list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Category used for grouping.
    #[serde(default)]
    pub category: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Flat element list.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Global classes the elements reference.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_classes: Vec<GlobalClass>,
    /// File path the template was loaded from, or `learned`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Template {
    /// Create a template with the given name and elements.
    #[must_use]
    pub fn new(name: impl Into<String>, elements: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            elements,
            ..Self::default()
        }
    }
}

/// Output of [`compose_with_classes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeResult {
    /// Merged element list.
    pub elements: Vec<Element>,
    /// Global classes, deduplicated by name.
    pub global_classes: Vec<GlobalClass>,
}

/// Merge templates into one element list with collision-free IDs.
///
/// # Errors
///
/// Returns [`ComposeError::NoTemplates`] if `templates` is empty.
pub fn compose(templates: &[Template]) -> Result<Vec<Element>, ComposeError> {
    if templates.is_empty() {
        return Err(ComposeError::NoTemplates);
    }

    let mut used = HashSet::new();
    let total = templates.iter().map(|t| t.elements.len()).sum();
    let mut merged = Vec::with_capacity(total);

    for template in templates {
        let fresh: Vec<ElementId> = template
            .elements
            .iter()
            .map(|_| ElementId::generate(&mut used))
            .collect();

        // First occurrence wins when a template repeats an ID.
        let mut remap: HashMap<&ElementId, &ElementId> = HashMap::new();
        for (element, new_id) in template.elements.iter().zip(&fresh) {
            if !element.id.is_empty() {
                remap.entry(&element.id).or_insert(new_id);
            }
        }

        for (element, new_id) in template.elements.iter().zip(&fresh) {
            merged.push(remap_element(element, new_id.clone(), &remap));
        }
        tracing::debug!(
            "Composed template '{}' ({} elements)",
            template.name,
            template.elements.len()
        );
    }

    Ok(merged)
}

fn remap_element(
    element: &Element,
    new_id: ElementId,
    remap: &HashMap<&ElementId, &ElementId>,
) -> Element {
    let lookup = |id: &ElementId| remap.get(id).map_or_else(|| id.clone(), |&new| new.clone());

    let parent = match &element.parent {
        Parent::Root => Parent::Root,
        Parent::Element(id) => Parent::Element(lookup(id)),
    };

    Element {
        id: new_id,
        kind: element.kind.clone(),
        parent,
        children: element.children.iter().map(lookup).collect(),
        settings: element.settings.clone(),
        label: element.label.clone(),
        extra: element.extra.clone(),
    }
}

/// Merge templates and their global classes.
///
/// Classes are deduplicated by name; the first occurrence across templates
/// is kept.
///
/// # Errors
///
/// Returns [`ComposeError::NoTemplates`] if `templates` is empty.
pub fn compose_with_classes(templates: &[Template]) -> Result<ComposeResult, ComposeError> {
    let elements = compose(templates)?;

    let mut seen = HashSet::new();
    let global_classes = templates
        .iter()
        .flat_map(|t| &t.global_classes)
        .filter(|class| seen.insert(class.name.clone()))
        .cloned()
        .collect();

    Ok(ComposeResult {
        elements,
        global_classes,
    })
}
