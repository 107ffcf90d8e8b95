//! Hard validation of element lists before they are written to a page.
//!
//! Unlike [`crate::doctor`], validation is a gate: the result is invalid when
//! at least one blocking error is found. Everything else is a warning.
//!
//! Blocking: empty input, duplicate IDs, dangling parent references, missing
//! element names, undecodable file entries.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::element::{Element, ElementId, ElementKind};
use crate::settings::{self, SettingValue, Settings};

/// Every element name the builder ships.
pub const KNOWN_ELEMENT_TYPES: &[&str] = &[
    "section",
    "container",
    "block",
    "div",
    "heading",
    "text-basic",
    "rich-text",
    "text-link",
    "button",
    "icon",
    "image",
    "video",
    "nav-menu",
    "nav-nested",
    "offcanvas",
    "accordion",
    "accordion-nested",
    "tabs",
    "tabs-nested",
    "slider",
    "slider-nested",
    "carousel",
    "form",
    "map",
    "code",
    "template",
    "post-content",
    "posts",
    "pagination",
    "list",
    "social-icons",
    "alert",
    "progress-bar",
    "countdown",
    "counter",
    "pricing-tables",
    "team-members",
    "testimonials",
    "logo",
    "search",
    "sidebar",
    "wordpress",
    "shortcode",
];

/// Dynamic data tag prefixes the builder resolves.
pub const DYNAMIC_DATA_PREFIXES: &[&str] = &[
    "post_", "acf_", "woo_", "author_", "site_", "echo_", "wp_",
];

/// Matches `{post_title}`, `{acf_field:option}` and similar tags.
static DYNAMIC_DATA_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[a-zA-Z_][a-zA-Z0-9_:]*\}").expect("dynamic data tag pattern is valid")
});

/// Outcome of validating an element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// False when at least one blocking error was found.
    pub valid: bool,
    /// Blocking errors.
    pub errors: Vec<String>,
    /// Non-blocking warnings.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    fn error(&mut self, message: String) {
        self.valid = false;
        self.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Validate an element list.
#[must_use]
pub fn validate(elements: &[Element]) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_into(elements, &mut result);
    result
}

fn validate_into(elements: &[Element], result: &mut ValidationResult) {
    if elements.is_empty() {
        result.error("no elements provided".to_string());
        return;
    }

    let mut ids: HashSet<&ElementId> = HashSet::new();
    for element in elements.iter().filter(|e| !e.id.is_empty()) {
        if !ids.insert(&element.id) {
            result.error(format!("duplicate element ID: {}", element.id));
        }
    }

    for (index, element) in elements.iter().enumerate() {
        validate_element(element, &format!("elements[{index}]"), result);
    }

    for element in elements {
        if let Some(parent) = element.parent.id() {
            if !ids.contains(parent) {
                result.error(format!(
                    "element {} references non-existent parent {parent}",
                    element.id
                ));
            }
        }
    }

    for element in elements {
        for child in element.children.iter().filter(|c| !c.is_empty()) {
            if !ids.contains(child) {
                result.warn(format!(
                    "element {} lists non-existent child {child}",
                    element.id
                ));
            }
        }
    }

    for element in elements {
        if element.kind == ElementKind::Section && !element.parent.is_root() {
            result.warn(format!(
                "section element {} should be at root level, has parent",
                element.id
            ));
        }
    }
}

fn validate_element(element: &Element, path: &str, result: &mut ValidationResult) {
    let name = element.kind.name();
    if name.is_empty() {
        result.error(format!("{path}: missing or invalid 'name' field"));
        return;
    }
    if !KNOWN_ELEMENT_TYPES.contains(&name) {
        result.warn(format!("{path}: unknown element type '{name}'"));
    }
    if element.id.is_empty() {
        result.warn(format!("{path}: missing 'id' field"));
    }
    validate_settings(&element.settings, path, result);
}

fn validate_settings(settings: &Settings, path: &str, result: &mut ValidationResult) {
    if let Some(classes) = settings.get(settings::GLOBAL_CLASSES) {
        match classes.as_list() {
            None => result.warn(format!(
                "{path}: {} should be an array",
                settings::GLOBAL_CLASSES
            )),
            Some(items) => {
                if items.iter().any(|c| c.as_str().is_none()) {
                    result.warn(format!(
                        "{path}: {} contains non-string value",
                        settings::GLOBAL_CLASSES
                    ));
                }
            }
        }
    }

    if let Some(image) = settings.get(settings::IMAGE).and_then(SettingValue::as_map) {
        validate_media(image, &format!("{path}.image"), result);
    }

    if let Some(text) = settings.get(settings::TEXT).and_then(SettingValue::as_str) {
        validate_dynamic_data(text, &format!("{path}.text"), result);
    }
}

fn validate_media(media: &Settings, path: &str, result: &mut ValidationResult) {
    let has_id = media.contains_key("id");
    let url = media.get("url").and_then(SettingValue::as_str);

    match (has_id, url) {
        (false, None) => result.warn(format!("{path}: media missing both 'id' and 'url'")),
        (false, Some(url)) if !url.is_empty() && !url.starts_with('{') => result.warn(format!(
            "{path}: media uses bare URL without attachment ID (may break on migration)"
        )),
        _ => {}
    }
}

fn validate_dynamic_data(text: &str, path: &str, result: &mut ValidationResult) {
    for found in DYNAMIC_DATA_TAG.find_iter(text) {
        let tag = found.as_str();
        let inner = &tag[1..tag.len() - 1];
        if !DYNAMIC_DATA_PREFIXES
            .iter()
            .any(|prefix| inner.starts_with(prefix))
        {
            result.warn(format!("{path}: dynamic data tag '{tag}' has unknown prefix"));
        }
    }
}

/// Validate a parsed elements file.
///
/// Accepts either `{"elements": [...]}` or a bare array. Entries that are
/// not objects are skipped; objects that do not decode as elements are
/// blocking errors.
#[must_use]
pub fn validate_file(data: &serde_json::Value) -> ValidationResult {
    let raw = match data {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("elements") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return missing_elements(),
        },
        _ => return missing_elements(),
    };

    let mut result = ValidationResult::new();
    let mut elements = Vec::with_capacity(raw.len());
    for (index, item) in raw.iter().enumerate() {
        if !item.is_object() {
            continue;
        }
        match serde_json::from_value::<Element>(item.clone()) {
            Ok(element) => elements.push(element),
            Err(e) => result.error(format!("elements[{index}]: {e}")),
        }
    }

    validate_into(&elements, &mut result);
    result
}

fn missing_elements() -> ValidationResult {
    ValidationResult {
        valid: false,
        errors: vec!["file missing 'elements' array".to_string()],
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Parent;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Vec<Element> {
        serde_json::from_value(value).expect("elements should parse")
    }

    #[test]
    fn test_valid_minimal_element() {
        let elements = parse(json!([{"id": "abc", "name": "section", "parent": 0}]));
        let result = validate(&elements);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_name_is_error() {
        let elements = parse(json!([{"id": "abc"}]));
        let result = validate(&elements);
        assert!(!result.valid);
        assert!(result.errors[0].contains("'name'"));
    }

    #[test]
    fn test_unknown_type_warns() {
        let elements = parse(json!([{"id": "abc", "name": "fancy-widget"}]));
        let result = validate(&elements);
        assert!(result.valid);
        assert!(result.warnings[0].contains("fancy-widget"));
    }

    #[test]
    fn test_duplicate_ids() {
        let elements = parse(json!([
            {"id": "a", "name": "div"},
            {"id": "a", "name": "div"}
        ]));
        let result = validate(&elements);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["duplicate element ID: a"]);
    }

    #[test]
    fn test_orphaned_parent() {
        let elements = parse(json!([{"id": "h", "name": "heading", "parent": "zzz"}]));
        let result = validate(&elements);
        assert!(!result.valid);
        assert!(result.errors[0].contains("non-existent parent zzz"));
    }

    #[test]
    fn test_section_nesting_warns() {
        let elements = vec![
            Element::new("d".into(), ElementKind::Div, Parent::Root)
                .with_children(vec!["s".into()]),
            Element::new("s".into(), ElementKind::Section, Parent::Element("d".into())),
        ];
        let result = validate(&elements);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("root level"));
    }

    #[test]
    fn test_children_reference_warns() {
        let elements = parse(json!([{"id": "d", "name": "div", "children": ["ghost"]}]));
        let result = validate(&elements);
        assert!(result.valid);
        assert!(result.warnings[0].contains("non-existent child ghost"));
    }

    #[test]
    fn test_dynamic_data_pattern() {
        let found: Vec<_> = DYNAMIC_DATA_TAG
            .find_iter("{post_title} and {acf_field:option} but not {1x} or {}")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["{post_title}", "{acf_field:option}"]);
    }

    #[test]
    fn test_dynamic_data_tags() {
        let elements = parse(json!([{
            "id": "h", "name": "heading",
            "settings": {"text": "{post_title} by {author_name} on {wp_date:Y}"}
        }]));
        assert!(validate(&elements).warnings.is_empty());

        let elements = parse(json!([{
            "id": "h", "name": "heading",
            "settings": {"text": "Hello {mystery_tag}"}
        }]));
        let result = validate(&elements);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("{mystery_tag}"));
    }

    #[test]
    fn test_global_classes_shape() {
        let elements = parse(json!([{
            "id": "d", "name": "div",
            "settings": {"_cssGlobalClasses": "not-a-list"}
        }]));
        assert!(validate(&elements).warnings[0].contains("should be an array"));

        let elements = parse(json!([{
            "id": "d", "name": "div",
            "settings": {"_cssGlobalClasses": ["ok", 7]}
        }]));
        assert!(validate(&elements).warnings[0].contains("non-string"));
    }

    #[test]
    fn test_media_rules() {
        let bare = parse(json!([{
            "id": "i", "name": "image",
            "settings": {"image": {"url": "https://x.test/a.png"}}
        }]));
        assert!(validate(&bare).warnings[0].contains("bare URL"));

        let attached = parse(json!([{
            "id": "i", "name": "image",
            "settings": {"image": {"id": 123, "url": "https://x.test/a.png"}}
        }]));
        assert!(validate(&attached).warnings.is_empty());

        let dynamic = parse(json!([{
            "id": "i", "name": "image",
            "settings": {"image": {"url": "{post_featured_image}"}}
        }]));
        assert!(validate(&dynamic).warnings.is_empty());

        let neither = parse(json!([{
            "id": "i", "name": "image",
            "settings": {"image": {"alt": "x"}}
        }]));
        assert!(validate(&neither).warnings[0].contains("missing both"));
    }

    #[test]
    fn test_empty_is_blocking() {
        let result = validate(&[]);
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["no elements provided"]);
    }

    #[test]
    fn test_validate_file() {
        let data = json!({"elements": [
            {"id": "s", "name": "section", "parent": 0, "children": ["t"]},
            {"id": "t", "name": "text-basic", "parent": "s", "settings": {"text": "Hi"}},
            "not an object"
        ]});
        let result = validate_file(&data);
        assert!(result.valid, "{result:?}");
    }

    #[test]
    fn test_validate_file_missing_elements() {
        let result = validate_file(&json!({"content": []}));
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["file missing 'elements' array"]);
    }

    #[test]
    fn test_validate_file_undecodable_entry() {
        let data = json!({"elements": [
            {"id": "s", "name": "section"},
            {"id": "t", "name": "div", "children": "nope"}
        ]});
        let result = validate_file(&data);
        assert!(!result.valid);
        assert!(result.errors[0].starts_with("elements[1]"));
    }
}
