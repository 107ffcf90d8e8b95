//! HTML to builder element conversion.
//!
//! Markup is parsed with html5ever (malformed input is repaired the way a
//! browser would repair it), then walked depth-first. Each recognized tag
//! becomes one [`Element`]; unrecognized tags are unwrapped and their
//! children attach to the nearest recognized ancestor.
//!
//! ## Tag mapping
//!
//! | HTML                                        | Element      |
//! |---------------------------------------------|--------------|
//! | `section` `header` `footer` `main` `article`| `section`    |
//! | `div` `aside` `nav`                         | `div`        |
//! | `h1`..`h6`                                  | `heading`    |
//! | `p` `span` `blockquote`                     | `text-basic` |
//! | `a`                                         | `text-link`  |
//! | `button`                                    | `button`     |
//! | `img`                                       | `image`      |
//! | `video`                                     | `video`      |
//! | `ul` `ol`                                   | `list`       |
//! | `form`                                      | `form`       |
//! | `code` `pre`                                | `code`       |
//!
//! Child lists are filled in a second pass from the `parent` references,
//! since a child's ID does not exist yet when its parent is emitted.

use std::collections::HashSet;

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, Attribute, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::element::{rebuild_children, Element, ElementId, ElementKind, Parent};
use crate::registry::ClassRegistry;
use crate::settings::{self, SettingValue, Settings};
use crate::style::translate_style;

/// Prefix of custom attributes copied into `_attributes`.
pub const DATA_ATTRIBUTE_PREFIX: &str = "data-";

/// Result type for conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur during conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input could not be tokenized as markup.
    #[error("HTML parse error: {0}")]
    Parse(String),
}

/// Convert an HTML string to builder elements.
///
/// With a registry, class names resolve to global class IDs
/// (`_cssGlobalClasses`) and leftovers go to `_cssClasses`. Without one, the
/// class list is kept as a compound selector in `_cssCustom`.
///
/// # Errors
///
/// Currently infallible for string input (the HTML5 parser repairs any
/// markup); the `Result` is kept for parity with [`convert_bytes`].
pub fn convert(markup: &str, registry: Option<&ClassRegistry>) -> ConvertResult<Vec<Element>> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);
    let elements = HtmlConverter::new(registry).run(&dom.document);
    tracing::debug!(
        "Converted {} elements (registry: {})",
        elements.len(),
        registry.is_some()
    );
    Ok(elements)
}

/// Convert raw HTML bytes to builder elements.
///
/// # Errors
///
/// Returns [`ConvertError::Parse`] if the bytes are not valid UTF-8.
pub fn convert_bytes(
    markup: &[u8],
    registry: Option<&ClassRegistry>,
) -> ConvertResult<Vec<Element>> {
    let text = std::str::from_utf8(markup).map_err(|e| ConvertError::Parse(e.to_string()))?;
    convert(text, registry)
}

/// Internal converter state.
struct HtmlConverter<'a> {
    /// Class registry for resolution, if any.
    registry: Option<&'a ClassRegistry>,
    /// IDs handed out during this conversion.
    used_ids: HashSet<String>,
    /// Output in document pre-order.
    elements: Vec<Element>,
}

impl<'a> HtmlConverter<'a> {
    fn new(registry: Option<&'a ClassRegistry>) -> Self {
        Self {
            registry,
            used_ids: HashSet::new(),
            elements: Vec::new(),
        }
    }

    fn run(mut self, document: &Handle) -> Vec<Element> {
        let start = find_body(document).unwrap_or_else(|| document.clone());
        let mut stack: Vec<(Handle, Parent)> = start
            .children
            .borrow()
            .iter()
            .rev()
            .map(|child| (child.clone(), Parent::Root))
            .collect();
        while let Some((node, parent)) = stack.pop() {
            self.visit(&node, parent, &mut stack);
        }
        rebuild_children(&mut self.elements);
        self.elements
    }

    /// Emit `node` if its tag is recognized, then queue its children.
    ///
    /// Children are pushed in reverse so pops follow document pre-order.
    fn visit(&mut self, node: &Handle, parent: Parent, stack: &mut Vec<(Handle, Parent)>) {
        let NodeData::Element {
            ref name,
            ref attrs,
            ..
        } = node.data
        else {
            return;
        };

        let tag = name.local.as_ref();
        let child_parent = match ElementKind::from_tag(tag) {
            Some(kind) => {
                let id = ElementId::generate(&mut self.used_ids);
                let settings = self.extract_settings(node, tag, &kind, &attrs.borrow());
                self.elements
                    .push(Element::new(id.clone(), kind, parent).with_settings(settings));
                Parent::Element(id)
            }
            // Unwrapped: children attach to the nearest recognized ancestor.
            None => parent,
        };

        stack.extend(
            node.children
                .borrow()
                .iter()
                .rev()
                .map(|child| (child.clone(), child_parent.clone())),
        );
    }

    fn extract_settings(
        &self,
        node: &Handle,
        tag: &str,
        kind: &ElementKind,
        attrs: &[Attribute],
    ) -> Settings {
        let mut out = Settings::new();

        if kind.is_text_bearing() {
            let text = direct_text(node);
            if !text.is_empty() {
                out.insert(settings::TEXT.into(), text.into());
            }
        }

        if *kind == ElementKind::Heading {
            out.insert(settings::TAG.into(), tag.to_ascii_lowercase().into());
        }

        for attr in attrs {
            let value: &str = &attr.value;
            match attr.name.local.as_ref() {
                "class" => self.apply_classes(&mut out, value),
                "href" => {
                    if matches!(kind, ElementKind::TextLink | ElementKind::Button) {
                        out.insert(
                            settings::LINK.into(),
                            SettingValue::map([
                                ("type", SettingValue::from("external")),
                                ("url", SettingValue::from(value)),
                            ]),
                        );
                    }
                }
                "src" => match kind {
                    ElementKind::Image => {
                        out.insert(
                            settings::IMAGE.into(),
                            SettingValue::map([("url", SettingValue::from(value))]),
                        );
                    }
                    ElementKind::Video => {
                        out.insert(settings::VIDEO_URL.into(), value.into());
                    }
                    _ => {}
                },
                "alt" => {
                    if *kind == ElementKind::Image {
                        if let Some(image) = out
                            .get_mut(settings::IMAGE)
                            .and_then(SettingValue::as_map_mut)
                        {
                            image.insert("alt".into(), value.into());
                        }
                    }
                }
                "style" => out.extend(translate_style(value)),
                "id" => {
                    out.insert(settings::HTML_ID.into(), value.into());
                }
                name if name.starts_with(DATA_ATTRIBUTE_PREFIX) => {
                    let entry = SettingValue::map([
                        ("name", SettingValue::from(name)),
                        ("value", SettingValue::from(value)),
                    ]);
                    match out.get_mut(settings::ATTRIBUTES) {
                        Some(SettingValue::List(list)) => list.push(entry),
                        _ => {
                            out.insert(settings::ATTRIBUTES.into(), SettingValue::List(vec![entry]));
                        }
                    }
                }
                _ => {}
            }
        }

        out
    }

    fn apply_classes(&self, out: &mut Settings, value: &str) {
        let classes: Vec<&str> = value.split_whitespace().collect();
        if classes.is_empty() {
            return;
        }

        let Some(registry) = self.registry else {
            out.insert(
                settings::CUSTOM_CSS.into(),
                format!(".{}", classes.join(".")).into(),
            );
            return;
        };

        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        for class in classes {
            match registry.lookup(class) {
                Some(entry) => resolved.push(SettingValue::from(entry.id.as_str())),
                None => unresolved.push(class),
            }
        }
        if !resolved.is_empty() {
            out.insert(settings::GLOBAL_CLASSES.into(), SettingValue::List(resolved));
        }
        if !unresolved.is_empty() {
            out.insert(settings::RAW_CLASSES.into(), unresolved.join(" ").into());
        }
    }
}

/// Find the `<body>` element, depth-first.
fn find_body(document: &Handle) -> Option<Handle> {
    let mut stack = vec![document.clone()];
    while let Some(node) = stack.pop() {
        let is_body = matches!(
            &node.data,
            NodeData::Element { name, .. } if name.local.as_ref() == "body"
        );
        if is_body {
            return Some(node);
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    None
}

/// Concatenate a node's immediate text children, trimmed.
fn direct_text(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        if let NodeData::Text { ref contents } = child.data {
            text.push_str(&contents.borrow());
        }
    }
    text.trim().to_string()
}
