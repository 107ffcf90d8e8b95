//! On-disk template catalog.
//!
//! Templates live as JSON files under one or more directories. Two file
//! formats are accepted:
//!
//! - the plain [`Template`] format, and
//! - the Frames export wrapper `{ "title", "bricksExport": { "content", "globalClasses" } }`,
//!   whose category is taken from the parent directory name.
//!
//! Files that cannot be read or decoded are skipped with a warning.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::compose::{GlobalClass, Template};
use crate::element::{Element, ElementId, ElementKind};

/// Category assigned to templates split out of a page.
pub const LEARNED_CATEGORY: &str = "learned";

/// Errors that can occur during catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An I/O error occurred while reading or writing templates.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A template could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Named templates, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: BTreeMap<String, Template>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` template under `dir`, recursively.
    ///
    /// A template with the same name as an existing one replaces it.
    /// Returns the number of templates loaded.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if `dir` itself cannot be read.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        collect_json_files(dir, &mut files)?;
        files.sort();

        let mut loaded = 0;
        for path in files {
            if let Some(template) = read_template(&path) {
                self.add(template);
                loaded += 1;
            }
        }
        tracing::debug!("Loaded {loaded} templates from {}", dir.display());
        Ok(loaded)
    }

    /// Add or replace a template.
    pub fn add(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Look up a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// All template names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Templates whose name, description, category or any tag contains
    /// `query`, ignoring case. Results are ordered by name.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Template> {
        let query = query.to_lowercase();
        self.templates
            .values()
            .filter(|t| matches_query(t, &query))
            .collect()
    }

    /// Number of templates.
    #[must_use]
    pub fn count(&self) -> usize {
        self.templates.len()
    }

    /// Write `template` to `dir` as `<sanitized name>.json`.
    ///
    /// The directory is created if needed and `template.source` is set to
    /// the written path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(template: &mut Template, dir: impl AsRef<Path>) -> Result<PathBuf, CatalogError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(template)?;
        let path = dir.join(format!("{}.json", sanitize_filename(&template.name)));
        std::fs::write(&path, json)?;
        template.source = Some(path.display().to_string());
        Ok(path)
    }
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if path.is_dir() {
            if let Err(e) = collect_json_files(&path, files) {
                tracing::warn!("Skipping template directory {}: {e}", path.display());
            }
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

fn read_template(path: &Path) -> Option<Template> {
    let raw: serde_json::Value = match std::fs::read_to_string(path)
        .map_err(CatalogError::from)
        .and_then(|s| serde_json::from_str(&s).map_err(CatalogError::from))
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Skipping template {}: {e}", path.display());
            return None;
        }
    };

    let mut template = if let Some(export) = raw.get("bricksExport").filter(|v| v.is_object()) {
        from_frames_export(&raw, export, path)
    } else {
        match serde_json::from_value::<Template>(raw) {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!("Skipping template {}: {e}", path.display());
                return None;
            }
        }
    };

    if template.name.is_empty() {
        template.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    template.source = Some(path.display().to_string());
    Some(template)
}

fn from_frames_export(
    raw: &serde_json::Value,
    export: &serde_json::Value,
    path: &Path,
) -> Template {
    let name = raw
        .get("title")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    let category = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Template {
        name: name.to_string(),
        category,
        elements: decode_objects(export.get("content"), path),
        global_classes: decode_objects::<GlobalClass>(export.get("globalClasses"), path),
        ..Template::default()
    }
}

fn decode_objects<T: serde::de::DeserializeOwned>(
    value: Option<&serde_json::Value>,
    path: &Path,
) -> Vec<T> {
    let Some(items) = value.and_then(serde_json::Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!("Skipping entry in {}: {e}", path.display());
                None
            }
        })
        .collect()
}

fn matches_query(template: &Template, query: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(query);
    hit(&template.name)
        || hit(&template.description)
        || hit(&template.category)
        || template.tags.iter().any(|tag| hit(tag))
}

/// Lowercase `name`, turn spaces into dashes and drop everything except
/// ASCII letters, digits, `-` and `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')
        .collect()
}

/// Split a page into one template per root-level section.
///
/// Each template holds the section followed by its descendants, depth-first
/// in list order.
#[must_use]
pub fn learn_from_page(elements: &[Element], page_name: &str) -> Vec<Template> {
    elements
        .iter()
        .filter(|e| e.kind == ElementKind::Section && e.parent.is_root())
        .enumerate()
        .map(|(index, section)| {
            let mut members = vec![section.clone()];
            let mut visited = HashSet::from([&section.id]);
            collect_descendants(&section.id, elements, &mut visited, &mut members);

            let label = section
                .label
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format!("Section {}", index + 1));

            Template {
                name: format!("{page_name}-{}", sanitize_filename(&label)),
                description: format!("Learned from {page_name}: {label}"),
                category: LEARNED_CATEGORY.to_string(),
                tags: vec![LEARNED_CATEGORY.to_string(), page_name.to_string()],
                elements: members,
                global_classes: Vec::new(),
                source: Some(LEARNED_CATEGORY.to_string()),
            }
        })
        .collect()
}

/// Append every descendant of `root` to `out`, depth-first in list order.
///
/// An ID already in `visited` is emitted but not expanded again, so parent
/// cycles terminate.
fn collect_descendants<'a>(
    root: &ElementId,
    elements: &'a [Element],
    visited: &mut HashSet<&'a ElementId>,
    out: &mut Vec<Element>,
) {
    let mut by_parent: HashMap<&ElementId, Vec<&'a Element>> = HashMap::new();
    for element in elements {
        if let Some(parent) = element.parent.id() {
            by_parent.entry(parent).or_default().push(element);
        }
    }

    let children_of = |id: &ElementId| by_parent.get(id).map_or(&[][..], Vec::as_slice);
    let mut stack: Vec<&Element> = children_of(root).iter().rev().copied().collect();
    while let Some(element) = stack.pop() {
        out.push(element.clone());
        if !element.id.is_empty() && visited.insert(&element.id) {
            stack.extend(children_of(&element.id).iter().rev().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Parent;
    use serde_json::json;

    fn write(dir: &Path, rel: &str, value: &serde_json::Value) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, serde_json::to_string(value).expect("ser")).expect("write");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hero Section #1"), "hero-section-1");
        assert_eq!(sanitize_filename("a/b\\c"), "abc");
        assert_eq!(sanitize_filename("snake_case"), "snake_case");
    }

    #[test]
    fn test_load_dir_plain_and_frames() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "hero.json",
            &json!({
                "name": "hero-basic",
                "description": "Big hero",
                "category": "hero",
                "tags": ["landing"],
                "elements": [{"id": "s1", "name": "section", "parent": 0}]
            }),
        );
        write(
            dir.path(),
            "frames/pricing/table.json",
            &json!({
                "title": "Pricing Alpha",
                "bricksExport": {
                    "content": [{"id": "p1", "name": "section", "parent": 0}, "junk"],
                    "globalClasses": [{"id": "g1", "name": "fr-pricing", "settings": {}}]
                }
            }),
        );
        write(dir.path(), "untitled.json", &json!({"elements": []}));
        std::fs::write(dir.path().join("broken.json"), "{ nope").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut catalog = Catalog::new();
        let loaded = catalog.load_dir(dir.path()).expect("load");
        assert_eq!(loaded, 3);
        assert_eq!(catalog.count(), 3);
        assert_eq!(catalog.list(), vec!["Pricing Alpha", "hero-basic", "untitled"]);

        let frames = catalog.get("Pricing Alpha").expect("frames");
        assert_eq!(frames.category, "pricing");
        assert_eq!(frames.elements.len(), 1);
        assert_eq!(frames.global_classes[0].name, "fr-pricing");
        assert!(frames.source.as_deref().is_some_and(|s| s.ends_with("table.json")));
    }

    #[test]
    fn test_load_dir_missing_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = Catalog::new();
        assert!(catalog.load_dir(dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_search_case_insensitive() {
        let mut catalog = Catalog::new();
        let mut hero = Template::new("hero-dark", Vec::new());
        hero.tags = vec!["Landing".to_string()];
        catalog.add(hero);
        let mut cta = Template::new("cta", Vec::new());
        cta.description = "Call to action for landing pages".to_string();
        catalog.add(cta);
        catalog.add(Template::new("footer", Vec::new()));

        let names: Vec<&str> = catalog
            .search("LANDING")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["cta", "hero-dark"]);
        assert!(catalog.search("zzz").is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut template = Template::new(
            "My Hero",
            vec![Element::new("s1".into(), ElementKind::Section, Parent::Root)],
        );
        let path = Catalog::save(&mut template, dir.path()).expect("save");
        assert!(path.ends_with("my-hero.json"));
        assert_eq!(template.source, Some(path.display().to_string()));

        let mut catalog = Catalog::new();
        catalog.load_dir(dir.path()).expect("load");
        let loaded = catalog.get("My Hero").expect("loaded");
        assert_eq!(loaded.elements, template.elements);
    }

    #[test]
    fn test_save_keeps_unmodeled_element_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let elements: Vec<Element> = serde_json::from_value(json!([
            {"id": "s1", "name": "section", "parent": 0, "cid": "abc"}
        ]))
        .expect("elements");
        let mut template = Template::new("cid", elements);
        Catalog::save(&mut template, dir.path()).expect("save");

        let mut catalog = Catalog::new();
        catalog.load_dir(dir.path()).expect("load");
        let loaded = catalog.get("cid").expect("loaded");
        assert_eq!(loaded.elements[0].extra["cid"], json!("abc"));
    }

    #[test]
    fn test_learn_from_page() {
        let elements: Vec<Element> = serde_json::from_value(json!([
            {"id": "s1", "name": "section", "parent": 0, "label": "Hero Area", "children": ["c1"]},
            {"id": "c1", "name": "container", "parent": "s1", "children": ["h1"]},
            {"id": "s2", "name": "section", "parent": 0, "children": ["t2"]},
            {"id": "h1", "name": "heading", "parent": "c1"},
            {"id": "t2", "name": "text-basic", "parent": "s2"}
        ]))
        .expect("elements");

        let learned = learn_from_page(&elements, "home");
        assert_eq!(learned.len(), 2);

        assert_eq!(learned[0].name, "home-hero-area");
        let ids: Vec<&str> = learned[0].elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "c1", "h1"]);

        assert_eq!(learned[1].name, "home-section-2");
        assert_eq!(learned[1].category, LEARNED_CATEGORY);
        assert_eq!(learned[1].tags, vec!["learned", "home"]);
        assert_eq!(learned[1].elements.len(), 2);
    }

    #[test]
    fn test_learn_deep_chain() {
        const DEPTH: usize = 20_000;
        let mut elements = vec![Element::new("n0".into(), ElementKind::Section, Parent::Root)];
        for i in 1..DEPTH {
            elements.push(Element::new(
                format!("n{i}").as_str().into(),
                ElementKind::Div,
                Parent::Element(format!("n{}", i - 1).as_str().into()),
            ));
        }
        let learned = learn_from_page(&elements, "deep");
        assert_eq!(learned.len(), 1);
        assert_eq!(learned[0].elements.len(), DEPTH);
        assert_eq!(learned[0].elements[DEPTH - 1].id.as_str(), format!("n{}", DEPTH - 1));
    }

    #[test]
    fn test_learn_survives_parent_cycle() {
        let elements: Vec<Element> = serde_json::from_value(json!([
            {"id": "s", "name": "section", "parent": 0},
            {"id": "a", "name": "div", "parent": "s"},
            {"id": "b", "name": "div", "parent": "a"},
            {"id": "a", "name": "div", "parent": "b"}
        ]))
        .expect("elements");
        let learned = learn_from_page(&elements, "loop");
        assert_eq!(learned.len(), 1);
        assert!(learned[0].elements.len() >= 3);
    }
}
