//! Diagnostic health checks for element lists.
//!
//! The doctor never blocks: it inspects a list and reports every finding with
//! a severity so callers can show repair guidance. See [`crate::validate`] for
//! the pass/fail gate.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::element::{Element, ElementId, ElementKind, Parent};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Structural defect.
    Error,
    /// Suspicious but usable.
    Warning,
    /// Informational.
    Info,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// How serious the finding is.
    pub severity: Severity,
    /// Check slug, e.g. `duplicate-id`.
    pub check: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Element the finding is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<ElementId>,
}

/// All findings for one element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Findings in check order.
    pub issues: Vec<Issue>,
    /// Count per severity. Every severity is present.
    pub summary: BTreeMap<Severity, usize>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            summary: Severity::ALL.into_iter().map(|s| (s, 0)).collect(),
        }
    }
}

impl Report {
    /// Number of findings with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.summary.get(&severity).copied().unwrap_or(0)
    }

    /// Whether any error-level finding exists.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Whether the list is free of findings.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    fn add(
        &mut self,
        severity: Severity,
        check: &'static str,
        message: String,
        element_id: Option<&ElementId>,
    ) {
        self.issues.push(Issue {
            severity,
            check,
            message,
            element_id: element_id.filter(|id| !id.is_empty()).cloned(),
        });
        *self.summary.entry(severity).or_insert(0) += 1;
    }
}

/// Kinds expected to carry settings.
const CONTENT_KINDS: [ElementKind; 4] = [
    ElementKind::Heading,
    ElementKind::TextBasic,
    ElementKind::Button,
    ElementKind::Image,
];

/// Run every health check over `elements`.
#[must_use]
pub fn check(elements: &[Element]) -> Report {
    let mut report = Report::default();
    let ids: HashSet<&ElementId> = elements
        .iter()
        .map(|e| &e.id)
        .filter(|id| !id.is_empty())
        .collect();

    check_duplicate_ids(elements, &mut report);
    check_orphaned_parents(elements, &ids, &mut report);
    check_children(elements, &ids, &mut report);
    check_nesting(elements, &mut report);
    check_missing_ids(elements, &mut report);
    check_empty_settings(elements, &mut report);

    tracing::debug!(
        "Doctor: {} errors, {} warnings, {} info over {} elements",
        report.count(Severity::Error),
        report.count(Severity::Warning),
        report.count(Severity::Info),
        elements.len()
    );
    report
}

fn check_duplicate_ids(elements: &[Element], report: &mut Report) {
    let mut counts: HashMap<&ElementId, usize> = HashMap::new();
    let mut order = Vec::new();
    for element in elements.iter().filter(|e| !e.id.is_empty()) {
        let count = counts.entry(&element.id).or_insert(0);
        if *count == 0 {
            order.push(&element.id);
        }
        *count += 1;
    }
    for id in order {
        let count = counts[id];
        if count > 1 {
            report.add(
                Severity::Error,
                "duplicate-id",
                format!("ID '{id}' appears {count} times"),
                Some(id),
            );
        }
    }
}

fn check_orphaned_parents(elements: &[Element], ids: &HashSet<&ElementId>, report: &mut Report) {
    for element in elements {
        if let Some(parent) = element.parent.id() {
            if !ids.contains(parent) {
                report.add(
                    Severity::Error,
                    "orphaned-parent",
                    format!("references non-existent parent '{parent}'"),
                    Some(&element.id),
                );
            }
        }
    }
}

fn check_children(elements: &[Element], ids: &HashSet<&ElementId>, report: &mut Report) {
    for element in elements {
        for child in element.children.iter().filter(|c| !c.is_empty()) {
            if !ids.contains(child) {
                report.add(
                    Severity::Warning,
                    "broken-child-ref",
                    format!("lists non-existent child '{child}'"),
                    Some(&element.id),
                );
            }
        }
    }

    // Later duplicates win, matching a map keyed by ID.
    let parent_of: HashMap<&ElementId, &Parent> = elements
        .iter()
        .filter(|e| !e.id.is_empty())
        .map(|e| (&e.id, &e.parent))
        .collect();

    for element in elements {
        for child in element.children.iter().filter(|c| !c.is_empty()) {
            let Some(actual) = parent_of.get(child) else {
                continue;
            };
            if actual.id() != Some(&element.id) {
                report.add(
                    Severity::Warning,
                    "parent-child-mismatch",
                    format!("claims child '{child}' but child's parent is '{actual}'"),
                    Some(&element.id),
                );
            }
        }
    }
}

fn check_nesting(elements: &[Element], report: &mut Report) {
    for element in elements {
        if element.kind == ElementKind::Section && !element.parent.is_root() {
            report.add(
                Severity::Warning,
                "nesting-violation",
                "section should be at root level (parent=0)".to_string(),
                Some(&element.id),
            );
        }
    }
}

fn check_missing_ids(elements: &[Element], report: &mut Report) {
    for (index, element) in elements.iter().enumerate() {
        if element.id.is_empty() {
            report.add(
                Severity::Warning,
                "missing-id",
                format!("element at index {index} has no ID"),
                None,
            );
        }
    }
}

fn check_empty_settings(elements: &[Element], report: &mut Report) {
    for element in elements {
        if CONTENT_KINDS.contains(&element.kind) && element.settings.is_empty() {
            report.add(
                Severity::Info,
                "empty-settings",
                format!("{} element has no settings", element.kind),
                Some(&element.id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn el(id: &str, kind: ElementKind, parent: Parent, children: &[&str]) -> Element {
        let mut settings = Settings::new();
        settings.insert("text".into(), "x".into());
        Element::new(id.into(), kind, parent)
            .with_children(children.iter().map(|c| ElementId::from(*c)).collect())
            .with_settings(settings)
    }

    fn checks(report: &Report) -> Vec<&'static str> {
        report.issues.iter().map(|i| i.check).collect()
    }

    #[test]
    fn test_healthy_page() {
        let elements = vec![
            el("s1", ElementKind::Section, Parent::Root, &["h1"]),
            el("h1", ElementKind::Heading, Parent::Element("s1".into()), &[]),
        ];
        let report = check(&elements);
        assert!(report.is_healthy());
        assert_eq!(report.count(Severity::Error), 0);
        assert_eq!(report.summary.len(), 3);
    }

    #[test]
    fn test_duplicate_ids() {
        let elements = vec![
            el("a", ElementKind::Div, Parent::Root, &[]),
            el("a", ElementKind::Div, Parent::Root, &[]),
            el("a", ElementKind::Div, Parent::Root, &[]),
        ];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["duplicate-id"]);
        assert!(report.issues[0].message.contains("3 times"));
        assert!(report.has_errors());
    }

    #[test]
    fn test_orphaned_parent() {
        let elements = vec![el("h1", ElementKind::Heading, Parent::Element("gone".into()), &[])];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["orphaned-parent"]);
        assert_eq!(report.issues[0].severity, Severity::Error);
        assert_eq!(report.issues[0].element_id, Some(ElementId::from("h1")));
    }

    #[test]
    fn test_broken_child_ref() {
        let elements = vec![el("d", ElementKind::Div, Parent::Root, &["ghost"])];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["broken-child-ref"]);
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn test_parent_child_mismatch() {
        let elements = vec![
            el("a", ElementKind::Div, Parent::Root, &["c"]),
            el("b", ElementKind::Div, Parent::Root, &[]),
            el("c", ElementKind::TextBasic, Parent::Element("b".into()), &[]),
        ];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["parent-child-mismatch"]);
        assert!(report.issues[0].message.contains("'b'"));
    }

    #[test]
    fn test_nesting_violation() {
        let elements = vec![
            el("d", ElementKind::Div, Parent::Root, &["s"]),
            el("s", ElementKind::Section, Parent::Element("d".into()), &[]),
        ];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["nesting-violation"]);
    }

    #[test]
    fn test_missing_id() {
        let elements = vec![el("", ElementKind::Div, Parent::Root, &[])];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["missing-id"]);
        assert!(report.issues[0].element_id.is_none());
        assert!(report.issues[0].message.contains("index 0"));
    }

    #[test]
    fn test_empty_settings() {
        let elements = vec![
            Element::new("h".into(), ElementKind::Heading, Parent::Root),
            Element::new("d".into(), ElementKind::Div, Parent::Root),
        ];
        let report = check(&elements);
        assert_eq!(checks(&report), vec!["empty-settings"]);
        assert_eq!(report.count(Severity::Info), 1);
    }

    #[test]
    fn test_report_is_idempotent() {
        let elements = vec![
            el("a", ElementKind::Section, Parent::Element("x".into()), &["q", "r"]),
            el("a", ElementKind::Div, Parent::Root, &[]),
            el("", ElementKind::Image, Parent::Root, &[]),
        ];
        assert_eq!(check(&elements), check(&elements));
    }

    #[test]
    fn test_report_serializes_lowercase() {
        let elements = vec![el("h1", ElementKind::Heading, Parent::Element("gone".into()), &[])];
        let json = serde_json::to_value(check(&elements)).expect("ser");
        assert_eq!(json["issues"][0]["severity"], "error");
        assert_eq!(json["issues"][0]["elementId"], "h1");
        assert_eq!(json["summary"]["error"], 1);
        assert_eq!(json["summary"]["info"], 0);
    }
}
