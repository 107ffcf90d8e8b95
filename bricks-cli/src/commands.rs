//! Subcommand implementations.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use bricks_core::doctor::{self, Severity};
use bricks_core::{
    compose, compose_with_classes, convert, learn_from_page, validate_file, Catalog,
    ClassRegistry, ElementsFile, PageDocument, Template,
};

use crate::{CliConfig, Command, TemplatesAction};

/// Failures reported to the user as a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Validation found blocking errors.
    #[error("validation failed with {0} error(s)")]
    ValidationFailed(usize),
    /// No class registry cache is available.
    #[error("no class registry cache at {0}")]
    NoRegistryCache(PathBuf),
    /// A command needs the template catalog directory.
    #[error("no templates directory configured (set --templates-dir or BRICKS_TEMPLATES_DIR)")]
    NoTemplatesDir,
    /// A named template is not in the catalog.
    #[error("template not found: {0}")]
    TemplateNotFound(String),
}

/// Run one subcommand, writing its output to `out`.
///
/// # Errors
///
/// Returns an error if input cannot be read or parsed, if output cannot be
/// written, or with a [`CommandError`] when the command's check fails.
pub fn run(config: &CliConfig, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Convert {
            input,
            registry_file,
            use_cache,
            save_cache,
            output,
        } => {
            let registry = if let Some(path) = registry_file {
                let registry = registry_from_records(&path)?;
                if save_cache {
                    std::fs::create_dir_all(&config.config_dir)?;
                    registry.save_to_file(config.registry_cache_path(), &config.site_url)?;
                    tracing::info!(
                        "Cached {} classes at {}",
                        registry.len(),
                        config.registry_cache_path().display()
                    );
                }
                Some(registry)
            } else if use_cache {
                ClassRegistry::load_cached(config.registry_cache_path())
            } else {
                None
            };
            run_convert(&input, registry.as_ref(), output.as_deref(), out)
        }
        Command::Validate { input } => run_validate(&input, out),
        Command::Doctor { input, json } => run_doctor(&input, json, out),
        Command::Compose {
            templates,
            with_classes,
            output,
        } => run_compose(config, &templates, with_classes, output.as_deref(), out),
        Command::Classes { origin, stats } => {
            let path = config.registry_cache_path();
            let registry = ClassRegistry::load_cached(&path)
                .ok_or(CommandError::NoRegistryCache(path))?;
            if stats {
                let stats = registry.stats();
                writeln!(
                    out,
                    "{} classes ({} acss, {} frames)",
                    stats.total, stats.acss, stats.frames
                )?;
            } else {
                let names = match origin {
                    Some(origin) => registry.by_origin(origin.into()),
                    None => registry.names(),
                };
                for name in names {
                    writeln!(out, "{name}")?;
                }
            }
            Ok(())
        }
        Command::Templates { action } => run_templates(config, action, out),
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_json(
    value: &impl serde::Serialize,
    output: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => writeln!(out, "{json}")?,
    }
    Ok(())
}

/// Build a registry from a file holding an array of class records, or an
/// object with a `classes` array.
fn registry_from_records(path: &Path) -> anyhow::Result<ClassRegistry> {
    let value: serde_json::Value = serde_json::from_str(&read_input(path)?)
        .with_context(|| format!("Invalid class records in {}", path.display()))?;
    let records = match &value {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => map
            .get("classes")
            .and_then(serde_json::Value::as_array)
            .map_or(&[][..], Vec::as_slice),
        _ => &[][..],
    };
    Ok(ClassRegistry::build_from_source(records))
}

fn run_convert(
    input: &Path,
    registry: Option<&ClassRegistry>,
    output: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let markup = read_input(input)?;
    let elements = convert(&markup, registry)?;
    tracing::info!("Converted {} elements", elements.len());
    write_json(&PageDocument::new(elements), output, out)
}

fn run_validate(input: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let value: serde_json::Value = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("Invalid JSON in {}", input.display()))?;
    let result = validate_file(&value);

    for error in &result.errors {
        writeln!(out, "error: {error}")?;
    }
    for warning in &result.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    if !result.valid {
        return Err(CommandError::ValidationFailed(result.errors.len()).into());
    }
    writeln!(out, "valid ({} warning(s))", result.warnings.len())?;
    Ok(())
}

fn read_elements(input: &Path) -> anyhow::Result<Vec<bricks_core::Element>> {
    let file = ElementsFile::from_json(&read_input(input)?)
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    Ok(file.into_elements())
}

fn run_doctor(input: &Path, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let report = doctor::check(&read_elements(input)?);
    if json {
        return write_json(&report, None, out);
    }

    for issue in &report.issues {
        match &issue.element_id {
            Some(id) => writeln!(
                out,
                "[{}] {} ({id}): {}",
                issue.severity, issue.check, issue.message
            )?,
            None => writeln!(out, "[{}] {}: {}", issue.severity, issue.check, issue.message)?,
        }
    }
    writeln!(
        out,
        "{} error(s), {} warning(s), {} info",
        report.count(Severity::Error),
        report.count(Severity::Warning),
        report.count(Severity::Info)
    )?;
    Ok(())
}

fn load_catalog(config: &CliConfig) -> anyhow::Result<Catalog> {
    let dir = config
        .templates_dir
        .as_ref()
        .ok_or(CommandError::NoTemplatesDir)?;
    let mut catalog = Catalog::new();
    catalog
        .load_dir(dir)
        .with_context(|| format!("Failed to load templates from {}", dir.display()))?;
    Ok(catalog)
}

fn resolve_templates(config: &CliConfig, names: &[String]) -> anyhow::Result<Vec<Template>> {
    let mut catalog = None;
    let mut templates = Vec::with_capacity(names.len());
    for name in names {
        let path = Path::new(name);
        if path.is_file() {
            let template: Template = serde_json::from_str(&read_input(path)?)
                .with_context(|| format!("Invalid template {}", path.display()))?;
            templates.push(template);
            continue;
        }
        if catalog.is_none() {
            catalog = Some(load_catalog(config)?);
        }
        let template = catalog
            .as_ref()
            .and_then(|c| c.get(name))
            .ok_or_else(|| CommandError::TemplateNotFound(name.clone()))?;
        templates.push(template.clone());
    }
    Ok(templates)
}

fn run_compose(
    config: &CliConfig,
    names: &[String],
    with_classes: bool,
    output: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let templates = resolve_templates(config, names)?;
    if with_classes {
        let result = compose_with_classes(&templates)?;
        tracing::info!(
            "Composed {} elements, {} global classes",
            result.elements.len(),
            result.global_classes.len()
        );
        write_json(&result, output, out)
    } else {
        let elements = compose(&templates)?;
        tracing::info!("Composed {} elements", elements.len());
        write_json(&PageDocument::new(elements), output, out)
    }
}

fn run_templates(
    config: &CliConfig,
    action: TemplatesAction,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        TemplatesAction::List => {
            let catalog = load_catalog(config)?;
            for name in catalog.list() {
                writeln!(out, "{name}")?;
            }
        }
        TemplatesAction::Search { query } => {
            let catalog = load_catalog(config)?;
            for template in catalog.search(&query) {
                writeln!(out, "{}\t{}", template.name, template.category)?;
            }
        }
        TemplatesAction::Show { name } => {
            let catalog = load_catalog(config)?;
            let template = catalog
                .get(&name)
                .ok_or_else(|| CommandError::TemplateNotFound(name.clone()))?;
            write_json(template, None, out)?;
        }
        TemplatesAction::Learn { input, page, save } => {
            let mut learned = learn_from_page(&read_elements(&input)?, &page);
            if save {
                let dir = config
                    .templates_dir
                    .as_ref()
                    .ok_or(CommandError::NoTemplatesDir)?;
                for template in &mut learned {
                    let path = Catalog::save(template, dir)?;
                    writeln!(out, "saved {}", path.display())?;
                }
            } else {
                for template in &learned {
                    writeln!(
                        out,
                        "{}\t{} element(s)",
                        template.name,
                        template.elements.len()
                    )?;
                }
            }
        }
    }
    Ok(())
}
