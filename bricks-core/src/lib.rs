//! # Bricks Core
//!
//! Element graph for the Bricks page builder: HTML conversion, inline style
//! translation, global class resolution, integrity checks and template
//! composition.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     bricks-core                      │
//! ├──────────────────────────────────────────────────────┤
//! │  convert           │  registry                       │
//! │  - HTML → elements │  - class name → global ID       │
//! │  - style → settings│  - JSON cache                   │
//! ├──────────────────────────────────────────────────────┤
//! │  doctor            │  validate                       │
//! │  - graded findings │  - pass/fail gate               │
//! ├──────────────────────────────────────────────────────┤
//! │  compose           │  catalog                        │
//! │  - ID remapping    │  - template files, learning     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use bricks_core::{convert, validate};
//!
//! let elements = convert("<section><h2>Hi</h2></section>", None).unwrap();
//! assert_eq!(elements.len(), 2);
//! assert!(validate(&elements).valid);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod compose;
pub mod convert;
pub mod doctor;
pub mod element;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod style;
pub mod validate;

pub use catalog::{learn_from_page, sanitize_filename, Catalog, CatalogError};
pub use compose::{
    compose, compose_with_classes, ComposeError, ComposeResult, GlobalClass, Template,
};
pub use convert::{convert, convert_bytes, ConvertError, ConvertResult};
pub use doctor::{Issue, Report, Severity};
pub use element::{Element, ElementId, ElementKind, Parent};
pub use registry::{ClassEntry, ClassOrigin, ClassRegistry, RegistryError, RegistryStats};
pub use schema::{DocumentError, ElementsFile, PageDocument};
pub use settings::{SettingValue, Settings};
pub use style::translate_style;
pub use validate::{validate, validate_file, ValidationResult};

/// Bricks core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
