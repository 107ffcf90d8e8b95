//! The open settings bag carried by every element.
//!
//! The builder accepts a large, append-only set of setting keys, so settings
//! stay an open map. Values are a small tagged variant instead of raw JSON so
//! that callers match on shape rather than probe untyped data.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Element settings keyed by builder setting name.
pub type Settings = BTreeMap<String, SettingValue>;

/// Setting key for visible text.
pub const TEXT: &str = "text";
/// Setting key for the heading level tag.
pub const TAG: &str = "tag";
/// Setting key for resolved global class IDs.
pub const GLOBAL_CLASSES: &str = "_cssGlobalClasses";
/// Setting key for unresolved class names.
pub const RAW_CLASSES: &str = "_cssClasses";
/// Setting key for the compound class selector used without a registry.
pub const CUSTOM_CSS: &str = "_cssCustom";
/// Setting key for link targets.
pub const LINK: &str = "link";
/// Setting key for image sources.
pub const IMAGE: &str = "image";
/// Setting key for video sources.
pub const VIDEO_URL: &str = "videoUrl";
/// Setting key for the HTML `id` attribute.
pub const HTML_ID: &str = "_htmlId";
/// Setting key for custom `data-*` attributes.
pub const ATTRIBUTES: &str = "_attributes";

/// A single setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// JSON `null`.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Number. Integers stay integers on the wire.
    Number(serde_json::Number),
    /// String.
    Text(String),
    /// Ordered list.
    List(Vec<SettingValue>),
    /// Nested settings bag.
    Map(Settings),
}

impl SettingValue {
    /// Build a nested map from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SettingValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// The string value, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The nested map, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&Settings> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable access to the nested map, if this is a map.
    pub fn as_map_mut(&mut self) -> Option<&mut Settings> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[SettingValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Vec<SettingValue>> for SettingValue {
    fn from(items: Vec<SettingValue>) -> Self {
        Self::List(items)
    }
}

impl From<Settings> for SettingValue {
    fn from(map: Settings) -> Self {
        Self::Map(map)
    }
}

/// Get the nested map stored at `key`, creating it when absent.
///
/// A non-map value already stored at `key` is replaced.
pub fn ensure_map<'a>(settings: &'a mut Settings, key: &str) -> &'a mut Settings {
    let slot = settings
        .entry(key.to_string())
        .or_insert_with(|| SettingValue::Map(Settings::new()));
    reset_to_map(slot)
}

fn reset_to_map(slot: &mut SettingValue) -> &mut Settings {
    match slot {
        SettingValue::Map(map) => map,
        other => {
            *other = SettingValue::Map(Settings::new());
            reset_to_map(other)
        }
    }
}

/// Deserialize a settings bag, accepting an array as "no settings".
///
/// The remote store serializes an empty settings object as `[]`.
///
/// # Errors
///
/// Returns an error if the value is neither a map, an array, nor null.
pub fn deserialize_settings<'de, D>(deserializer: D) -> Result<Settings, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSettings {
        Map(Settings),
        Seq(Vec<serde::de::IgnoredAny>),
        Null(()),
    }

    Ok(match RawSettings::deserialize(deserializer)? {
        RawSettings::Map(map) => map,
        RawSettings::Seq(items) => {
            if !items.is_empty() {
                tracing::debug!("Dropping {} positional settings values", items.len());
            }
            Settings::new()
        }
        RawSettings::Null(()) => Settings::new(),
    })
}
