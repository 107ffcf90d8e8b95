//! Inline `style` attribute translation into builder settings.
//!
//! Declarations are routed into three groups:
//!
//! | Group       | Settings key               | Properties                                   |
//! |-------------|----------------------------|----------------------------------------------|
//! | Typography  | `_typography` (nested)     | color, font-*, text-align, line-height, ...  |
//! | Box model   | `_padding` / `_margin`     | shorthand and per-side longhands             |
//! | Flat        | one key per property       | background, gap, sizing, flex/grid, ...      |
//!
//! Values pass through verbatim; no unit parsing or validation happens here.

use crate::settings::{ensure_map, SettingValue, Settings};

/// Settings key for grouped typography.
pub const TYPOGRAPHY: &str = "_typography";
/// Settings key for padding sides.
pub const PADDING: &str = "_padding";
/// Settings key for margin sides.
pub const MARGIN: &str = "_margin";
/// Settings key for background.
pub const BACKGROUND: &str = "_background";

/// A box side, in CSS shorthand order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Top edge.
    Top,
    /// Right edge.
    Right,
    /// Bottom edge.
    Bottom,
    /// Left edge.
    Left,
}

impl Side {
    /// All sides in shorthand order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Settings key for this side.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Where a CSS property lands in the settings bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// Key inside `_typography`.
    Typography(&'static str),
    /// `_typography.color`, wrapped as `{raw}`.
    TypographyColor,
    /// Box shorthand for the given group key.
    BoxShorthand(&'static str),
    /// One side of the given box group.
    BoxSide(&'static str, Side),
    /// `_background.color`, wrapped as `{raw}`.
    Background,
    /// A flat top-level key.
    Flat(&'static str),
}

fn route(property: &str) -> Option<Route> {
    let route = match property {
        "color" => Route::TypographyColor,
        "font-size" => Route::Typography("font-size"),
        "font-weight" => Route::Typography("font-weight"),
        "text-align" => Route::Typography("text-align"),
        "line-height" => Route::Typography("line-height"),
        "letter-spacing" => Route::Typography("letter-spacing"),
        "font-style" => Route::Typography("font-style"),
        "text-transform" => Route::Typography("text-transform"),

        "padding" => Route::BoxShorthand(PADDING),
        "padding-top" => Route::BoxSide(PADDING, Side::Top),
        "padding-right" => Route::BoxSide(PADDING, Side::Right),
        "padding-bottom" => Route::BoxSide(PADDING, Side::Bottom),
        "padding-left" => Route::BoxSide(PADDING, Side::Left),
        "margin" => Route::BoxShorthand(MARGIN),
        "margin-top" => Route::BoxSide(MARGIN, Side::Top),
        "margin-right" => Route::BoxSide(MARGIN, Side::Right),
        "margin-bottom" => Route::BoxSide(MARGIN, Side::Bottom),
        "margin-left" => Route::BoxSide(MARGIN, Side::Left),

        "background" | "background-color" => Route::Background,

        "gap" => Route::Flat("_gap"),
        "row-gap" => Route::Flat("_rowGap"),
        "column-gap" => Route::Flat("_columnGap"),
        "width" => Route::Flat("_width"),
        "max-width" => Route::Flat("_maxWidth"),
        "height" => Route::Flat("_height"),
        "min-height" => Route::Flat("_minHeight"),
        "display" => Route::Flat("_display"),
        "flex-direction" => Route::Flat("_direction"),
        "align-items" => Route::Flat("_alignItems"),
        "justify-content" => Route::Flat("_justifyContent"),
        "grid-template-columns" => Route::Flat("_gridTemplateColumns"),
        "grid-template-rows" => Route::Flat("_gridTemplateRows"),
        "border-radius" => Route::Flat("_borderRadius"),
        "overflow" => Route::Flat("_overflow"),
        "position" => Route::Flat("_position"),
        "z-index" => Route::Flat("_zIndex"),
        "opacity" => Route::Flat("_opacity"),
        _ => return None,
    };
    Some(route)
}

fn raw_color(value: &str) -> SettingValue {
    SettingValue::map([("raw", SettingValue::from(value))])
}

/// Translate an inline style string into builder settings.
///
/// Unknown properties and malformed declarations are skipped.
#[must_use]
pub fn translate_style(style: &str) -> Settings {
    let mut settings = Settings::new();

    for declaration in style.split(';') {
        let declaration = declaration.trim();
        if declaration.is_empty() {
            continue;
        }
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim();
        let value = value.trim();

        let Some(route) = route(property) else {
            continue;
        };

        match route {
            Route::TypographyColor => {
                ensure_map(&mut settings, TYPOGRAPHY).insert("color".into(), raw_color(value));
            }
            Route::Typography(key) => {
                ensure_map(&mut settings, TYPOGRAPHY).insert(key.into(), value.into());
            }
            Route::BoxShorthand(group) => {
                settings.insert(group.into(), SettingValue::Map(expand_box_shorthand(value)));
            }
            Route::BoxSide(group, side) => {
                ensure_map(&mut settings, group).insert(side.key().into(), value.into());
            }
            Route::Background => {
                settings.insert(
                    BACKGROUND.into(),
                    SettingValue::map([("color", raw_color(value))]),
                );
            }
            Route::Flat(key) => {
                settings.insert(key.into(), value.into());
            }
        }
    }

    settings
}

/// Expand a `padding`/`margin` shorthand into the four sides.
///
/// One value applies to all sides; two are vertical/horizontal; three are
/// top/horizontal/bottom; four are top/right/bottom/left. Any other count
/// assigns the whole raw value to every side.
#[must_use]
pub fn expand_box_shorthand(value: &str) -> Settings {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [top, right, bottom, left] = match parts.as_slice() {
        [all] => [*all; 4],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left] => [*top, *right, *bottom, *left],
        _ => [value; 4],
    };

    Side::ALL
        .into_iter()
        .zip([top, right, bottom, left])
        .map(|(side, v)| (side.key().to_string(), SettingValue::from(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(settings: &Settings, group: &str, side: &str) -> Option<String> {
        settings
            .get(group)
            .and_then(SettingValue::as_map)
            .and_then(|m| m.get(side))
            .and_then(SettingValue::as_str)
            .map(str::to_string)
    }

    #[test]
    fn test_typography_grouped() {
        let settings = translate_style("color: #333; font-size: 18px; font-weight: 700");
        let typo = settings[TYPOGRAPHY].as_map().expect("typography");
        assert_eq!(typo["font-size"].as_str(), Some("18px"));
        assert_eq!(typo["font-weight"].as_str(), Some("700"));
        let color = typo["color"].as_map().expect("color map");
        assert_eq!(color["raw"].as_str(), Some("#333"));
    }

    #[test]
    fn test_padding_two_values() {
        let settings = translate_style("padding: 10px 20px");
        assert_eq!(side(&settings, PADDING, "top").as_deref(), Some("10px"));
        assert_eq!(side(&settings, PADDING, "right").as_deref(), Some("20px"));
        assert_eq!(side(&settings, PADDING, "bottom").as_deref(), Some("10px"));
        assert_eq!(side(&settings, PADDING, "left").as_deref(), Some("20px"));
    }

    #[test]
    fn test_shorthand_counts() {
        let one = expand_box_shorthand("4px");
        assert!(one.values().all(|v| v.as_str() == Some("4px")));

        let three = expand_box_shorthand("1px 2px 3px");
        assert_eq!(three["top"].as_str(), Some("1px"));
        assert_eq!(three["right"].as_str(), Some("2px"));
        assert_eq!(three["bottom"].as_str(), Some("3px"));
        assert_eq!(three["left"].as_str(), Some("2px"));

        let four = expand_box_shorthand("1px 2px 3px 4px");
        assert_eq!(four["left"].as_str(), Some("4px"));

        let five = expand_box_shorthand("1px 2px 3px 4px 5px");
        assert_eq!(five["top"].as_str(), Some("1px 2px 3px 4px 5px"));
    }

    #[test]
    fn test_longhand_keeps_other_sides() {
        let settings = translate_style("margin: 0 auto; margin-top: 2rem");
        assert_eq!(side(&settings, MARGIN, "top").as_deref(), Some("2rem"));
        assert_eq!(side(&settings, MARGIN, "right").as_deref(), Some("auto"));
        assert_eq!(side(&settings, MARGIN, "bottom").as_deref(), Some("0"));
    }

    #[test]
    fn test_longhand_only_sets_one_side() {
        let settings = translate_style("padding-left: 8px");
        let padding = settings[PADDING].as_map().expect("padding");
        assert_eq!(padding.len(), 1);
        assert_eq!(padding["left"].as_str(), Some("8px"));
    }

    #[test]
    fn test_flat_and_background() {
        let settings = translate_style(
            "display: flex; gap: 1rem; background-color: red; z-index: 3; opacity: .5",
        );
        assert_eq!(settings["_display"].as_str(), Some("flex"));
        assert_eq!(settings["_gap"].as_str(), Some("1rem"));
        assert_eq!(settings["_zIndex"].as_str(), Some("3"));
        assert_eq!(settings["_opacity"].as_str(), Some(".5"));
        let bg = settings[BACKGROUND].as_map().expect("background");
        let color = bg["color"].as_map().expect("color");
        assert_eq!(color["raw"].as_str(), Some("red"));
    }

    #[test]
    fn test_skips_malformed_and_unknown() {
        let settings = translate_style(";;  ; nonsense; cursor: pointer; width : 50% ;");
        assert_eq!(settings.len(), 1);
        assert_eq!(settings["_width"].as_str(), Some("50%"));
    }

    #[test]
    fn test_empty_input() {
        assert!(translate_style("").is_empty());
    }
}
