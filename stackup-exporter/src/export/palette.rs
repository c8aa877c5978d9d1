//! Display colors for stackup layers.
//!
//! Resolution order: the color recorded on the layer (hex code, named color,
//! or a dielectric material name), then the layer kind and material, then
//! [`DEFAULT_COLOR`].

use crate::parser::schema::{LayerKind, StackupLayer};

pub const DEFAULT_COLOR: &str = "#888888";

pub const COPPER: &str = "#d4af37";
pub const FR4: &str = "#d4c5a0";
pub const SOLDERMASK: &str = "#2d5016";
pub const SILKSCREEN: &str = "#f0f0f0";
pub const SOLDER_PASTE: &str = "#c0c0c0";

/// Named colors KiCad offers for mask and silkscreen.
const NAMED_COLORS: &[(&str, &str)] = &[
    ("purple", "#800080"),
    ("green", SOLDERMASK),
    ("red", "#8b0000"),
    ("blue", "#0000cd"),
    ("black", "#1a1a1a"),
    ("white", SILKSCREEN),
    ("yellow", "#ffd700"),
];

/// Substring of a lowercased material (or color) name to its natural color.
const MATERIALS: &[(&str, &str)] = &[
    ("ptfe", "#f5f5f0"),
    ("teflon", "#f5f5f0"),
    ("polyimide", "#cc7722"),
    ("kapton", "#cc7722"),
    ("phenolic", "#8b4513"),
    ("alumin", "#b0b0b0"),
    ("metal", "#b0b0b0"),
    ("fr4", FR4),
    ("fr-4", FR4),
];

/// Background color for a layer's segment in the stack diagram.
pub fn layer_color(layer: &StackupLayer) -> String {
    explicit_color(&layer.color)
        .unwrap_or_else(|| kind_color(layer.kind, &layer.material).to_string())
}

fn explicit_color(color: &str) -> Option<String> {
    if color.is_empty() {
        return None;
    }
    if color.starts_with('#') {
        return hex_color(color);
    }

    let lower = color.to_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .or_else(|| MATERIALS.iter().find(|(needle, _)| lower.contains(needle)))
        .map(|(_, hex)| hex.to_string())
}

/// `#RRGGBB`, or `#RRGGBBAA` with the alpha channel dropped.
fn hex_color(color: &str) -> Option<String> {
    let digits = &color[1..];
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        6 => Some(color.to_lowercase()),
        8 => Some(color[..7].to_lowercase()),
        _ => None,
    }
}

fn kind_color(kind: LayerKind, material: &str) -> &'static str {
    match kind {
        LayerKind::Copper => COPPER,
        LayerKind::Dielectric => dielectric_color(material),
        LayerKind::Soldermask => SOLDERMASK,
        LayerKind::Silkscreen => SILKSCREEN,
        LayerKind::SolderPaste => SOLDER_PASTE,
        LayerKind::Other => DEFAULT_COLOR,
    }
}

fn dielectric_color(material: &str) -> &'static str {
    let lower = material.to_lowercase();
    MATERIALS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hex)| *hex)
        .unwrap_or(FR4)
}

/// Whether dark text is needed on top of `hex` (perceived brightness > 200).
pub fn is_very_light(hex: &str) -> bool {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(f64::from)
            .unwrap_or(0.0)
    };
    let (r, g, b) = (channel(1..3), channel(3..5), channel(5..7));
    (r * 299.0 + g * 587.0 + b * 114.0) / 1000.0 > 200.0
}
