/// Human-readable names for KiCad canonical layer names.
const LAYER_NAMES: &[(&str, &str)] = &[
    ("F.SilkS", "Top Silkscreen"),
    ("B.SilkS", "Bottom Silkscreen"),
    ("F.Mask", "Top Soldermask"),
    ("B.Mask", "Bottom Soldermask"),
    ("F.Paste", "Top Solder Paste"),
    ("B.Paste", "Bottom Solder Paste"),
    ("F.Cu", "Top Copper"),
    ("B.Cu", "Bottom Copper"),
    ("F.Adhes", "Top Adhesive"),
    ("B.Adhes", "Bottom Adhesive"),
    ("F.CrtYd", "Top Courtyard"),
    ("B.CrtYd", "Bottom Courtyard"),
    ("F.Fab", "Top Fabrication"),
    ("B.Fab", "Bottom Fabrication"),
    ("Edge.Cuts", "Board Outline"),
    ("Dwgs.User", "User Drawings"),
    ("Cmts.User", "User Comments"),
];

pub fn display_name(layer_name: &str) -> String {
    if let Some((_, pretty)) = LAYER_NAMES.iter().find(|(name, _)| *name == layer_name) {
        return pretty.to_string();
    }

    if let Some(number) = layer_name
        .strip_prefix("In")
        .and_then(|rest| rest.strip_suffix(".Cu"))
    {
        return format!("Inner Copper Layer {}", number);
    }

    if layer_name.to_lowercase().contains("dielectric") {
        let digits: String = layer_name
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        if !digits.is_empty() {
            return format!("Dielectric {}", digits);
        }
    }

    layer_name.to_string()
}
