//! KiCad board stackup parser
//!
//! Reads the physical stackup that KiCad stores under `(setup (stackup ...))`
//! in a `.kicad_pcb` file:
//!
//! ```text
//! (kicad_pcb
//!   (general (thickness 1.6))
//!   (layers (0 "F.Cu" signal) (2 "B.Cu" signal) ...)
//!   (setup
//!     (stackup
//!       (layer "F.Mask" (type "Top Solder Mask") (color "Green") (thickness 0.01))
//!       (layer "F.Cu" (type "copper") (thickness 0.035))
//!       (layer "dielectric 1" (type "core") (thickness 1.51) (material "FR4")
//!         (epsilon_r 4.5) (loss_tangent 0.02))
//!       ...
//!       (copper_finish "ENIG")
//!       (dielectric_constraints no)
//!       (edge_connector bevelled)
//!       (castellated_pads yes)
//!       (edge_plating yes))))
//! ```
//!
//! Parsing is best effort. Only a file that is not a KiCad board at all is
//! rejected; missing or unreadable fields fall back to defaults.

use thiserror::Error;

use crate::parser::schema::*;
use crate::parser::sexp::{ParseError, SExp, SExpParser};

#[derive(Debug, Error)]
pub enum StackupParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("Invalid board format: {0}")]
    InvalidFormat(String),
}

pub struct StackupParser;

impl StackupParser {
    /// Parse board text. `board_name` is recorded in the document metadata.
    pub fn parse_str(content: &str, board_name: &str) -> Result<StackupDocument, StackupParseError> {
        let root = SExpParser::new(content).parse()?;

        match root.tag() {
            Some("kicad_pcb") => {}
            Some(other) => {
                return Err(StackupParseError::InvalidFormat(format!(
                    "Expected kicad_pcb, found {}",
                    other
                )))
            }
            None => {
                return Err(StackupParseError::InvalidFormat(
                    "Expected kicad_pcb root".to_string(),
                ))
            }
        }

        let Some(stackup) = root.find("setup").and_then(|setup| setup.find("stackup")) else {
            tracing::warn!("{}: no stackup section, exporting an empty stackup", board_name);
            let mut doc = StackupDocument::empty(board_name);
            if let Some(thickness) = Self::general_thickness(&root) {
                doc.board.thickness_mm = thickness;
            }
            return Ok(doc);
        };

        let layers: Vec<StackupLayer> = stackup
            .find_all("layer")
            .filter_map(Self::parse_layer)
            .filter(|layer| {
                if layer.kind == LayerKind::SolderPaste {
                    tracing::debug!("Skipping solder paste layer {}", layer.name);
                    false
                } else {
                    true
                }
            })
            .collect();

        let board = Self::parse_board_settings(&root, stackup, &layers);

        Ok(StackupDocument {
            meta: DocumentMeta::new(board_name),
            board,
            layers,
        })
    }

    fn parse_layer(sexp: &SExp) -> Option<StackupLayer> {
        let Some(name) = sexp.atom_at(1) else {
            tracing::debug!("Stackup layer entry without a name, skipping");
            return None;
        };

        let layer_type = sexp.value("type").unwrap_or_default();
        if layer_type.is_empty() {
            tracing::debug!("Layer {} has no type", name);
        }

        let mut layer = StackupLayer::new(name, layer_type);
        layer.thickness = Thickness::from_mm(Self::float_field(sexp, name, "thickness").unwrap_or(0.0));
        layer.material = sexp.value("material").unwrap_or_default().to_string();
        layer.dielectric_constant = Self::float_field(sexp, name, "epsilon_r");
        layer.loss_tangent = Self::float_field(sexp, name, "loss_tangent");
        layer.color = sexp.value("color").unwrap_or_default().to_string();

        Some(layer)
    }

    /// Numeric field of a layer. Values that do not parse count as missing.
    fn float_field(sexp: &SExp, layer: &str, key: &str) -> Option<f64> {
        let raw = sexp.value(key)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                tracing::debug!("Layer {}: ignoring unparseable {} value {:?}", layer, key, raw);
                None
            }
        }
    }

    fn parse_board_settings(root: &SExp, stackup: &SExp, layers: &[StackupLayer]) -> BoardSettings {
        let stackup_thickness_mm = round4(layers.iter().map(|l| l.thickness.mm).sum());

        let edge_connector_type = stackup
            .value("edge_connector")
            .filter(|v| *v != "no")
            .map(str::to_string);

        let copper_layers = Self::declared_copper_layers(root)
            .unwrap_or_else(|| layers.iter().filter(|l| l.is_copper()).count() as u32);

        BoardSettings {
            thickness_mm: Self::general_thickness(root).unwrap_or(stackup_thickness_mm),
            stackup_thickness_mm,
            copper_layers,
            copper_finish: stackup.value("copper_finish").unwrap_or_default().to_string(),
            edge_connector: edge_connector_type.is_some(),
            edge_connector_type,
            castellated_pads: Self::yes(stackup, "castellated_pads"),
            edge_plating: Self::yes(stackup, "edge_plating"),
            impedance_controlled: Self::yes(stackup, "dielectric_constraints"),
        }
    }

    fn general_thickness(root: &SExp) -> Option<f64> {
        let raw = root.find("general")?.value("thickness")?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                tracing::debug!("Ignoring unparseable board thickness {:?}", raw);
                None
            }
        }
    }

    /// Count of copper layers in the board's `(layers ...)` table.
    fn declared_copper_layers(root: &SExp) -> Option<u32> {
        let table = root.find("layers")?;
        let count = table
            .children()
            .filter_map(|entry| entry.atom_at(1))
            .filter(|name| name.ends_with(".Cu"))
            .count();
        Some(count as u32)
    }

    fn yes(sexp: &SExp, key: &str) -> bool {
        sexp.value(key) == Some("yes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LAYER: &str = r#"(kicad_pcb (version 20240108) (generator "pcbnew")
  (general (thickness 1.6) (legacy_teardrops no))
  (layers (0 "F.Cu" signal) (2 "B.Cu" signal) (9 "F.Adhes" user "F.Adhesive"))
  (setup
    (stackup
      (layer "F.SilkS" (type "Top Silk Screen") (color "White"))
      (layer "F.Paste" (type "Top Solder Paste"))
      (layer "F.Mask" (type "Top Solder Mask") (color "Green") (thickness 0.01))
      (layer "F.Cu" (type "copper") (thickness 0.035))
      (layer "dielectric 1" (type "core") (thickness 1.51) (material "FR4") (epsilon_r 4.5) (loss_tangent 0.02))
      (layer "B.Cu" (type "copper") (thickness 0.035))
      (layer "B.Mask" (type "Bottom Solder Mask") (thickness 0.01))
      (copper_finish "ENIG")
      (dielectric_constraints no)
      (edge_connector bevelled)
      (castellated_pads yes)
      (edge_plating no))
    (pad_to_mask_clearance 0))
  (net 0 ""))
"#;

    #[test]
    fn test_layers_in_source_order_without_paste() {
        let doc = StackupParser::parse_str(TWO_LAYER, "two.kicad_pcb").unwrap();
        let names: Vec<_> = doc.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["F.SilkS", "F.Mask", "F.Cu", "dielectric 1", "B.Cu", "B.Mask"]
        );
    }

    #[test]
    fn test_layer_fields() {
        let doc = StackupParser::parse_str(TWO_LAYER, "two.kicad_pcb").unwrap();
        let core = &doc.layers[3];
        assert_eq!(core.layer_type, "core");
        assert_eq!(core.kind, LayerKind::Dielectric);
        assert_eq!(core.thickness.mm, 1.51);
        assert_eq!(core.material, "FR4");
        assert_eq!(core.dielectric_constant, Some(4.5));
        assert_eq!(core.loss_tangent, Some(0.02));

        let silk = &doc.layers[0];
        assert_eq!(silk.color, "White");
        assert!(silk.thickness.is_zero());
        assert_eq!(silk.dielectric_constant, None);
    }

    #[test]
    fn test_board_settings() {
        let doc = StackupParser::parse_str(TWO_LAYER, "two.kicad_pcb").unwrap();
        let board = &doc.board;
        assert_eq!(board.thickness_mm, 1.6);
        assert_eq!(board.stackup_thickness_mm, 1.6);
        assert_eq!(board.copper_layers, 2);
        assert_eq!(board.copper_finish, "ENIG");
        assert!(board.edge_connector);
        assert_eq!(board.edge_connector_type.as_deref(), Some("bevelled"));
        assert!(board.castellated_pads);
        assert!(!board.edge_plating);
        assert!(!board.impedance_controlled);
        assert_eq!(doc.meta.board_name, "two.kicad_pcb");
        assert_eq!(doc.meta.exported_at, None);
    }

    #[test]
    fn test_missing_stackup_is_empty_document() {
        let doc = StackupParser::parse_str(
            "(kicad_pcb (general (thickness 0.8)) (setup (pad_to_mask_clearance 0)))",
            "bare.kicad_pcb",
        )
        .unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.board.thickness_mm, 0.8);
        assert_eq!(doc.board.copper_layers, 0);
        assert_eq!(doc.board.copper_finish, "");
    }

    #[test]
    fn test_unparseable_numbers_default() {
        let doc = StackupParser::parse_str(
            r#"(kicad_pcb (setup (stackup
                (layer "dielectric 1" (type "prepreg") (thickness abc) (epsilon_r nope)))))"#,
            "odd.kicad_pcb",
        )
        .unwrap();
        let layer = &doc.layers[0];
        assert!(layer.thickness.is_zero());
        assert_eq!(layer.dielectric_constant, None);
        assert_eq!(doc.board.thickness_mm, 0.0);
    }

    #[test]
    fn test_non_finite_board_thickness_falls_back_to_sum() {
        for raw in ["nan", "inf", "-inf", "thick"] {
            let text = format!(
                r#"(kicad_pcb (general (thickness {})) (setup (stackup
                    (layer "F.Cu" (type "copper") (thickness 0.035))
                    (layer "dielectric 1" (type "core") (thickness 1.5)))))"#,
                raw
            );
            let doc = StackupParser::parse_str(&text, "odd.kicad_pcb").unwrap();
            assert_eq!(doc.board.thickness_mm, 1.535, "thickness {}", raw);
        }

        let doc = StackupParser::parse_str(
            "(kicad_pcb (general (thickness nan)))",
            "bare.kicad_pcb",
        )
        .unwrap();
        assert_eq!(doc.board.thickness_mm, 0.0);
    }

    #[test]
    fn test_copper_count_falls_back_to_stackup() {
        let doc = StackupParser::parse_str(
            r#"(kicad_pcb (setup (stackup
                (layer "F.Cu" (type "copper") (thickness 0.035))
                (layer "In1.Cu" (type "copper") (thickness 0.0175))
                (layer "B.Cu" (type "copper") (thickness 0.035)))))"#,
            "noltable.kicad_pcb",
        )
        .unwrap();
        assert_eq!(doc.board.copper_layers, 3);
        assert_eq!(doc.board.thickness_mm, 0.0875);
    }

    #[test]
    fn test_duplicate_layers_are_kept() {
        let doc = StackupParser::parse_str(
            r#"(kicad_pcb (setup (stackup
                (layer "F.Cu" (type "copper"))
                (layer "F.Cu" (type "copper")))))"#,
            "dup.kicad_pcb",
        )
        .unwrap();
        assert_eq!(doc.layers.len(), 2);
    }

    #[test]
    fn test_rejects_non_board_root() {
        let err = StackupParser::parse_str("(kicad_sch (version 1))", "x.kicad_sch").unwrap_err();
        assert!(matches!(err, StackupParseError::InvalidFormat(_)));

        let err = StackupParser::parse_str("not a board", "x.txt").unwrap_err();
        assert!(matches!(err, StackupParseError::InvalidFormat(_)));

        let err = StackupParser::parse_str("(kicad_pcb (setup", "x.kicad_pcb").unwrap_err();
        assert!(matches!(err, StackupParseError::SExpParse(_)));
    }
}
