//! JSON serialization of a [`StackupDocument`].
//!
//! The key layout is fixed by the wire structs below; field order in the
//! structs is the order in the output.

use serde::{Deserialize, Serialize};

use crate::parser::schema::{
    BoardSettings, DocumentMeta, StackupDocument, StackupLayer, Thickness,
};

#[derive(Debug, Serialize, Deserialize)]
struct JsonDocument {
    meta: JsonMeta,
    board: JsonBoard,
    layers: Vec<JsonLayer>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonMeta {
    board_name: String,
    exported_at: Option<String>,
    generator: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonBoard {
    thickness_mm: f64,
    #[serde(default)]
    stackup_thickness_mm: f64,
    copper_layers: u32,
    copper_finish: String,
    edge_connector: bool,
    #[serde(default)]
    edge_connector_type: Option<String>,
    castellated_pads: bool,
    edge_plating: bool,
    #[serde(default)]
    impedance_controlled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonLayer {
    name: String,
    #[serde(rename = "type")]
    layer_type: String,
    thickness_mm: f64,
    thickness_mil: f64,
    thickness_um: f64,
    material: String,
    dielectric_constant: Option<f64>,
    loss_tangent: Option<f64>,
    color: String,
}

impl From<&StackupDocument> for JsonDocument {
    fn from(doc: &StackupDocument) -> Self {
        let board = &doc.board;
        Self {
            meta: JsonMeta {
                board_name: doc.meta.board_name.clone(),
                exported_at: doc.meta.exported_at.clone(),
                generator: doc.meta.generator.clone(),
            },
            board: JsonBoard {
                thickness_mm: board.thickness_mm,
                stackup_thickness_mm: board.stackup_thickness_mm,
                copper_layers: board.copper_layers,
                copper_finish: board.copper_finish.clone(),
                edge_connector: board.edge_connector,
                edge_connector_type: board.edge_connector_type.clone(),
                castellated_pads: board.castellated_pads,
                edge_plating: board.edge_plating,
                impedance_controlled: board.impedance_controlled,
            },
            layers: doc.layers.iter().map(JsonLayer::from).collect(),
        }
    }
}

impl From<&StackupLayer> for JsonLayer {
    fn from(layer: &StackupLayer) -> Self {
        Self {
            name: layer.name.clone(),
            layer_type: layer.layer_type.clone(),
            thickness_mm: layer.thickness.mm,
            thickness_mil: layer.thickness.mil(),
            thickness_um: layer.thickness.um(),
            material: layer.material.clone(),
            dielectric_constant: layer.dielectric_constant,
            loss_tangent: layer.loss_tangent,
            color: layer.color.clone(),
        }
    }
}

impl From<JsonDocument> for StackupDocument {
    fn from(json: JsonDocument) -> Self {
        let layers = json
            .layers
            .into_iter()
            .map(|l| {
                let mut layer = StackupLayer::new(l.name, l.layer_type);
                layer.thickness = Thickness::from_mm(l.thickness_mm);
                layer.material = l.material;
                layer.dielectric_constant = l.dielectric_constant;
                layer.loss_tangent = l.loss_tangent;
                layer.color = l.color;
                layer
            })
            .collect();

        StackupDocument {
            meta: DocumentMeta {
                board_name: json.meta.board_name,
                exported_at: json.meta.exported_at,
                generator: json.meta.generator,
            },
            board: BoardSettings {
                thickness_mm: json.board.thickness_mm,
                stackup_thickness_mm: json.board.stackup_thickness_mm,
                copper_layers: json.board.copper_layers,
                copper_finish: json.board.copper_finish,
                edge_connector: json.board.edge_connector,
                edge_connector_type: json.board.edge_connector_type,
                castellated_pads: json.board.castellated_pads,
                edge_plating: json.board.edge_plating,
                impedance_controlled: json.board.impedance_controlled,
            },
            layers,
        }
    }
}

/// Serialize a document as pretty-printed JSON with a trailing newline.
pub fn to_json(doc: &StackupDocument) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(&JsonDocument::from(doc))?;
    text.push('\n');
    Ok(text)
}

/// Read a document previously written by [`to_json`].
pub fn from_json(text: &str) -> Result<StackupDocument, serde_json::Error> {
    let json: JsonDocument = serde_json::from_str(text)?;
    Ok(json.into())
}
