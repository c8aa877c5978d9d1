use minijinja::{context, Environment};
use serde::Serialize;

use crate::export::names::display_name;
use crate::export::palette;
use crate::parser::schema::{LayerKind, StackupDocument, StackupLayer};

const TEMPLATE_NAME: &str = "stackup.html";
const HTML_TEMPLATE: &str = include_str!("templates/stackup.html.jinja");
const CSS_STYLES: &str = include_str!("templates/style.css");

const MIN_SEGMENT_PX: f64 = 8.0;
const MAX_SEGMENT_PX: f64 = 120.0;
const SEGMENT_SCALE_PX: f64 = 180.0;

/// Renders a stackup as a standalone, print-ready HTML report.
pub struct HtmlRenderer {
    env: Environment<'static>,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        // The .html name turns on HTML auto-escaping for board-supplied text.
        env.add_template(TEMPLATE_NAME, HTML_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render `doc`. The report title defaults to the board name.
    pub fn render(&self, doc: &StackupDocument, title: Option<&str>) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(TEMPLATE_NAME)?;

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| doc.meta.board_name.clone());
        let board = BoardView::new(doc);
        let total_mm: f64 = doc.layers.iter().map(|l| l.thickness.mm).sum();
        let layers: Vec<LayerView> = doc
            .layers
            .iter()
            .map(|layer| LayerView::new(layer, total_mm))
            .collect();

        template.render(context! {
            title,
            board,
            layers,
            css_styles => CSS_STYLES,
            generator => doc.meta.generator,
            exported_at => doc.meta.exported_at,
        })
    }
}

/// Render with a one-off renderer.
pub fn render_html(doc: &StackupDocument) -> Result<String, minijinja::Error> {
    HtmlRenderer::new()?.render(doc, None)
}

#[derive(Serialize)]
struct BoardView {
    thickness: String,
    copper_layers: u32,
    copper_finish: String,
    total_layers: usize,
    impedance_controlled: &'static str,
    edge_connector: Option<String>,
    castellated_pads: &'static str,
    edge_plating: &'static str,
}

impl BoardView {
    fn new(doc: &StackupDocument) -> Self {
        let board = &doc.board;
        let copper_finish = if board.copper_finish.is_empty() {
            "N/A".to_string()
        } else {
            board.copper_finish.clone()
        };

        Self {
            thickness: format!("{} mm", board.thickness_mm),
            copper_layers: board.copper_layers,
            copper_finish,
            total_layers: doc.layers.len(),
            impedance_controlled: yes_no(board.impedance_controlled),
            edge_connector: board
                .edge_connector_type
                .as_deref()
                .filter(|_| board.edge_connector)
                .map(capitalize),
            castellated_pads: yes_no(board.castellated_pads),
            edge_plating: yes_no(board.edge_plating),
        }
    }
}

#[derive(Serialize)]
struct LayerView {
    name: String,
    source_name: String,
    layer_type: String,
    kind: &'static str,
    color: String,
    text_color: &'static str,
    height_px: String,
    thickness_full: Option<String>,
    material: String,
    source_color: String,
    dielectric_constant: Option<String>,
    loss_tangent: Option<String>,
    info_line: String,
    tooltip: String,
}

impl LayerView {
    fn new(layer: &StackupLayer, total_mm: f64) -> Self {
        let name = display_name(&layer.name);
        let color = palette::layer_color(layer);
        let text_color = if palette::is_very_light(&color) {
            "#000000"
        } else {
            "#ffffff"
        };

        let thickness = &layer.thickness;
        let (thickness_short, thickness_full) = if thickness.is_zero() {
            (None, None)
        } else {
            (
                Some(format!("{} mm ({} mils)", thickness.mm, thickness.mil())),
                Some(format!(
                    "{} mm ({} mils / {} \u{3bc}m)",
                    thickness.mm,
                    thickness.mil(),
                    thickness.um()
                )),
            )
        };

        let dielectric_constant = layer.dielectric_constant.map(|v| v.to_string());
        let loss_tangent = layer.loss_tangent.map(|v| v.to_string());

        // Mask and silkscreen colors are worth printing; dielectric "colors" are not.
        let show_color = !layer.color.is_empty()
            && matches!(layer.kind, LayerKind::Soldermask | LayerKind::Silkscreen);

        let mut info = Vec::new();
        info.extend(thickness_short.clone());
        if !layer.material.is_empty() {
            info.push(layer.material.clone());
        }
        if show_color {
            info.push(layer.color.clone());
        }

        let mut tooltip = vec![name.clone(), layer.layer_type.clone()];
        if !layer.material.is_empty() {
            tooltip.push(format!("Material: {}", layer.material));
        }
        if let Some(t) = &thickness_short {
            tooltip.push(format!("Thickness: {}", t));
        }
        if let Some(er) = &dielectric_constant {
            tooltip.push(format!("\u{3b5}r: {}", er));
        }
        if let Some(lt) = &loss_tangent {
            tooltip.push(format!("Loss Tangent: {}", lt));
        }

        Self {
            name,
            source_name: layer.name.clone(),
            layer_type: layer.layer_type.clone(),
            kind: layer.kind.as_str(),
            color,
            text_color,
            height_px: format!("{:.1}", segment_height(thickness.mm, total_mm)),
            thickness_full,
            material: layer.material.clone(),
            source_color: if layer.is_dielectric() {
                String::new()
            } else {
                layer.color.clone()
            },
            dielectric_constant,
            loss_tangent,
            info_line: info.join(" | "),
            tooltip: tooltip.join(" | "),
        }
    }
}

/// Segment height proportional to the layer's share of the stack.
fn segment_height(thickness_mm: f64, total_mm: f64) -> f64 {
    if total_mm > 0.0 && thickness_mm > 0.0 {
        (MIN_SEGMENT_PX + thickness_mm / total_mm * SEGMENT_SCALE_PX)
            .clamp(MIN_SEGMENT_PX, MAX_SEGMENT_PX)
    } else {
        MIN_SEGMENT_PX
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
