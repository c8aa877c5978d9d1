//! Stackup document model.
//!
//! A [`StackupDocument`] is built once per conversion by the parser and is
//! then only read: the JSON serializer and the HTML renderer both consume
//! the same value.

/// 1 mil = 0.0254 mm
pub const MM_PER_MIL: f64 = 0.0254;

/// Physical role of a stackup layer, derived from its KiCad type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Copper,
    Dielectric,
    Soldermask,
    Silkscreen,
    SolderPaste,
    Other,
}

impl LayerKind {
    /// Classify a KiCad stackup `type` value.
    ///
    /// KiCad writes `copper`, `core`, `prepreg`, `Top Solder Mask`,
    /// `Bottom Silk Screen`, `Top Solder Paste` and so on. The layer name is
    /// consulted only when the type is empty.
    pub fn classify(layer_type: &str, layer_name: &str) -> Self {
        let t = layer_type.to_lowercase();
        if t.is_empty() {
            return Self::from_layer_name(layer_name);
        }

        if t == "copper" {
            Self::Copper
        } else if t == "core" || t == "prepreg" || t.contains("dielectric") {
            Self::Dielectric
        } else if t.contains("paste") {
            Self::SolderPaste
        } else if t.contains("mask") {
            Self::Soldermask
        } else if t.contains("silk") {
            Self::Silkscreen
        } else {
            Self::Other
        }
    }

    fn from_layer_name(name: &str) -> Self {
        if name.ends_with(".Cu") {
            Self::Copper
        } else if name.ends_with(".Mask") {
            Self::Soldermask
        } else if name.ends_with(".SilkS") {
            Self::Silkscreen
        } else if name.ends_with(".Paste") {
            Self::SolderPaste
        } else if name.to_lowercase().starts_with("dielectric") {
            Self::Dielectric
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copper => "copper",
            Self::Dielectric => "dielectric",
            Self::Soldermask => "soldermask",
            Self::Silkscreen => "silkscreen",
            Self::SolderPaste => "solder_paste",
            Self::Other => "other",
        }
    }
}

/// Layer thickness as recorded in the board file (KiCad stores mm).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thickness {
    pub mm: f64,
}

impl Thickness {
    pub fn from_mm(mm: f64) -> Self {
        Self { mm }
    }

    pub fn is_zero(&self) -> bool {
        self.mm <= 0.0
    }

    /// Thickness in mils, rounded to two decimals.
    pub fn mil(&self) -> f64 {
        round2(self.mm / MM_PER_MIL)
    }

    /// Thickness in micrometres, rounded to two decimals.
    pub fn um(&self) -> f64 {
        round2(self.mm * 1000.0)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// One physical layer of the stackup, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct StackupLayer {
    /// KiCad layer name (`F.Cu`, `dielectric 1`, `F.Mask`, ...)
    pub name: String,
    /// Raw `type` string as written in the board file.
    pub layer_type: String,
    pub kind: LayerKind,
    pub thickness: Thickness,
    pub material: String,
    /// `epsilon_r`
    pub dielectric_constant: Option<f64>,
    pub loss_tangent: Option<f64>,
    pub color: String,
}

impl StackupLayer {
    pub fn new(name: impl Into<String>, layer_type: impl Into<String>) -> Self {
        let name = name.into();
        let layer_type = layer_type.into();
        let kind = LayerKind::classify(&layer_type, &name);
        Self {
            name,
            layer_type,
            kind,
            thickness: Thickness::default(),
            material: String::new(),
            dielectric_constant: None,
            loss_tangent: None,
            color: String::new(),
        }
    }

    pub fn is_copper(&self) -> bool {
        self.kind == LayerKind::Copper
    }

    pub fn is_dielectric(&self) -> bool {
        self.kind == LayerKind::Dielectric
    }
}

/// Board-level fabrication settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardSettings {
    /// Overall board thickness from `(general (thickness ..))`
    pub thickness_mm: f64,
    /// Sum of all stackup layer thicknesses
    pub stackup_thickness_mm: f64,
    pub copper_layers: u32,
    pub copper_finish: String,
    pub edge_connector: bool,
    /// `yes` or `bevelled` when an edge connector is declared
    pub edge_connector_type: Option<String>,
    pub castellated_pads: bool,
    pub edge_plating: bool,
    /// `dielectric_constraints`
    pub impedance_controlled: bool,
}

/// Where a document came from and when it was exported.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    pub board_name: String,
    pub exported_at: Option<String>,
    pub generator: String,
}

impl DocumentMeta {
    pub fn new(board_name: impl Into<String>) -> Self {
        Self {
            board_name: board_name.into(),
            exported_at: None,
            generator: generator_name(),
        }
    }
}

pub fn generator_name() -> String {
    format!("stackup-exporter {}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackupDocument {
    pub meta: DocumentMeta,
    pub board: BoardSettings,
    pub layers: Vec<StackupLayer>,
}

impl StackupDocument {
    /// Document for a board without any stackup definition.
    pub fn empty(board_name: impl Into<String>) -> Self {
        Self {
            meta: DocumentMeta::new(board_name),
            board: BoardSettings::default(),
            layers: Vec::new(),
        }
    }

    /// Same document stamped with an export time.
    pub fn with_export_time(mut self, exported_at: impl Into<String>) -> Self {
        self.meta.exported_at = Some(exported_at.into());
        self
    }

    pub fn copper_layers(&self) -> impl Iterator<Item = &StackupLayer> {
        self.layers.iter().filter(|l| l.is_copper())
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
