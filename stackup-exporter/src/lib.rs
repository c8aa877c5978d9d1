//! Stackup Exporter - KiCad PCB stackup to JSON and HTML
//!
//! This library reads the physical stackup (layer thicknesses, materials,
//! copper finish, dielectric properties) from a `.kicad_pcb` file and renders
//! it as a JSON document plus a static, print-ready HTML report.
//!
//! # Quick Start
//!
//! ```no_run
//! use stackup_exporter::{ExportOptions, StackupExporter};
//! use std::path::Path;
//!
//! let report = StackupExporter::export_file(
//!     Path::new("board.kicad_pcb"),
//!     None,
//!     &ExportOptions::default(),
//! ).unwrap();
//!
//! println!("{} layers -> {}", report.layer_count(), report.paths.json.display());
//! ```
//!
//! # Entry points
//!
//! - **Command line**: [`StackupExporter::export_file`] converts a board on disk
//! - **Host plugin**: [`plugin::run_plugin`] drives the export through a [`plugin::Host`]
//! - **Pieces**: [`parse_board`], [`export::to_json`] and [`export::render_html`]
//!   can be used on their own

pub mod core;
pub mod export;
pub mod parser;
pub mod plugin;
pub mod source;

// Re-export main types
pub use crate::core::{
    default_file_name, ExportOptions, ExportReport, OutputPaths, StackupError, StackupExporter,
};
pub use parser::schema::{
    BoardSettings, DocumentMeta, LayerKind, StackupDocument, StackupLayer, Thickness,
};
pub use parser::stackup::StackupParser;
pub use plugin::{run_plugin, Host, Notice, PluginOutcome};
pub use source::{BoardSource, FileBoard, HostBoard};

/// Parse the stackup of a board file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<StackupDocument, StackupError> {
    StackupExporter::load(&FileBoard::open(path)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BoardSource, ExportOptions, ExportReport, LayerKind, StackupDocument, StackupError,
        StackupExporter, StackupLayer,
    };
}
