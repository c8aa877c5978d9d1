//! Export a board's stackup and print a short summary.

use stackup_exporter::export::names::display_name;
use stackup_exporter::prelude::*;
use std::path::Path;

fn main() -> Result<(), StackupError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/four_layer.kicad_pcb".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example export_stackup [path/to/board.kicad_pcb] [output.json]");
        std::process::exit(1);
    }
    let output = std::env::args().nth(2);

    let report = StackupExporter::export_file(
        path,
        output.as_deref().map(Path::new),
        &ExportOptions::default(),
    )?;

    let board = &report.document.board;
    println!("Stackup for: {}", report.document.meta.board_name);
    let finish = if board.copper_finish.is_empty() {
        "N/A"
    } else {
        board.copper_finish.as_str()
    };
    println!(
        "  {} mm, {} copper layers, finish {}",
        board.thickness_mm, board.copper_layers, finish
    );
    println!();

    for layer in &report.document.layers {
        let line = format!(
            "  {:<24} {:<12} {:>8} mm",
            display_name(&layer.name),
            layer.kind.as_str(),
            layer.thickness.mm
        );
        match layer.dielectric_constant {
            Some(er) => println!("{}  er={}", line, er),
            None => println!("{}", line),
        }
    }

    println!();
    println!("JSON: {}", report.paths.json.display());
    println!("HTML: {}", report.paths.html.display());
    Ok(())
}
