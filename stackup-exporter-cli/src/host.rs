//! Terminal host for plugin mode.
//!
//! KiCAD launches `stackup-exporter plugin` with the open board in
//! `KICAD_BOARD_FILE` (or `--board`). Without either, the single
//! `.kicad_pcb` in the working directory is used.

use inquire::{Confirm, InquireError, Text};
use stackup_exporter::{FileBoard, Host, Notice, StackupError};
use std::path::{Path, PathBuf};

pub struct TerminalHost {
    board: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl TerminalHost {
    pub fn new(board: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        Self { board, output }
    }
}

impl Host for TerminalHost {
    type Board = FileBoard;

    fn current_board(&self) -> Result<Option<FileBoard>, StackupError> {
        let path = match &self.board {
            Some(path) => Some(path.clone()),
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| StackupError::Other(format!("Cannot read working directory: {}", e)))?;
                discover_board(&cwd)?
            }
        };

        match path {
            Some(path) => {
                tracing::debug!("Using board {}", path.display());
                FileBoard::open(path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn prompt_output_path(&self, suggested: &Path) -> Result<Option<PathBuf>, StackupError> {
        if let Some(output) = &self.output {
            return Ok(Some(output.clone()));
        }

        let default = suggested.display().to_string();
        let answer = Text::new("Save stackup JSON to:")
            .with_default(&default)
            .with_help_message("The HTML report is written next to it. Esc to cancel.")
            .prompt();

        let path = match answer {
            Ok(text) => PathBuf::from(text.trim()),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(None)
            }
            Err(e) => return Err(StackupError::Other(format!("Prompt failed: {}", e))),
        };

        if path.exists() {
            let overwrite = Confirm::new(&format!("{} exists. Overwrite?", path.display()))
                .with_default(false)
                .prompt();
            match overwrite {
                Ok(true) => {}
                Ok(false)
                | Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(None)
                }
                Err(e) => return Err(StackupError::Other(format!("Prompt failed: {}", e))),
            }
        }

        Ok(Some(path))
    }

    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Info(message) => println!("{}", message),
            Notice::Warning(message) => eprintln!("Warning: {}", message),
            Notice::Error(message) => eprintln!("Error: {}", message),
        }
    }
}

/// The only `.kicad_pcb` directly inside `dir`, if there is exactly one.
fn discover_board(dir: &Path) -> Result<Option<PathBuf>, StackupError> {
    let entries = std::fs::read_dir(dir).map_err(|source| StackupError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut boards: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("kicad_pcb")
        })
        .collect();

    match boards.len() {
        0 => Ok(None),
        1 => Ok(boards.pop()),
        n => Err(StackupError::Other(format!(
            "Found {} .kicad_pcb files in {}; pass --board to pick one",
            n,
            dir.display()
        ))),
    }
}
