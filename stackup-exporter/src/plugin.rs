//! Plugin flow: export the board a host design tool has open.

use std::path::{Path, PathBuf};

use crate::core::{ExportOptions, ExportReport, OutputPaths, StackupError, StackupExporter};
use crate::source::BoardSource;

/// Message shown to the user by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

/// What the plugin flow needs from a host environment.
pub trait Host {
    type Board: BoardSource;

    /// The board the host currently has loaded, if any.
    fn current_board(&self) -> Result<Option<Self::Board>, StackupError>;

    /// Ask where to save the JSON document. `None` means the user cancelled.
    fn prompt_output_path(&self, suggested: &Path) -> Result<Option<PathBuf>, StackupError>;

    fn notify(&self, notice: Notice);
}

#[derive(Debug)]
pub enum PluginOutcome {
    NoBoard,
    Cancelled,
    Exported(ExportReport),
}

/// Run the export against the host's current board.
///
/// Nothing is written unless the user confirms an output path. Failures are
/// reported through [`Host::notify`] and returned.
pub fn run_plugin<H: Host>(host: &H, options: &ExportOptions) -> Result<PluginOutcome, StackupError> {
    let board = match host.current_board() {
        Ok(Some(board)) => board,
        Ok(None) => {
            host.notify(Notice::Error("No PCB loaded!".to_string()));
            return Ok(PluginOutcome::NoBoard);
        }
        Err(e) => {
            host.notify(Notice::Error(e.to_string()));
            return Err(e);
        }
    };

    let doc = StackupExporter::load(&board).inspect_err(|e| {
        host.notify(Notice::Error(format!("Error parsing PCB file:\n{}", e)));
    })?;

    if doc.is_empty() {
        host.notify(Notice::Warning(
            "No stackup information found in PCB file.\n\
             Define the physical stackup in File > Board Setup > Physical Stackup.\n\
             Only board settings will be exported."
                .to_string(),
        ));
    }

    let answer = host
        .prompt_output_path(&board.suggested_output())
        .inspect_err(|e| host.notify(Notice::Error(e.to_string())))?;
    let Some(chosen) = answer else {
        tracing::debug!("Export cancelled by user");
        return Ok(PluginOutcome::Cancelled);
    };

    let paths = OutputPaths::for_choice(Path::new(&board.name()), &chosen);
    let report = StackupExporter::export_document(doc, &paths, options).inspect_err(|e| {
        host.notify(Notice::Error(format!("Error saving file:\n{}", e)));
    })?;

    host.notify(Notice::Info(format!(
        "Stackup exported successfully!\n\nJSON: {}\nHTML: {}",
        report.paths.json.display(),
        report.paths.html.display()
    )));
    Ok(PluginOutcome::Exported(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::HostBoard;
    use std::cell::RefCell;

    const BOARD: &str = r#"(kicad_pcb
        (layers (0 "F.Cu" signal) (2 "B.Cu" signal))
        (setup (stackup
            (layer "F.Cu" (type "copper") (thickness 0.035))
            (layer "dielectric 1" (type "core") (thickness 1.51) (material "FR4"))
            (layer "B.Cu" (type "copper") (thickness 0.035)))))"#;

    struct MockHost {
        board: Option<HostBoard>,
        answer: Option<PathBuf>,
        prompt_fails: bool,
        prompted_with: RefCell<Option<PathBuf>>,
        notices: RefCell<Vec<Notice>>,
    }

    impl MockHost {
        fn new(board: Option<HostBoard>, answer: Option<PathBuf>) -> Self {
            Self {
                board,
                answer,
                prompt_fails: false,
                prompted_with: RefCell::new(None),
                notices: RefCell::new(Vec::new()),
            }
        }

        fn failing_prompt(board: HostBoard) -> Self {
            Self {
                prompt_fails: true,
                ..Self::new(Some(board), None)
            }
        }
    }

    impl Host for MockHost {
        type Board = HostBoard;

        fn current_board(&self) -> Result<Option<HostBoard>, StackupError> {
            Ok(self.board.clone())
        }

        fn prompt_output_path(&self, suggested: &Path) -> Result<Option<PathBuf>, StackupError> {
            *self.prompted_with.borrow_mut() = Some(suggested.to_path_buf());
            if self.prompt_fails {
                return Err(StackupError::Other("Prompt failed: not a terminal".to_string()));
            }
            Ok(self.answer.clone())
        }

        fn notify(&self, notice: Notice) {
            self.notices.borrow_mut().push(notice);
        }
    }

    #[test]
    fn test_confirmed_export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.json");
        let board = HostBoard::new("main.kicad_pcb", BOARD).with_path(dir.path().join("main.kicad_pcb"));
        let host = MockHost::new(Some(board), Some(target.clone()));

        let outcome = run_plugin(&host, &ExportOptions::default()).unwrap();
        let PluginOutcome::Exported(report) = outcome else {
            panic!("expected export");
        };
        assert_eq!(report.layer_count(), 3);
        assert!(target.exists());
        assert!(dir.path().join("out.html").exists());
        assert_eq!(
            host.prompted_with.borrow().as_deref(),
            Some(dir.path().join("main_stackup.json").as_path())
        );
        assert!(matches!(host.notices.borrow().last(), Some(Notice::Info(_))));
    }

    #[test]
    fn test_cancel_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let board = HostBoard::new("main.kicad_pcb", BOARD).with_path(dir.path().join("main.kicad_pcb"));
        let host = MockHost::new(Some(board), None);

        let outcome = run_plugin(&host, &ExportOptions::default()).unwrap();
        assert!(matches!(outcome, PluginOutcome::Cancelled));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(host.notices.borrow().is_empty());
    }

    #[test]
    fn test_prompt_failure_is_reported() {
        let host = MockHost::failing_prompt(HostBoard::new("main.kicad_pcb", BOARD));

        assert!(run_plugin(&host, &ExportOptions::default()).is_err());
        assert_eq!(
            host.notices.borrow().as_slice(),
            &[Notice::Error("Prompt failed: not a terminal".to_string())]
        );
    }

    #[test]
    fn test_directory_answer_uses_board_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let host = MockHost::new(
            Some(HostBoard::new("main.kicad_pcb", BOARD)),
            Some(dir.path().to_path_buf()),
        );

        let outcome = run_plugin(&host, &ExportOptions::default()).unwrap();
        let PluginOutcome::Exported(report) = outcome else {
            panic!("expected export");
        };
        assert_eq!(report.paths.json, dir.path().join("main_stackup.json"));
        assert!(report.paths.json.exists());
        assert!(dir.path().join("main_stackup.html").exists());
    }

    #[test]
    fn test_no_board_reports_error() {
        let host = MockHost::new(None, Some(PathBuf::from("never.json")));
        let outcome = run_plugin(&host, &ExportOptions::default()).unwrap();
        assert!(matches!(outcome, PluginOutcome::NoBoard));
        assert!(host.prompted_with.borrow().is_none());
        assert_eq!(
            host.notices.borrow().as_slice(),
            &[Notice::Error("No PCB loaded!".to_string())]
        );
    }

    #[test]
    fn test_unparseable_board_is_reported() {
        let host = MockHost::new(
            Some(HostBoard::new("bad.kicad_pcb", "(kicad_sch)")),
            Some(PathBuf::from("never.json")),
        );
        assert!(run_plugin(&host, &ExportOptions::default()).is_err());
        assert!(host.prompted_with.borrow().is_none());
        assert!(matches!(host.notices.borrow().first(), Some(Notice::Error(_))));
    }

    #[test]
    fn test_board_without_stackup_warns_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bare.json");
        let host = MockHost::new(
            Some(HostBoard::new("bare.kicad_pcb", "(kicad_pcb (general (thickness 1.6)))")),
            Some(target.clone()),
        );

        let outcome = run_plugin(&host, &ExportOptions::default()).unwrap();
        assert!(matches!(outcome, PluginOutcome::Exported(_)));
        assert!(target.exists());
        assert!(matches!(host.notices.borrow().first(), Some(Notice::Warning(_))));
    }
}
