//! Conversion pipeline shared by the plugin and command-line entry points.
//! No host or terminal dependencies.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::export::{from_json, to_json, HtmlRenderer};
use crate::parser::schema::StackupDocument;
use crate::parser::stackup::{StackupParseError, StackupParser};
use crate::source::{BoardSource, FileBoard};

#[derive(Debug, thiserror::Error)]
pub enum StackupError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTML render error: {0}")]
    Render(#[from] minijinja::Error),
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

impl From<StackupParseError> for StackupError {
    fn from(e: StackupParseError) -> Self {
        StackupError::Parse(e.to_string())
    }
}

/// Options for an export run (CLI or plugin).
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Stamp `meta.exported_at` with the local time.
    pub timestamp: bool,
    /// HTML report title; the board file name when unset.
    pub title: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            timestamp: true,
            title: None,
        }
    }
}

/// Destination of the two output documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

impl OutputPaths {
    /// HTML report sits next to the JSON file with the same stem.
    pub fn from_json_path(path: &Path) -> Self {
        let json = if path.extension().and_then(|e| e.to_str()) == Some("html") {
            path.with_extension("json")
        } else {
            path.to_path_buf()
        };
        let html = json.with_extension("html");
        Self { json, html }
    }

    /// Resolve the outputs for `input`.
    ///
    /// No output: `<stem>_stackup.json` next to the input. An existing
    /// directory: the same file name inside it. Anything else is taken as
    /// the JSON path.
    pub fn resolve(input: &Path, output: Option<&Path>) -> Self {
        match output {
            Some(chosen) => Self::for_choice(input, chosen),
            None => Self::from_json_path(&input.with_file_name(default_file_name(input))),
        }
    }

    /// Outputs for a user-chosen path. An existing directory gets the
    /// default file name for `board` inside it.
    pub fn for_choice(board: &Path, chosen: &Path) -> Self {
        if chosen.is_dir() {
            Self::from_json_path(&chosen.join(default_file_name(board)))
        } else {
            Self::from_json_path(chosen)
        }
    }
}

/// `board.kicad_pcb` -> `board_stackup.json`
pub fn default_file_name(board: &Path) -> String {
    let stem = board
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "board".to_string());
    format!("{}_stackup.json", stem)
}

/// Result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub paths: OutputPaths,
    pub document: StackupDocument,
}

impl ExportReport {
    pub fn layer_count(&self) -> usize {
        self.document.layers.len()
    }
}

/// Conversion API used by both the plugin flow and the CLI.
pub struct StackupExporter;

impl StackupExporter {
    /// Read and parse a board from any source.
    pub fn load<S: BoardSource + ?Sized>(source: &S) -> Result<StackupDocument, StackupError> {
        let content = source.read()?;
        let doc = StackupParser::parse_str(&content, &source.name())?;
        tracing::debug!(
            "Parsed {} stackup layers from {}",
            doc.layers.len(),
            doc.meta.board_name
        );
        Ok(doc)
    }

    /// Convert a board file on disk. Fails before writing anything when the
    /// input is missing or is not a KiCad board.
    pub fn export_file(
        input: &Path,
        output: Option<&Path>,
        options: &ExportOptions,
    ) -> Result<ExportReport, StackupError> {
        let board = FileBoard::open(input)?;
        let doc = Self::load(&board)?;
        let paths = OutputPaths::resolve(input, output);
        Self::export_document(doc, &paths, options)
    }

    /// Serialize and render `doc`, then write both documents into place.
    pub fn export_document(
        doc: StackupDocument,
        paths: &OutputPaths,
        options: &ExportOptions,
    ) -> Result<ExportReport, StackupError> {
        let doc = if options.timestamp {
            doc.with_export_time(export_timestamp())
        } else {
            doc
        };

        let json = to_json(&doc)?;
        let html = HtmlRenderer::new()?.render(&doc, options.title.as_deref())?;

        write_atomically(&[(&paths.json, json.as_str()), (&paths.html, html.as_str())])?;
        tracing::info!(
            "Wrote {} and {}",
            paths.json.display(),
            paths.html.display()
        );

        Ok(ExportReport {
            paths: paths.clone(),
            document: doc,
        })
    }

    /// Regenerate the HTML report from an exported JSON document.
    pub fn render_json_file(
        json_path: &Path,
        output: Option<&Path>,
        options: &ExportOptions,
    ) -> Result<PathBuf, StackupError> {
        let text = read_existing(json_path)?;
        let doc = from_json(&text)?;
        let html_path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| json_path.with_extension("html"));

        let html = HtmlRenderer::new()?.render(&doc, options.title.as_deref())?;
        write_atomically(&[(&html_path, html.as_str())])?;
        tracing::info!("Wrote {}", html_path.display());
        Ok(html_path)
    }
}

fn export_timestamp() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

pub(crate) fn read_existing(path: &Path) -> Result<String, StackupError> {
    if !path.is_file() {
        return Err(StackupError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| StackupError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every file or none of them.
///
/// Contents are staged in temp files inside each destination directory and
/// then persisted in order. Destinations that are directories are rejected
/// before anything is moved. If a persist still fails, files already moved
/// into place by this call are restored to their previous contents, or
/// removed when they did not exist before.
fn write_atomically(files: &[(&Path, &str)]) -> Result<(), StackupError> {
    if let Some((path, _)) = files.iter().find(|(path, _)| path.is_dir()) {
        return Err(StackupError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::other("destination is a directory"),
        });
    }

    let mut staged = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let write_err = |source| StackupError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".stackup-export.")
            .tempfile_in(dir)
            .map_err(write_err)?;
        tmp.write_all(contents.as_bytes()).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;

        let previous = if path.is_file() {
            Some(std::fs::read(path).map_err(write_err)?)
        } else {
            None
        };
        staged.push((tmp, *path, previous));
    }

    let mut persisted: Vec<(&Path, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (tmp, path, previous) in staged {
        if let Err(e) = tmp.persist(path) {
            roll_back(persisted);
            return Err(StackupError::Write {
                path: path.to_path_buf(),
                source: e.error,
            });
        }
        persisted.push((path, previous));
    }
    Ok(())
}

fn roll_back(persisted: Vec<(&Path, Option<Vec<u8>>)>) {
    for (path, previous) in persisted {
        let result = match previous {
            Some(bytes) => std::fs::write(path, bytes),
            None => std::fs::remove_file(path),
        };
        if let Err(e) = result {
            tracing::warn!("Could not roll back {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_next_to_input() {
        let paths = OutputPaths::resolve(Path::new("boards/main.kicad_pcb"), None);
        assert_eq!(paths.json, PathBuf::from("boards/main_stackup.json"));
        assert_eq!(paths.html, PathBuf::from("boards/main_stackup.html"));
    }

    #[test]
    fn test_explicit_output_path() {
        let paths = OutputPaths::resolve(
            Path::new("main.kicad_pcb"),
            Some(Path::new("out/report.json")),
        );
        assert_eq!(paths.json, PathBuf::from("out/report.json"));
        assert_eq!(paths.html, PathBuf::from("out/report.html"));
    }

    #[test]
    fn test_html_output_path_keeps_files_apart() {
        let paths = OutputPaths::from_json_path(Path::new("report.html"));
        assert_eq!(paths.json, PathBuf::from("report.json"));
        assert_eq!(paths.html, PathBuf::from("report.html"));
    }

    #[test]
    fn test_directory_output() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::resolve(Path::new("x/main.kicad_pcb"), Some(dir.path()));
        assert_eq!(paths.json, dir.path().join("main_stackup.json"));
    }

    #[test]
    fn test_write_atomically_writes_all() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.html");
        write_atomically(&[(&a, "{}"), (&b, "<html>")]).unwrap();
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "{}");
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "<html>");

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".stackup-export."))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_write_atomically_leaves_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("missing").join("b.html");
        let err = write_atomically(&[(&a, "{}"), (&b, "<html>")]).unwrap_err();
        assert!(matches!(err, StackupError::Write { .. }));
        assert!(!a.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_destination_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.html");
        std::fs::create_dir(&b).unwrap();
        std::fs::write(b.join("keep"), "x").unwrap();

        let err = write_atomically(&[(&a, "{}"), (&b, "<html>")]).unwrap_err();
        assert!(matches!(err, StackupError::Write { path, .. } if path == b));
        assert!(!a.exists());
        assert!(b.join("keep").exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.html");
        std::fs::write(&a, "old").unwrap();
        std::fs::create_dir(&b).unwrap();

        assert!(write_atomically(&[(&a, "new"), (&b, "<html>")]).is_err());
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "old");
    }

    #[test]
    fn test_roll_back_restores_or_removes() {
        let dir = tempfile::tempdir().unwrap();
        let existed = dir.path().join("existed.json");
        let fresh = dir.path().join("fresh.html");
        std::fs::write(&existed, "overwritten").unwrap();
        std::fs::write(&fresh, "new").unwrap();

        roll_back(vec![
            (existed.as_path(), Some(b"old".to_vec())),
            (fresh.as_path(), None),
        ]);
        assert_eq!(std::fs::read_to_string(&existed).unwrap(), "old");
        assert!(!fresh.exists());
    }

    #[test]
    fn test_choice_directory_gets_board_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let board = Path::new("/work/amp/amp.kicad_pcb");

        let paths = OutputPaths::for_choice(board, dir.path());
        assert_eq!(paths.json, dir.path().join("amp_stackup.json"));
        assert_eq!(paths.html, dir.path().join("amp_stackup.html"));

        let chosen = dir.path().join("custom.json");
        assert_eq!(OutputPaths::for_choice(board, &chosen).json, chosen);
    }
}
