//! Board sources
//!
//! The pipeline only needs the board text and a name for it. [`FileBoard`]
//! reads a `.kicad_pcb` from disk; [`HostBoard`] wraps board text that a
//! host application already holds in memory.

use std::path::{Path, PathBuf};

use crate::core::{read_existing, StackupError};

/// Anything the exporter can read a board from.
pub trait BoardSource {
    /// Name recorded in the exported document, usually the file name.
    fn name(&self) -> String;

    /// Where the board lives on disk, if anywhere.
    fn location(&self) -> Option<&Path>;

    /// Full board file text.
    fn read(&self) -> Result<String, StackupError>;

    /// Suggested JSON output path: `<stem>_stackup.json` next to the board.
    fn suggested_output(&self) -> PathBuf {
        let name = PathBuf::from(self.name());
        let file_name = crate::core::default_file_name(&name);
        match self.location().and_then(Path::parent) {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

/// A board file on disk.
#[derive(Debug, Clone)]
pub struct FileBoard {
    path: PathBuf,
}

impl FileBoard {
    /// Fails with [`StackupError::NotFound`] unless `path` is an existing file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StackupError> {
        let path = path.into();
        if !path.is_file() {
            return Err(StackupError::NotFound(path));
        }
        Ok(Self { path })
    }
}

impl BoardSource for FileBoard {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn read(&self) -> Result<String, StackupError> {
        read_existing(&self.path)
    }
}

/// Board text handed over by a host application.
#[derive(Debug, Clone)]
pub struct HostBoard {
    name: String,
    path: Option<PathBuf>,
    content: String,
}

impl HostBoard {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            content: content.into(),
        }
    }

    /// Record where the host saved the board.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl BoardSource for HostBoard {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(&self) -> Result<String, StackupError> {
        Ok(self.content.clone())
    }
}
