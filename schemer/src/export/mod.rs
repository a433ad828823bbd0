//! Code export
//!
//! Generators read a finalized snapshot and turn it into framework source files. They borrow
//! the store immutably and never take part in keeping the schema consistent.

pub mod laravel;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use laravel::LaravelGenerator;

/// A generated source file, relative to the export root
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Write generated files below `root`, creating directories as needed
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = root.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.contents)?;
        tracing::info!(path = %target.display(), "Generated file written");
        written.push(target);
    }

    Ok(written)
}
