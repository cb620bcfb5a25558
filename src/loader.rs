//! This module provides the `ProgramLoader` struct, responsible for loading and saving
//! programs as `.tm` text files or `.json` documents.

use crate::encoder::encode_file;
use crate::parser::parse;
use crate::types::{Program, TuringError};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions recognized when scanning a directory for programs.
pub const PROGRAM_EXTENSIONS: [&str; 2] = ["tm", "json"];

/// `ProgramLoader` is a utility struct for loading programs.
/// It provides methods to load programs from individual files, from string content,
/// and to discover and load all program files within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// `.json` files are read as the serialized `Program`; anything else as the textual encoding.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(TuringError::FileError)` if the file cannot be read.
    /// * `Err(TuringError::Parse)` or `Err(TuringError::Configuration)` if the content is invalid.
    pub fn load_program(path: &Path) -> Result<Program, TuringError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loading program");

        if is_json(path) {
            Program::from_json(&content)
        } else {
            parse(&content)
        }
    }

    /// Loads a single program from its textual encoding.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringError> {
        parse(content)
    }

    /// Writes a program to `path`, as JSON for `.json` files and in the file form otherwise.
    pub fn save_program(path: &Path, program: &Program) -> Result<(), TuringError> {
        let content = if is_json(path) {
            program.to_json()?
        } else {
            encode_file(program)?
        };

        fs::write(path, content).map_err(|e| {
            TuringError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })
    }

    /// Loads all program files (`.tm` and `.json`) from a given directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// is either the loaded program with its path, or the error that stopped it from loading.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), TuringError>> {
        if !directory.exists() {
            return vec![Err(TuringError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(TuringError::FileError(format!(
                            "Failed to read directory entry: {e}"
                        ))))
                    }
                };

                let known = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PROGRAM_EXTENSIONS.contains(&ext));
                if path.is_dir() || !known {
                    return None;
                }

                match Self::load_program(&path) {
                    Ok(program) => Some(Ok((path, program))),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping program");
                        Some(Err(TuringError::FileError(format!(
                            "Failed to load program from {}: {}",
                            path.display(),
                            e
                        ))))
                    }
                }
            })
            .collect();

        // Directory order is platform dependent
        results.sort_by_key(|r| r.as_ref().ok().map(|(path, _)| path.clone()));
        results
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
