//! This module provides the `ProgramLoader` struct, responsible for loading programs
//! from files, readers, and strings.

use crate::parser::{parse, InstructionTable};
use crate::types::{TuringMachineError, STDIN_PATH};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// `ProgramLoader` is a utility struct for loading program text and instruction tables.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Reads the raw program text from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` with the file contents.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    pub fn read_source(path: &Path) -> Result<String, TuringMachineError> {
        fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    /// Reads the raw program text from any reader, e.g. stdin.
    pub fn read_source_from<R: Read>(mut reader: R) -> Result<String, TuringMachineError> {
        let mut buffer = String::new();
        reader
            .read_to_string(&mut buffer)
            .map_err(|e| TuringMachineError::FileError(format!("Failed to read program: {}", e)))?;
        Ok(buffer)
    }

    /// Reads the raw program text from `path`, or from stdin when `path` is `-`.
    pub fn read_source_or_stdin(path: &Path) -> Result<String, TuringMachineError> {
        if Self::is_stdin(path) {
            Self::read_source_from(io::stdin())
        } else {
            Self::read_source(path)
        }
    }

    /// Whether `path` names stdin rather than a file.
    pub fn is_stdin(path: &Path) -> bool {
        path == Path::new(STDIN_PATH)
    }

    /// Loads an instruction table from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(InstructionTable)` if the file is read and tokenized.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    pub fn load_program(path: &Path) -> Result<InstructionTable, TuringMachineError> {
        parse(&Self::read_source(path)?)
    }

    /// Loads an instruction table from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<InstructionTable, TuringMachineError> {
        parse(content)
    }
}
