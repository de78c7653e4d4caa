//! This crate provides the core logic for a line-oriented Turing machine interpreter.
//! It includes modules for parsing programs into instruction tables, executing them
//! against a growable tape, reporting each change to a display, and analyzing programs
//! before they run.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod reporter;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `Diagnostic` enum from the analyzer module.
pub use analyzer::{analyze, Diagnostic};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
/// Re-exports the parsing entry points from the parser module.
pub use parser::{parse, parse_line, InstructionTable};
/// Re-exports the reporting seam from the reporter module.
pub use reporter::{Event, Reporter};
/// Re-exports the types describing instructions, execution results, and errors.
pub use types::{
    Direction, Entry, Halt, Instruction, Pattern, Step, SyntaxError, SyntaxErrorKind,
    TuringMachineError,
};
