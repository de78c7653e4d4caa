//! This module defines the core data structures and types used throughout the interpreter,
//! including parsed instructions, wildcard patterns, execution results, and error types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use thiserror::Error;

use crate::Rule;

/// The blank symbol stored on the tape.
pub const BLANK_SYMBOL: char = ' ';
/// The symbol used in program text to represent the blank symbol.
pub const INPUT_BLANK_SYMBOL: char = '_';
/// The wildcard token: "match anything" on the match side, "no change" on the effect side.
pub const WILDCARD: char = '*';
/// Starts a comment that runs to the end of the line.
pub const COMMENT: char = ';';
/// The state a machine starts in when none is given.
pub const DEFAULT_INITIAL_STATE: &str = "0";
/// The program file read when none is given.
pub const DEFAULT_PROGRAM_FILE: &str = "Turing-Program.txt";
/// The program path that selects stdin.
pub const STDIN_PATH: &str = "-";

/// The match side of an instruction field: either anything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern<T> {
    /// Matches every value (`*` in program text).
    Any,
    /// Matches only this value.
    Exact(T),
}

impl<T> Pattern<T> {
    /// Returns `true` if the pattern accepts `value`.
    pub fn matches<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            Pattern::Any => true,
            Pattern::Exact(expected) => expected.borrow() == value,
        }
    }

    /// Returns `true` if every value accepted by `other` is also accepted by `self`.
    pub fn covers(&self, other: &Pattern<T>) -> bool
    where
        T: PartialEq,
    {
        match (self, other) {
            (Pattern::Any, _) => true,
            (Pattern::Exact(_), Pattern::Any) => false,
            (Pattern::Exact(a), Pattern::Exact(b)) => a == b,
        }
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position (`*` in program text).
    Stay,
}

/// A single parsed transition record.
///
/// An instruction is immutable once parsed. It is selected when both `state` and `read`
/// match the machine's current state and the symbol under the head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The state this instruction applies to.
    pub state: Pattern<String>,
    /// The tape symbol this instruction applies to.
    pub read: Pattern<char>,
    /// The symbol to write, or `None` to leave the cell untouched.
    pub write: Option<char>,
    /// Where the head goes after the write.
    pub direction: Direction,
    /// The state to enter, or `None` to stay in the current one.
    pub next_state: Option<String>,
    /// 1-based line number in the program source.
    pub line: usize,
}

/// One slot of an instruction table.
///
/// Field validation happens when the table is built, but a failure is only raised once
/// the machine reaches the slot as a state-matching candidate. Until then a malformed
/// line is inert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A well-formed instruction.
    Instruction(Instruction),
    /// A line with five fields whose symbol or direction fields are invalid.
    Malformed {
        /// The state field, which is still needed to decide whether the slot is reached.
        state: Pattern<String>,
        /// The error raised when the slot is reached.
        error: SyntaxError,
    },
}

impl Entry {
    /// Returns the state pattern of this entry.
    pub fn state(&self) -> &Pattern<String> {
        match self {
            Entry::Instruction(instruction) => &instruction.state,
            Entry::Malformed { state, .. } => state,
        }
    }

    /// Returns the 1-based source line of this entry.
    pub fn line(&self) -> usize {
        match self {
            Entry::Instruction(instruction) => instruction.line,
            Entry::Malformed { error, .. } => error.line,
        }
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// An instruction was applied; `line` is its source line.
    Applied { line: usize },
    /// The machine cannot continue.
    Halt(Halt),
}

/// Why the machine stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// No instruction matches the current state and symbol.
    Ok,
    /// A reached instruction is malformed.
    Err(TuringMachineError),
}

/// The field a syntax error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxErrorKind {
    /// The symbol field is not a single character.
    Symbol,
    /// The new symbol field is not a single character.
    NewSymbol,
    /// The direction field is not a single character.
    DirectionLength,
    /// The direction field is a single character other than `l`, `r` or `*`.
    DirectionValue,
}

impl SyntaxErrorKind {
    /// The human-readable message naming the offending field.
    pub fn message(self) -> &'static str {
        match self {
            SyntaxErrorKind::Symbol => "Symbol must be 1 character",
            SyntaxErrorKind::NewSymbol => "New_Symbol must be 1 character",
            SyntaxErrorKind::DirectionLength => "Move_Direction must be 1 character",
            SyntaxErrorKind::DirectionValue => "Move_Direction must be r or l",
        }
    }
}

/// A malformed instruction, located by its source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax Error (line {line}): {}", .kind.message())]
pub struct SyntaxError {
    /// 1-based source line.
    pub line: usize,
    /// Which field was rejected.
    pub kind: SyntaxErrorKind,
}

/// Represents various errors that can occur while loading or running a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A state-matching instruction has a malformed field.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// Indicates an error while tokenizing a program line.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to file system operations, such as reading program files.
    #[error("File error: {0}")]
    FileError(String),
}
