//! This module provides functions for analyzing instruction tables to detect common errors
//! before execution: malformed instructions, instructions that can never be selected, and
//! states that can never be entered.
//!
//! Analysis is advisory. The machine itself only rejects a malformed instruction once it
//! reaches it, so a program that fails analysis may still run to completion.

use crate::parser::InstructionTable;
use crate::types::{Entry, Instruction, Pattern};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Represents the findings of analyzing an instruction table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// An instruction line with an invalid symbol or direction field.
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    /// An instruction that an earlier entry always takes precedence over.
    #[error("line {line}: never selected, shadowed by line {by}")]
    Shadowed { line: usize, by: usize },
    /// States that have instructions but cannot be entered from the initial state.
    #[error("unreachable states: {}", .0.join(", "))]
    UnreachableStates(Vec<String>),
}

impl Diagnostic {
    /// Returns `true` if the program would fail when the diagnosed line is reached.
    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::Malformed { .. })
    }
}

/// Analyzes an instruction table for structural and logical problems.
///
/// # Arguments
///
/// * `table` - The table to analyze.
/// * `initial_state` - The state the machine will start in. Reachability is only checked
///   when it is given.
///
/// # Returns
///
/// All diagnostics, ordered by check and then by source line.
pub fn analyze(table: &InstructionTable, initial_state: Option<&str>) -> Vec<Diagnostic> {
    let mut diagnostics = check_malformed(table);
    diagnostics.extend(check_shadowed(table));

    if let Some(initial_state) = initial_state {
        diagnostics.extend(check_unreachable_states(table, initial_state));
    }

    diagnostics
}

/// Lists every malformed entry.
fn check_malformed(table: &InstructionTable) -> Vec<Diagnostic> {
    table
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            Entry::Malformed { error, .. } => Some(Diagnostic::Malformed {
                line: error.line,
                message: error.kind.message().to_string(),
            }),
            Entry::Instruction(_) => None,
        })
        .collect()
}

/// Finds instructions whose state and symbol patterns are covered by an earlier entry.
///
/// A malformed entry shadows nothing: reaching it aborts the run, but for any other
/// state the scan continues past it.
fn check_shadowed(table: &InstructionTable) -> Vec<Diagnostic> {
    let instructions: Vec<&Instruction> = instructions(table).collect();

    instructions
        .iter()
        .enumerate()
        .filter_map(|(i, later)| {
            instructions[..i]
                .iter()
                .find(|earlier| {
                    earlier.state.covers(&later.state) && earlier.read.covers(&later.read)
                })
                .map(|earlier| Diagnostic::Shadowed {
                    line: later.line,
                    by: earlier.line,
                })
        })
        .collect()
}

/// Identifies named states that cannot be entered from `initial_state`.
///
/// Wildcard instructions apply in every state, so their next states are reachable as soon
/// as anything is.
fn check_unreachable_states(table: &InstructionTable, initial_state: &str) -> Vec<Diagnostic> {
    let mut reachable: HashSet<&str> = HashSet::from([initial_state]);
    let mut queue = vec![initial_state];

    while let Some(state) = queue.pop() {
        for instruction in instructions(table).filter(|i| i.state.matches(state)) {
            if let Some(next) = instruction.next_state.as_deref() {
                if reachable.insert(next) {
                    queue.push(next);
                }
            }
        }
    }

    let unreachable: BTreeSet<String> = table
        .entries()
        .iter()
        .filter_map(|entry| match entry.state() {
            Pattern::Exact(state) if !reachable.contains(state.as_str()) => Some(state.clone()),
            _ => None,
        })
        .collect();

    if unreachable.is_empty() {
        Vec::new()
    } else {
        vec![Diagnostic::UnreachableStates(
            unreachable.into_iter().collect(),
        )]
    }
}

/// Iterates over the well-formed instructions of a table.
fn instructions(table: &InstructionTable) -> impl Iterator<Item = &Instruction> {
    table.entries().iter().filter_map(|entry| match entry {
        Entry::Instruction(instruction) => Some(instruction),
        Entry::Malformed { .. } => None,
    })
}
