//! This module provides the parser for line-oriented Turing machine programs, utilizing the
//! `pest` crate for tokenization. It turns program text into an [`InstructionTable`].
//!
//! Each physical line holds at most one instruction:
//!
//! ```text
//! <state> <symbol> <new_symbol> <direction> <new_state>   ; optional comment
//! ```

use crate::types::{
    Direction, Entry, Instruction, Pattern, SyntaxError, SyntaxErrorKind, TuringMachineError,
    BLANK_SYMBOL, INPUT_BLANK_SYMBOL, WILDCARD,
};
use pest::Parser as PestParser;
use pest_derive::Parser as PestParser;
use tracing::{debug, warn};

/// Number of fields that make up an instruction.
const FIELD_COUNT: usize = 5;

/// Derives a `PestParser` for the line grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct InstructionParser;

/// An ordered list of table entries, in the textual order of the program source.
///
/// There is no uniqueness constraint: when several entries match, the earliest wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionTable {
    entries: Vec<Entry>,
    line_count: usize,
}

impl InstructionTable {
    /// Parses every line of `source` into a table.
    ///
    /// Lines without an instruction (blank lines, comments, lines with fewer than five
    /// fields) produce no entry but still advance the line numbering. Malformed
    /// instructions are kept as [`Entry::Malformed`] and only fail when reached.
    pub fn parse(source: &str) -> Result<Self, TuringMachineError> {
        let mut entries = Vec::new();
        let mut line_count = 0;

        for (index, text) in source.lines().enumerate() {
            line_count = index + 1;
            if let Some(entry) = parse_line(text, line_count)? {
                entries.push(entry);
            }
        }

        let malformed = entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Malformed { .. }))
            .count();
        debug!(
            lines = line_count,
            entries = entries.len(),
            malformed,
            "parsed instruction table"
        );

        Ok(Self {
            entries,
            line_count,
        })
    }

    /// Returns the number of entries, malformed ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the program holds no instruction at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in source order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of physical lines the table was built from.
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Finds the instruction to execute for `state` with `symbol` under the head.
    ///
    /// Entries are scanned in source order. Entries for other states are skipped. The
    /// first state-matching entry that is malformed aborts the scan with its error, even
    /// if a later entry would match. Otherwise the first entry whose read pattern
    /// accepts `symbol` is returned.
    pub fn find(&self, state: &str, symbol: char) -> Result<Option<&Instruction>, SyntaxError> {
        for entry in self.entries.iter().filter(|entry| entry.state().matches(state)) {
            match entry {
                Entry::Malformed { error, .. } => return Err(error.clone()),
                Entry::Instruction(instruction) if instruction.read.matches(&symbol) => {
                    return Ok(Some(instruction))
                }
                Entry::Instruction(_) => {}
            }
        }

        Ok(None)
    }
}

/// Parses the given program source into an [`InstructionTable`].
///
/// This is the main entry point for parsing program text.
pub fn parse(input: &str) -> Result<InstructionTable, TuringMachineError> {
    InstructionTable::parse(input)
}

/// Parses one line of program text.
///
/// # Arguments
///
/// * `text` - The line, without its terminator.
/// * `line` - The 1-based line number, recorded on the resulting entry.
///
/// # Returns
///
/// * `Ok(None)` for blank lines, comments and lines with fewer than five fields.
/// * `Ok(Some(Entry::Instruction(_)))` for a well-formed instruction.
/// * `Ok(Some(Entry::Malformed { .. }))` when a field fails validation.
pub fn parse_line(text: &str, line: usize) -> Result<Option<Entry>, TuringMachineError> {
    let fields = tokenize(text)?;

    if fields.len() < FIELD_COUNT {
        if !fields.is_empty() {
            warn!(line, fields = fields.len(), "ignoring incomplete instruction");
        }
        return Ok(None);
    }

    let entry = match validate(&fields[..FIELD_COUNT], line) {
        Ok(instruction) => Entry::Instruction(instruction),
        Err(error) => Entry::Malformed {
            state: parse_state(fields[0]),
            error,
        },
    };

    Ok(Some(entry))
}

/// Splits a line into its fields, dropping any comment.
///
/// Fields are separated by runs of spaces. All fields are returned; callers decide how
/// many of them are significant.
pub fn tokenize(text: &str) -> Result<Vec<&str>, TuringMachineError> {
    let pairs = InstructionParser::parse(Rule::line, text)
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?;

    Ok(pairs
        .flat_map(|pair| pair.into_inner())
        .filter(|pair| pair.as_rule() == Rule::field)
        .map(|pair| pair.as_str())
        .collect())
}

/// Checks the symbol and direction fields, in order, and builds the instruction.
fn validate(fields: &[&str], line: usize) -> Result<Instruction, SyntaxError> {
    let error = |kind| SyntaxError { line, kind };

    let read = single_char(fields[1]).ok_or_else(|| error(SyntaxErrorKind::Symbol))?;
    let write = single_char(fields[2]).ok_or_else(|| error(SyntaxErrorKind::NewSymbol))?;
    let direction =
        single_char(fields[3]).ok_or_else(|| error(SyntaxErrorKind::DirectionLength))?;
    let direction =
        parse_direction(direction).ok_or_else(|| error(SyntaxErrorKind::DirectionValue))?;

    Ok(Instruction {
        state: parse_state(fields[0]),
        read: match read {
            WILDCARD => Pattern::Any,
            symbol => Pattern::Exact(parse_symbol(symbol)),
        },
        write: match write {
            WILDCARD => None,
            symbol => Some(parse_symbol(symbol)),
        },
        direction,
        next_state: match fields[4] {
            "*" => None,
            state => Some(state.to_string()),
        },
        line,
    })
}

/// Parses a state field; `*` matches every state.
fn parse_state(field: &str) -> Pattern<String> {
    match field {
        "*" => Pattern::Any,
        state => Pattern::Exact(state.to_string()),
    }
}

/// Maps the program-text blank onto the tape blank.
fn parse_symbol(symbol: char) -> char {
    if symbol == INPUT_BLANK_SYMBOL {
        BLANK_SYMBOL
    } else {
        symbol
    }
}

/// Parses a single direction character, ignoring case.
///
/// Supports `l` for Left, `r` for Right, and `*` for Stay.
fn parse_direction(direction: char) -> Option<Direction> {
    match direction.to_ascii_lowercase() {
        'l' => Some(Direction::Left),
        'r' => Some(Direction::Right),
        WILDCARD => Some(Direction::Stay),
        _ => None,
    }
}

/// Returns the only character of `field`, or `None` if it has zero or several.
fn single_char(field: &str) -> Option<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn instruction(text: &str) -> Instruction {
        match parse_line(text, 1).unwrap() {
            Some(Entry::Instruction(instruction)) => instruction,
            other => panic!("Expected an instruction, got {:?}", other),
        }
    }

    fn malformed(text: &str, line: usize) -> SyntaxError {
        match parse_line(text, line).unwrap() {
            Some(Entry::Malformed { error, .. }) => error,
            other => panic!("Expected a malformed entry, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_instruction() {
        let parsed = instruction("0 1 0 r halt");

        assert_eq!(parsed.state, Pattern::Exact("0".to_string()));
        assert_eq!(parsed.read, Pattern::Exact('1'));
        assert_eq!(parsed.write, Some('0'));
        assert_eq!(parsed.direction, Direction::Right);
        assert_eq!(parsed.next_state, Some("halt".to_string()));
        assert_eq!(parsed.line, 1);
    }

    #[test]
    fn test_parse_wildcards() {
        let parsed = instruction("* * * * *");

        assert_eq!(parsed.state, Pattern::Any);
        assert_eq!(parsed.read, Pattern::Any);
        assert_eq!(parsed.write, None);
        assert_eq!(parsed.direction, Direction::Stay);
        assert_eq!(parsed.next_state, None);
    }

    #[test]
    fn test_parse_blank_symbols() {
        let parsed = instruction("0 _ _ l 1");

        assert_eq!(parsed.read, Pattern::Exact(BLANK_SYMBOL));
        assert_eq!(parsed.write, Some(BLANK_SYMBOL));
        assert_eq!(parsed.direction, Direction::Left);
    }

    #[rstest]
    #[case("0 a b R 1", Direction::Right)]
    #[case("0 a b L 1", Direction::Left)]
    #[case("0 a b r 1", Direction::Right)]
    #[case("0 a b l 1", Direction::Left)]
    #[case("0 a b * 1", Direction::Stay)]
    fn test_direction_is_case_insensitive(#[case] text: &str, #[case] expected: Direction) {
        assert_eq!(instruction(text).direction, expected);
    }

    #[rstest]
    #[case("")]
    #[case("     ")]
    #[case("; just a comment")]
    #[case("   ; indented comment")]
    #[case("0 1 0 r")]
    #[case("0 1 0 r ; halt")]
    #[case("0\t1\t0\tr\thalt")]
    fn test_lines_without_instruction(#[case] text: &str) {
        assert_eq!(parse_line(text, 1).unwrap(), None);
    }

    #[test]
    fn test_whitespace_runs_and_trailing_fields() {
        let parsed = instruction("   state   x  y   r   next  extra tokens here");

        assert_eq!(parsed.state, Pattern::Exact("state".to_string()));
        assert_eq!(parsed.read, Pattern::Exact('x'));
        assert_eq!(parsed.write, Some('y'));
        assert_eq!(parsed.next_state, Some("next".to_string()));
    }

    #[test]
    fn test_comment_truncates_inside_field() {
        let parsed = instruction("0 1 1 r done;comment 1 2 3");
        assert_eq!(parsed.next_state, Some("done".to_string()));

        assert_eq!(tokenize("ab;cd ef").unwrap(), vec!["ab"]);
    }

    #[rstest]
    #[case("0 11 0 r 1", SyntaxErrorKind::Symbol)]
    #[case("0 1 00 r 1", SyntaxErrorKind::NewSymbol)]
    #[case("0 1 0 right 1", SyntaxErrorKind::DirectionLength)]
    #[case("0 1 0 x 1", SyntaxErrorKind::DirectionValue)]
    #[case("0 11 00 xx 1", SyntaxErrorKind::Symbol)]
    #[case("0 1 00 xx 1", SyntaxErrorKind::NewSymbol)]
    fn test_field_validation_order(#[case] text: &str, #[case] kind: SyntaxErrorKind) {
        let error = malformed(text, 4);

        assert_eq!(error.kind, kind);
        assert_eq!(error.line, 4);
    }

    #[test]
    fn test_single_char_counts_characters_not_bytes() {
        let parsed = instruction("0 é ü r 1");

        assert_eq!(parsed.read, Pattern::Exact('é'));
        assert_eq!(parsed.write, Some('ü'));
    }

    #[test]
    fn test_table_line_numbers_include_skipped_lines() {
        let source = "; header\n\n0 1 1 r 0\n   \n0 _ _ * halt\n";
        let table = InstructionTable::parse(source).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.line_count(), 5);
        assert_eq!(table.entries()[0].line(), 3);
        assert_eq!(table.entries()[1].line(), 5);
    }

    #[test]
    fn test_table_handles_crlf() {
        let table = InstructionTable::parse("0 1 1 r 0\r\n0 _ _ * halt\r\n").unwrap();

        match &table.entries()[1] {
            Entry::Instruction(instruction) => {
                assert_eq!(instruction.next_state, Some("halt".to_string()))
            }
            other => panic!("Expected an instruction, got {:?}", other),
        }
    }

    #[test]
    fn test_find_first_match_wins() {
        let table = InstructionTable::parse("0 a b r 1\n0 a c l 2\n").unwrap();

        let found = table.find("0", 'a').unwrap().unwrap();
        assert_eq!(found.line, 1);
        assert_eq!(table.find("0", 'z').unwrap(), None);
        assert_eq!(table.find("1", 'a').unwrap(), None);
    }

    #[test]
    fn test_find_skips_malformed_lines_of_other_states() {
        let table = InstructionTable::parse("never 11 0 r 1\n0 a b r 1\n").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.find("0", 'a').unwrap().unwrap().line, 2);
    }

    #[test]
    fn test_find_fails_fast_on_reached_malformed_line() {
        let table = InstructionTable::parse("0 a b r 1\n* 11 0 r 1\n0 c d r 1\n").unwrap();

        // The first line matches before the malformed one is reached.
        assert_eq!(table.find("0", 'a').unwrap().unwrap().line, 1);

        // A later valid match does not rescue the malformed line.
        let error = table.find("0", 'c').unwrap_err();
        assert_eq!(error.line, 2);
        assert_eq!(error.kind, SyntaxErrorKind::Symbol);
    }

    #[test]
    fn test_find_wildcard_symbol() {
        let table = InstructionTable::parse("q * * r q\n").unwrap();

        assert!(table.find("q", BLANK_SYMBOL).unwrap().is_some());
        assert!(table.find("q", '7').unwrap().is_some());
    }
}
