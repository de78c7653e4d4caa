//! This module defines the `TuringMachine` struct, which executes an [`InstructionTable`]
//! against a single growable tape. It handles the machine's state, tape operations,
//! head movements, and reports every change to a [`Reporter`].

use crate::parser::InstructionTable;
use crate::reporter::Reporter;
use crate::types::{Direction, Halt, Step, TuringMachineError, BLANK_SYMBOL};
use tracing::{debug, trace, warn};

/// Represents a single-tape Turing Machine.
///
/// This struct encapsulates the current state of the machine, the contents of its tape,
/// the position of its read/write head, and the instruction table it executes.
pub struct TuringMachine {
    table: InstructionTable,
    tape: Vec<char>,
    head: usize,
    state: String,
    initial_input: String,
    initial_state: String,
    active_line: Option<usize>,
    step_count: usize,
    halted: bool,
}

impl TuringMachine {
    /// Creates a new `TuringMachine` with its head on the first cell.
    ///
    /// # Arguments
    ///
    /// * `table` - The instructions to execute.
    /// * `input` - The initial tape contents, taken literally. An empty input yields a
    ///   tape holding a single blank.
    /// * `initial_state` - The state to start in.
    pub fn new(table: InstructionTable, input: &str, initial_state: &str) -> Self {
        Self {
            table,
            tape: initial_tape(input),
            head: 0,
            state: initial_state.to_string(),
            initial_input: input.to_string(),
            initial_state: initial_state.to_string(),
            active_line: None,
            step_count: 0,
            halted: false,
        }
    }

    /// Executes a single step without reporting.
    pub fn step(&mut self) -> Step {
        self.step_with(&mut ())
    }

    /// Executes a single step of the machine's computation.
    ///
    /// The first instruction matching the current state and the symbol under the head is
    /// applied: write, then move, then change state. Each change is reported.
    ///
    /// # Returns
    ///
    /// * `Step::Applied { line }` if an instruction was applied.
    /// * `Step::Halt(Halt::Ok)` if no instruction matches. Nothing is changed.
    /// * `Step::Halt(Halt::Err(_))` if a reached instruction is malformed. Nothing is changed.
    pub fn step_with<R: Reporter + ?Sized>(&mut self, reporter: &mut R) -> Step {
        let symbol = self.symbol();

        let instruction = match self.table.find(&self.state, symbol) {
            Ok(Some(instruction)) => instruction.clone(),
            Ok(None) => {
                debug!(state = %self.state, symbol = ?symbol, steps = self.step_count, "halted");
                self.halted = true;
                return Step::Halt(Halt::Ok);
            }
            Err(error) => {
                warn!(%error, "aborting on malformed instruction");
                reporter.error(error.line, error.kind.message());
                self.halted = true;
                return Step::Halt(Halt::Err(TuringMachineError::Syntax(error)));
            }
        };

        let line = instruction.line;
        reporter.active_line(line, self.active_line.replace(line));

        if let Some(write) = instruction.write {
            if write != symbol {
                self.tape[self.head] = write;
                reporter.tape_write(self.head, write);
            }
        }

        match instruction.direction {
            Direction::Left if self.head == 0 => {
                // Extend tape to the left; index 0 is now the new blank
                self.tape.insert(0, BLANK_SYMBOL);
                reporter.tape_resized(&self.tape);
            }
            Direction::Right if self.head == self.tape.len() - 1 => {
                // Extend tape to the right; the head stays where it is
                self.tape.push(BLANK_SYMBOL);
                reporter.tape_resized(&self.tape);
            }
            Direction::Left => {
                self.head -= 1;
                reporter.head_moved(self.head);
            }
            Direction::Right => {
                self.head += 1;
                reporter.head_moved(self.head);
            }
            Direction::Stay => {}
        }

        if let Some(next_state) = instruction.next_state {
            self.state = next_state;
        }
        self.step_count += 1;

        trace!(
            line,
            state = %self.state,
            head = self.head,
            tape = %self.tape_string(),
            "applied instruction"
        );

        Step::Applied { line }
    }

    /// Runs the machine until it halts, reporting every step.
    pub fn run_with<R: Reporter + ?Sized>(&mut self, reporter: &mut R) -> Halt {
        loop {
            if let Step::Halt(halt) = self.step_with(reporter) {
                return halt;
            }
        }
    }

    /// Runs the machine until it halts, without reporting.
    pub fn run(&mut self) -> Halt {
        self.run_with(&mut ())
    }

    /// Resets the machine to its initial tape, head position and state.
    pub fn reset(&mut self) {
        self.tape = initial_tape(&self.initial_input);
        self.head = 0;
        self.state = self.initial_state.clone();
        self.active_line = None;
        self.step_count = 0;
        self.halted = false;
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the state the machine started in.
    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    /// Returns the tape cells.
    pub fn tape(&self) -> &[char] {
        &self.tape
    }

    /// Returns the tape as a string, blanks included.
    pub fn tape_string(&self) -> String {
        self.tape.iter().collect()
    }

    /// Returns the head position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the symbol under the head.
    pub fn symbol(&self) -> char {
        self.tape[self.head]
    }

    /// Returns the source line of the last applied instruction.
    pub fn active_line(&self) -> Option<usize> {
        self.active_line
    }

    /// Returns the total number of steps applied.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Checks if the last step halted the machine.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the instruction table being executed.
    pub fn table(&self) -> &InstructionTable {
        &self.table
    }
}

/// Builds a tape from user input. The tape is never empty.
fn initial_tape(input: &str) -> Vec<char> {
    if input.is_empty() {
        vec![BLANK_SYMBOL]
    } else {
        input.chars().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::Event;
    use crate::types::SyntaxErrorKind;
    use proptest::prelude::*;

    fn machine(program: &str, input: &str, state: &str) -> TuringMachine {
        TuringMachine::new(InstructionTable::parse(program).unwrap(), input, state)
    }

    #[test]
    fn test_machine_creation() {
        let machine = machine("0 1 1 r 0", "101", "0");

        assert_eq!(machine.state(), "0");
        assert_eq!(machine.tape(), &['1', '0', '1']);
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.active_line(), None);
        assert!(!machine.is_halted());
    }

    #[test]
    fn test_empty_input_is_single_blank() {
        let machine = machine("", "", "0");

        assert_eq!(machine.tape(), &[BLANK_SYMBOL]);
        assert_eq!(machine.symbol(), BLANK_SYMBOL);
    }

    #[test]
    fn test_scan_right_then_halt() {
        let mut machine = machine("0 1 1 r 0\n0 _ _ * halt\n", "11", "0");

        assert_eq!(machine.step(), Step::Applied { line: 1 });
        assert_eq!(machine.head(), 1);

        // At the right end the tape grows and the head stays put.
        assert_eq!(machine.step(), Step::Applied { line: 1 });
        assert_eq!(machine.tape_string(), "11 ");
        assert_eq!(machine.head(), 1);

        assert_eq!(machine.step(), Step::Applied { line: 1 });
        assert_eq!(machine.head(), 2);

        assert_eq!(machine.step(), Step::Applied { line: 2 });
        assert_eq!(machine.state(), "halt");
        assert_eq!(machine.head(), 2);

        assert_eq!(machine.step(), Step::Halt(Halt::Ok));
        assert!(machine.is_halted());
        assert_eq!(machine.tape_string(), "11 ");
        assert_eq!(machine.step_count(), 4);
    }

    #[test]
    fn test_wildcard_state_writes_and_grows() {
        let mut machine = machine("* 1 0 r *", "1", "anything");

        assert_eq!(machine.step(), Step::Applied { line: 1 });
        assert_eq!(machine.tape_string(), "0 ");
        assert_eq!(machine.state(), "anything");

        assert_eq!(machine.step(), Step::Halt(Halt::Ok));
    }

    #[test]
    fn test_reached_malformed_symbol_is_fatal() {
        let mut machine = machine("; header\n0 11 0 r 1\n", "1", "0");
        let mut events = Vec::new();

        let step = machine.step_with(&mut events);

        match step {
            Step::Halt(Halt::Err(TuringMachineError::Syntax(error))) => {
                assert_eq!(error.line, 2);
                assert_eq!(error.kind, SyntaxErrorKind::Symbol);
                assert!(error.to_string().contains("Symbol must be 1 character"));
            }
            other => panic!("Expected a syntax error, got {:?}", other),
        }
        assert_eq!(
            events,
            vec![Event::Error {
                line: 2,
                message: "Symbol must be 1 character".to_string()
            }]
        );
        assert_eq!(machine.tape_string(), "1");
        assert_eq!(machine.state(), "0");
    }

    #[test]
    fn test_malformed_lines_for_unreached_states_are_ignored() {
        let program = "0 a b r done\nnever 11 22 up 0\n";
        let mut machine = machine(program, "a", "0");

        assert_eq!(machine.run(), Halt::Ok);
        assert_eq!(machine.tape_string(), "b ");
        assert_eq!(machine.state(), "done");
    }

    #[test]
    fn test_left_at_origin_prepends_blank() {
        let mut machine = machine("0 a a l 0", "a", "0");
        let mut events = Vec::new();

        assert_eq!(machine.step_with(&mut events), Step::Applied { line: 1 });
        assert_eq!(machine.tape_string(), " a");
        assert_eq!(machine.head(), 0);
        assert_eq!(
            events,
            vec![
                Event::ActiveLine {
                    line: 1,
                    previous: None
                },
                Event::TapeResized {
                    tape: " a".to_string()
                },
            ]
        );

        // The head now reads the new blank, for which there is no rule.
        assert_eq!(machine.step(), Step::Halt(Halt::Ok));
    }

    #[test]
    fn test_event_sequence() {
        let program = "0 a b r 1\n1 c c l 2\n2 b _ * 2\n";
        let mut machine = machine(program, "ac", "0");
        let mut events = Vec::new();

        assert_eq!(machine.run_with(&mut events), Halt::Ok);
        assert_eq!(
            events,
            vec![
                Event::ActiveLine {
                    line: 1,
                    previous: None
                },
                Event::TapeWrite {
                    position: 0,
                    symbol: 'b'
                },
                Event::HeadMove { position: 1 },
                Event::ActiveLine {
                    line: 2,
                    previous: Some(1)
                },
                Event::HeadMove { position: 0 },
                Event::ActiveLine {
                    line: 3,
                    previous: Some(2)
                },
                Event::TapeWrite {
                    position: 0,
                    symbol: ' '
                },
            ]
        );
        assert_eq!(machine.tape_string(), " c");
        assert_eq!(machine.active_line(), Some(3));
    }

    #[test]
    fn test_write_same_symbol_is_not_reported() {
        let mut machine = machine("0 a a * 1", "a", "0");
        let mut events = Vec::new();

        machine.step_with(&mut events);

        assert_eq!(
            events,
            vec![Event::ActiveLine {
                line: 1,
                previous: None
            }]
        );
        assert_eq!(machine.state(), "1");
    }

    #[test]
    fn test_first_match_wins() {
        let mut machine = machine("0 a x * done\n0 a y * other\n", "a", "0");

        machine.step();

        assert_eq!(machine.tape_string(), "x");
        assert_eq!(machine.state(), "done");
    }

    #[test]
    fn test_wildcard_effects_leave_machine_alone() {
        let mut machine = machine("s * * * *", "xyz", "s");

        assert_eq!(machine.step(), Step::Applied { line: 1 });
        assert_eq!(machine.tape_string(), "xyz");
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.state(), "s");
    }

    #[test]
    fn test_blank_token_matches_space() {
        let mut machine = machine("0 _ x * 1", " ", "0");

        machine.step();

        assert_eq!(machine.tape_string(), "x");
    }

    #[test]
    fn test_reset() {
        let mut machine = machine("0 1 0 r 1", "1", "0");

        machine.step();
        assert_eq!(machine.state(), "1");
        assert_eq!(machine.step_count(), 1);

        machine.reset();
        assert_eq!(machine.state(), "0");
        assert_eq!(machine.tape_string(), "1");
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.active_line(), None);
        assert!(!machine.is_halted());
    }

    proptest! {
        #[test]
        fn prop_halt_leaves_machine_unchanged(input in "[ab]{0,6}") {
            let mut machine = machine("0 c c r 0", &input, "0");
            let tape = machine.tape_string();

            prop_assert_eq!(machine.step(), Step::Halt(Halt::Ok));
            prop_assert_eq!(machine.tape_string(), tape);
            prop_assert_eq!(machine.head(), 0);
            prop_assert_eq!(machine.state(), "0");
        }

        #[test]
        fn prop_tape_grows_one_cell_at_a_boundary(input in "[ab]{1,6}", steps in 1usize..40) {
            // Bounce between the two ends of the tape.
            let program = "r a a r r\nr b b r r\nr _ _ l l\nl a a l l\nl b b l l\nl _ _ r r\n";
            let mut machine = machine(program, &input, "r");

            for _ in 0..steps {
                let before = machine.tape().to_vec();
                let head = machine.head();
                prop_assert!(matches!(machine.step(), Step::Applied { .. }), "step did not apply");

                let after = machine.tape();
                if after.len() != before.len() {
                    prop_assert_eq!(after.len(), before.len() + 1);
                    let appended = after[..before.len()] == before[..];
                    let prepended = after[1..] == before[..];
                    prop_assert!(appended || prepended);
                    prop_assert!(head == 0 || head == before.len() - 1);
                }
            }
        }

        #[test]
        fn prop_runs_are_deterministic(input in "[01]{0,8}") {
            let program = "0 0 1 r 0\n0 1 0 r 0\n0 _ _ * done\n";
            let mut first = Vec::new();
            let mut second = Vec::new();

            machine(program, &input, "0").run_with(&mut first);
            machine(program, &input, "0").run_with(&mut second);

            prop_assert_eq!(first, second);
        }
    }
}
