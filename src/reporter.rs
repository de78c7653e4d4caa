//! The reporting seam between the machine and whatever displays it.
//!
//! The machine never draws anything itself. While stepping it calls into a [`Reporter`],
//! which a terminal front end, a logger, or a test can implement.

use serde::Serialize;

/// Receives notifications from the machine while it steps.
///
/// Every method defaults to doing nothing, so implementors only override what they
/// display. Notifications cannot fail.
pub trait Reporter {
    /// The instruction on `line` is about to execute. `previous` is the line that was
    /// active before, whose highlight should be cleared.
    fn active_line(&mut self, _line: usize, _previous: Option<usize>) {}

    /// The cell at `position` was overwritten with `symbol`.
    fn tape_write(&mut self, _position: usize, _symbol: char) {}

    /// The head moved by one cell to `position` without the tape growing.
    fn head_moved(&mut self, _position: usize) {}

    /// The tape grew at one of its ends. Every cell coordinate may have shifted, so the
    /// whole tape has to be redrawn.
    fn tape_resized(&mut self, _tape: &[char]) {}

    /// A fatal condition on `line` ends the run.
    fn error(&mut self, _line: usize, _message: &str) {}
}

/// The silent reporter.
impl Reporter for () {}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// An instruction was applied from `line`.
    ActiveLine {
        line: usize,
        previous: Option<usize>,
    },
    /// A different symbol was written under the head.
    TapeWrite {
        position: usize,
        symbol: char,
    },
    /// The head moved within the tape.
    HeadMove {
        position: usize,
    },
    /// The tape grew by one blank cell.
    TapeResized {
        tape: String,
    },
    /// A reached instruction was malformed.
    Error {
        line: usize,
        message: String,
    },
}

/// Records every notification in order.
impl Reporter for Vec<Event> {
    fn active_line(&mut self, line: usize, previous: Option<usize>) {
        self.push(Event::ActiveLine { line, previous });
    }

    fn tape_write(&mut self, position: usize, symbol: char) {
        self.push(Event::TapeWrite { position, symbol });
    }

    fn head_moved(&mut self, position: usize) {
        self.push(Event::HeadMove { position });
    }

    fn tape_resized(&mut self, tape: &[char]) {
        self.push(Event::TapeResized {
            tape: tape.iter().collect(),
        });
    }

    fn error(&mut self, line: usize, message: &str) {
        self.push(Event::Error {
            line,
            message: message.to_string(),
        });
    }
}
