use action::Action;
use keymap::{Config, KeyMapConfig};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};
use turing_interpreter::{
    types::{BLANK_SYMBOL, COMMENT, INPUT_BLANK_SYMBOL},
    Halt, InstructionTable, Reporter, Step, TuringMachine,
};

const BLOCK_PADDING: Padding = Padding::new(1, 1, 0, 0);

/// What the last step changed, as reported by the machine.
#[derive(Default)]
struct StepView {
    written: Option<usize>,
    resized: bool,
    error: Option<(usize, String)>,
}

impl Reporter for StepView {
    fn tape_write(&mut self, position: usize, _symbol: char) {
        self.written = Some(position);
    }

    fn tape_resized(&mut self, _tape: &[char]) {
        // Cell coordinates may have shifted; drop the write highlight.
        self.written = None;
        self.resized = true;
    }

    fn error(&mut self, line: usize, message: &str) {
        self.error = Some((line, message.to_string()));
    }
}

pub struct App {
    machine: TuringMachine,
    program_name: String,
    program_content: String,
    view: StepView,
    auto_play: bool,
    scroll_offset: usize,
    follow_active_line: bool,
    message: String,
    show_help: bool,
    pub(crate) keymap: Config<Action>,
}

impl App {
    pub fn new(
        program_name: String,
        program_content: String,
        input: &str,
        initial_state: &str,
    ) -> Result<Self, String> {
        let table = InstructionTable::parse(&program_content)
            .map_err(|e| format!("Failed to load program: {}", e))?;
        let machine = TuringMachine::new(table, input, initial_state);

        Ok(Self {
            machine,
            program_name,
            program_content,
            view: StepView::default(),
            keymap: Action::keymap_config(),
            auto_play: false,
            scroll_offset: 0,
            follow_active_line: true,
            message: "Press 'h' for help.".to_string(),
            show_help: false,
        })
    }

    pub fn render(&mut self, f: &mut Frame) {
        let inner_area = f.area().inner(Margin::new(1, 0));

        // Program info, middle (source + machine), status
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(inner_area);

        self.render_program_info(f, main_chunks[0]);

        let middle_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(50), // Source code
                Constraint::Length(1),
                Constraint::Percentage(50), // Machine
            ])
            .split(main_chunks[1]);

        self.render_source_code(f, middle_chunks[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(middle_chunks[2]);

        self.render_machine_state(f, right_chunks[0]);

        if self.show_help {
            self.render_help(f, right_chunks[1]);
        } else {
            self.render_tape(f, right_chunks[1]);
        }

        self.render_status(f, main_chunks[2]);
    }

    fn render_source_code(&mut self, f: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let active_line = self.machine.active_line();
        let error_line = self.view.error.as_ref().map(|(line, _)| *line);

        // Keep the highlighted line in view after each step.
        if self.follow_active_line && visible > 0 {
            if let Some(index) = error_line.or(active_line).map(|line| line - 1) {
                if index < self.scroll_offset {
                    self.scroll_offset = index;
                } else if index >= self.scroll_offset + visible {
                    self.scroll_offset = index + 1 - visible;
                }
            }
        }

        let comment_style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);

        let lines: Vec<Line> = self
            .program_content
            .lines()
            .enumerate()
            .map(|(index, text)| {
                let number = index + 1;
                let highlight = if Some(number) == error_line {
                    Style::default().bg(Color::Red).fg(Color::White)
                } else if Some(number) == active_line {
                    Style::default().bg(Color::Green).fg(Color::Black)
                } else {
                    Style::default()
                };

                let (code, comment) = match text.find(COMMENT) {
                    Some(at) => text.split_at(at),
                    None => (text, ""),
                };

                Line::from(vec![
                    Span::styled(format!("{number:>3} "), Style::default().fg(Color::DarkGray)),
                    Span::styled(code, highlight),
                    Span::styled(comment, comment_style.patch(highlight)),
                ])
            })
            .collect();

        let paragraph = section("Program", lines).scroll((self.scroll_offset as u16, 0));
        f.render_widget(paragraph, area);
    }

    fn render_program_info(&self, f: &mut Frame, area: Rect) {
        let table = self.machine.table();

        let text = vec![
            Line::from(vec![
                Span::styled("Program: ", Style::default().fg(Color::Yellow)),
                Span::raw(self.program_name.as_str()),
            ]),
            Line::from(vec![
                Span::styled("Initial State: ", Style::default().fg(Color::Yellow)),
                Span::raw(self.machine.initial_state()),
            ]),
            Line::from(vec![
                Span::styled("Instructions: ", Style::default().fg(Color::Yellow)),
                Span::raw(table.len().to_string()),
                Span::styled(" | Lines: ", Style::default().fg(Color::Yellow)),
                Span::raw(table.line_count().to_string()),
            ]),
        ];

        let paragraph = Paragraph::new(text)
            .block(block("Turing Machine Interpreter").title_alignment(Alignment::Center));

        f.render_widget(paragraph, area);
    }

    fn render_tape(&self, f: &mut Frame, area: Rect) {
        let head = self.machine.head();

        let cells: Vec<Span> = self
            .machine
            .tape()
            .iter()
            .enumerate()
            .map(|(i, &symbol)| {
                // Blank spans render poorly, so show the program-text blank instead.
                let symbol = if symbol == BLANK_SYMBOL {
                    INPUT_BLANK_SYMBOL
                } else {
                    symbol
                };

                let style = if i == head {
                    Style::default()
                        .bg(Color::Cyan)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD)
                } else if Some(i) == self.view.written {
                    Style::default().fg(Color::Magenta)
                } else {
                    Style::default()
                };

                Span::styled(format!(" {symbol} "), style)
            })
            .collect();

        let text_lines = vec![
            Line::from(cells),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "Head at position: {} (symbol: '{}') | Length: {}",
                    head,
                    self.machine.symbol(),
                    self.machine.tape().len()
                ),
                Style::default().fg(Color::Cyan),
            )),
        ];

        let paragraph = section("Tape", text_lines).wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_machine_state(&self, f: &mut Frame, area: Rect) {
        let step_count = self.machine.step_count();

        let (status_text, status_color) = if self.view.error.is_some() {
            ("ERROR", Color::Red)
        } else if self.machine.is_halted() {
            ("HALTED", Color::Red)
        } else if step_count == 0 {
            ("READY", Color::Blue)
        } else {
            ("RUNNING", Color::Green)
        };

        let active_line = self
            .machine
            .active_line()
            .map_or_else(|| "-".to_string(), |line| line.to_string());

        let text = vec![
            Line::from(vec![
                Span::styled("Current State: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    self.machine.state(),
                    Style::default()
                        .fg(status_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" | Steps: ", Style::default().fg(Color::Yellow)),
                Span::raw(step_count.to_string()),
                Span::styled(" | Status: ", Style::default().fg(Color::Yellow)),
                Span::styled(status_text, Style::default().fg(status_color)),
            ]),
            Line::from(vec![
                Span::styled("Active Line: ", Style::default().fg(Color::Cyan)),
                Span::raw(active_line),
            ]),
        ];

        let paragraph = section("Machine State", text);

        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from("Controls:"),
            Line::from("  Space - Execute one instruction"),
            Line::from("  r - Reset machine"),
            Line::from("  p - Toggle auto-play"),
            Line::from("  ↑ ↓ - Scroll the program"),
            Line::from("  h - Toggle this help"),
            Line::from("  q - Quit"),
            Line::from(""),
            Line::from("Program lines:"),
            Line::from("  <state> <symbol> <new_symbol> <l|r|*> <new_state>"),
            Line::from("  '*' matches anything, or keeps the old value"),
            Line::from("  '_' is the blank symbol; ';' starts a comment"),
            Line::from("  The instruction being executed is highlighted in green"),
        ];

        let paragraph = section("Help", help_text);

        f.render_widget(paragraph, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let hint = "h: help";
        let outer = block("Status");
        let inner = outer.inner(area);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(hint.len() as u16)])
            .split(inner);

        let auto_play_status = if self.auto_play { "ON" } else { "OFF" };
        let status = Line::from(vec![
            Span::raw("Auto-play: "),
            Span::styled(auto_play_status, Style::default().fg(Color::Yellow)),
            Span::raw(format!(" | {}", self.message)),
        ]);

        let hint = Text::from(
            Line::from(Span::styled(hint, Style::default().fg(Color::Yellow))).right_aligned(),
        );

        f.render_widget(outer, area);
        f.render_widget(status, chunks[0]);
        f.render_widget(hint, chunks[1]);
    }

    pub fn step_machine(&mut self) {
        if self.machine.is_halted() {
            self.message = "Machine is halted. Press 'r' to reset.".to_string();
            self.auto_play = false;
            return;
        }

        self.view.written = None;
        self.view.resized = false;
        self.follow_active_line = true;

        match self.machine.step_with(&mut self.view) {
            Step::Applied { line } => {
                self.message = if self.view.resized {
                    format!(
                        "Step {}: line {}, tape grew to {} cells",
                        self.machine.step_count(),
                        line,
                        self.machine.tape().len()
                    )
                } else {
                    format!("Step {}: line {}", self.machine.step_count(), line)
                };
            }
            Step::Halt(Halt::Ok) => {
                self.message = "Machine halted. Press 'r' to reset.".to_string();
                self.auto_play = false;
            }
            Step::Halt(Halt::Err(e)) => {
                self.message = e.to_string();
                self.auto_play = false;
            }
        }
    }

    pub fn reset_machine(&mut self) {
        self.machine.reset();
        self.view = StepView::default();
        self.message = "Machine reset".to_string();
        self.auto_play = false;
        self.scroll_offset = 0;
        self.follow_active_line = true;
    }

    pub fn toggle_auto_play(&mut self) {
        self.auto_play = !self.auto_play;
        self.message = format!(
            "Auto-play {}",
            if self.auto_play {
                "enabled"
            } else {
                "disabled"
            }
        );
    }

    pub fn is_auto_playing(&self) -> bool {
        self.auto_play && !self.machine.is_halted()
    }

    pub fn scroll_up(&mut self) {
        self.follow_active_line = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.follow_active_line = false;
        let last = self.program_content.lines().count().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + 1).min(last);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

fn section<'a>(title: &'a str, content: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(content).block(block(title))
}

fn block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .padding(BLOCK_PADDING)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(program: &str, input: &str) -> App {
        App::new("test".to_string(), program.to_string(), input, "0").unwrap()
    }

    #[test]
    fn test_step_reports_tape_growth() {
        let mut app = app("0 a b r 0\n", "a");

        app.step_machine();

        assert!(app.view.resized);
        assert_eq!(app.view.written, None);
        assert!(app.message.contains("tape grew to 2 cells"));
    }

    #[test]
    fn test_syntax_error_stops_auto_play() {
        let mut app = app("; header\n0 ab b r 0\n", "a");
        app.toggle_auto_play();

        app.step_machine();

        assert!(!app.is_auto_playing());
        assert_eq!(
            app.view.error,
            Some((2, "Symbol must be 1 character".to_string()))
        );
        assert!(app.message.contains("line 2"));
    }

    #[test]
    fn test_reset_clears_view() {
        let mut app = app("0 a b * 1\n", "a");

        app.step_machine();
        assert_eq!(app.view.written, Some(0));

        app.step_machine();
        app.reset_machine();

        assert_eq!(app.view.written, None);
        assert!(!app.machine.is_halted());
        assert_eq!(app.machine.tape_string(), "a");
    }

    #[test]
    fn test_scroll_is_bounded() {
        let mut app = app("0 a b * 1\n; two\n", "a");

        app.scroll_up();
        assert_eq!(app.scroll_offset, 0);

        app.scroll_down();
        app.scroll_down();
        assert_eq!(app.scroll_offset, 1);
    }
}
