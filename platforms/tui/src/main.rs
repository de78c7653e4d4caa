mod app;

use action::Action;
use app::App;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::path::PathBuf;
use std::{error::Error, io, time::Duration};
use turing_interpreter::types::{DEFAULT_INITIAL_STATE, DEFAULT_PROGRAM_FILE};
use turing_interpreter::ProgramLoader;

/// A Turing machine interpreter with a Terminal User Interface.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  turing-tui -i 1011 -f programs/binary-increment.txt
  cat programs/unary-addition.txt | turing-tui -i 11+1 -f -")]
struct Cli {
    /// The initial tape contents
    #[clap(short = 'i', long)]
    initial_input: String,

    /// The state the machine starts in
    #[clap(short = 's', long, default_value = DEFAULT_INITIAL_STATE)]
    initial_state: String,

    /// Path to the program file, or `-` to read it from stdin
    #[clap(short = 'f', long, default_value = DEFAULT_PROGRAM_FILE)]
    program_file: PathBuf,
}

/// Represents the state of the application loop.
#[derive(PartialEq)]
enum AppState {
    Running,
    ShouldQuit,
}

/// A wrapper around the terminal to ensure it's restored on drop.
struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    /// Creates a new TUI.
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Errors are ignored; there is nothing left to report them to.
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if atty::isnt(atty::Stream::Stdout) {
        eprintln!("Error: turing-tui must run in a terminal; use turing-cli for scripts");
        std::process::exit(1);
    }

    // Load the program before initializing the TUI, so a missing file is reported on a
    // normal terminal.
    let app = match load_program(&cli) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut tui = Tui::new()?;

    run_app(&mut tui.terminal, app)?;

    Ok(())
}

/// Loads the program from the given file, or from stdin for `-`.
fn load_program(cli: &Cli) -> Result<App, String> {
    let name = if ProgramLoader::is_stdin(&cli.program_file) {
        "<stdin>".to_string()
    } else {
        cli.program_file.display().to_string()
    };

    let source =
        ProgramLoader::read_source_or_stdin(&cli.program_file).map_err(|e| e.to_string())?;
    App::new(name, source, &cli.initial_input, &cli.initial_state)
}


/// Runs the main application loop.
fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = if app.is_auto_playing() {
            Duration::from_millis(250)
        } else {
            Duration::from_millis(100)
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if handle_key_event(&mut app, key) == AppState::ShouldQuit {
                    return Ok(());
                }
            }
        }

        if app.is_auto_playing() {
            app.step_machine();
        }
    }
}

/// Handles key events and updates the application state.
fn handle_key_event(app: &mut App, key: KeyEvent) -> AppState {
    if let Some(action) = app.keymap.get(&key) {
        match action {
            Action::Quit => return AppState::ShouldQuit,
            Action::Reset => app.reset_machine(),
            Action::Step => app.step_machine(),
            Action::ToggleAutoPlay => app.toggle_auto_play(),
            Action::ToggleHelp => app.toggle_help(),
            Action::ScrollUp => app.scroll_up(),
            Action::ScrollDown => app.scroll_down(),
        }
    }
    AppState::Running
}
