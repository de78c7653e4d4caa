use clap::Parser;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};
use turing_interpreter::types::{DEFAULT_INITIAL_STATE, DEFAULT_PROGRAM_FILE};
use turing_interpreter::{
    analyze, Event, Halt, InstructionTable, ProgramLoader, Step, TuringMachine,
    TuringMachineError,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  turing-cli -i 1011 -f programs/binary-increment.txt
  cat programs/unary-addition.txt | turing-cli -i 11+1 -f - -d")]
struct Cli {
    /// The initial tape contents
    #[clap(short = 'i', long, required_unless_present = "check")]
    initial_input: Option<String>,

    /// The state the machine starts in
    #[clap(short = 's', long, default_value = DEFAULT_INITIAL_STATE)]
    initial_state: String,

    /// The program file to execute, or `-` to read it from stdin
    #[clap(short = 'f', long, default_value = DEFAULT_PROGRAM_FILE)]
    program_file: PathBuf,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print every reported event as a JSON line
    #[clap(short = 'e', long, conflicts_with = "debug")]
    events: bool,

    /// Analyze the program instead of running it
    #[clap(long)]
    check: bool,

    /// Stop after this many steps
    #[clap(long)]
    max_steps: Option<usize>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// How an invocation ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    /// No instruction matched.
    Halted,
    /// `--max-steps` was reached first.
    StepLimit,
    /// `--check` found no errors.
    Checked,
    /// A reached instruction was malformed, or `--check` found errors.
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Failed => ExitCode::FAILURE,
            Outcome::Halted | Outcome::StepLimit | Outcome::Checked => ExitCode::SUCCESS,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }
}

fn run(cli: &Cli) -> Result<Outcome, Box<dyn Error>> {
    let source = load_source(&cli.program_file)?;
    let table = ProgramLoader::load_program_from_string(&source)?;
    info!(
        instructions = table.len(),
        lines = table.line_count(),
        "program loaded"
    );

    execute(cli, table, &mut io::stdout().lock())
}

/// Reads the program text from the named file, or from stdin for `-`.
fn load_source(program_file: &Path) -> Result<String, TuringMachineError> {
    if ProgramLoader::is_stdin(program_file) && atty::is(atty::Stream::Stdin) {
        eprintln!("Reading the program from stdin, end it with Ctrl-D");
    }
    ProgramLoader::read_source_or_stdin(program_file)
}

/// Runs or checks `table` as `cli` asks, writing results to `out`.
fn execute<W: Write>(
    cli: &Cli,
    table: InstructionTable,
    out: &mut W,
) -> Result<Outcome, Box<dyn Error>> {
    if cli.check {
        return Ok(check(&table, &cli.initial_state, out)?);
    }

    let input = cli.initial_input.as_deref().unwrap_or_default();
    let mut machine = TuringMachine::new(table, input, &cli.initial_state);

    if cli.debug {
        print_state(out, &machine, None)?;
    }

    let mut events: Vec<Event> = Vec::new();
    let halt = loop {
        if cli
            .max_steps
            .is_some_and(|max| machine.step_count() >= max)
        {
            info!(steps = machine.step_count(), "step limit reached");
            break None;
        }

        let step = if cli.events {
            let step = machine.step_with(&mut events);
            print_events(out, &mut events)?;
            step
        } else {
            machine.step()
        };

        match step {
            Step::Applied { line } => {
                if cli.debug {
                    print_state(out, &machine, Some(line))?;
                }
            }
            Step::Halt(halt) => break Some(halt),
        }
    };

    let outcome = match halt {
        Some(Halt::Ok) => Outcome::Halted,
        Some(Halt::Err(e)) => {
            eprintln!("{}", e);
            return Ok(Outcome::Failed);
        }
        None => Outcome::StepLimit,
    };

    if !cli.events {
        if cli.debug {
            match outcome {
                Outcome::StepLimit => writeln!(out, "\nStep limit reached.")?,
                _ => writeln!(out, "\nMachine halted.")?,
            }
            writeln!(out, "\nFinal tape:")?;
        }
        writeln!(out, "{}", machine.tape_string())?;
        writeln!(out, "State: {}", machine.state())?;
    }

    Ok(outcome)
}

fn check<W: Write>(
    table: &InstructionTable,
    initial_state: &str,
    out: &mut W,
) -> io::Result<Outcome> {
    let diagnostics = analyze(table, Some(initial_state));

    for diagnostic in &diagnostics {
        let severity = if diagnostic.is_error() {
            "error"
        } else {
            "warning"
        };
        writeln!(out, "{}: {}", severity, diagnostic)?;
    }

    if diagnostics.iter().any(|d| d.is_error()) {
        Ok(Outcome::Failed)
    } else {
        writeln!(
            out,
            "{} instructions in {} lines, no errors",
            table.len(),
            table.line_count()
        )?;
        Ok(Outcome::Checked)
    }
}

fn print_state<W: Write>(
    out: &mut W,
    machine: &TuringMachine,
    line: Option<usize>,
) -> io::Result<()> {
    let line = line.map_or_else(|| "-".to_string(), |line| line.to_string());

    writeln!(
        out,
        "Step: {}, Line: {}, State: {}, Tape: [{}], Head: {}",
        machine.step_count(),
        line,
        machine.state(),
        machine.tape_string(),
        machine.head()
    )
}

fn print_events<W: Write>(out: &mut W, events: &mut Vec<Event>) -> Result<(), Box<dyn Error>> {
    for event in events.drain(..) {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }
    Ok(())
}
