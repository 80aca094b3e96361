use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, IntoDiagnostic, Result};

use satchel::{env, NullTracer, Program, ProgramParser, RunEnvironment, TermTracer, Tracer};

/// Satchel is an interpreter toolchain for the mailroom robot puzzle language.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.mail` file to run with empty input and memory
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a `.mail` program and print the values it outputs
    Run {
        /// `.mail` file to run
        name: PathBuf,
        /// Initial input queue, front first
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        input: Vec<i64>,
        /// Initial memory cells; `_` leaves a cell empty
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        memory: Vec<Cell>,
        /// Print every instruction to stderr as it executes
        #[arg(short, long)]
        trace: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(long)]
        minimal: bool,
    },
    /// Check a `.mail` file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Place a watch on a `.mail` file to receive constant checker updates
    Watch {
        /// `.mail` file to watch
        name: PathBuf,
    },
}

/// One initial memory cell; `_` stands for an empty cell.
#[derive(Clone)]
struct Cell(Option<i64>);

impl FromStr for Cell {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "_" {
            Ok(Cell(None))
        } else {
            s.parse().map(|val| Cell(Some(val)))
        }
    }
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(satchel::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                input,
                memory,
                trace,
                minimal,
            } => {
                let memory = memory.into_iter().map(|cell| cell.0).collect();
                run(&name, input, memory, trace, minimal)
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let _ = parse(&contents)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
            Command::Watch { name } => watch(&name),
        }
    } else if let Some(path) = args.path {
        run(&path, Vec::new(), Vec::new(), false, false)
    } else {
        println!("\n~ satchel v{VERSION} ~");
        println!("{}", LOGO.truecolor(222, 165, 132).bold());
        println!("{SHORT_INFO}");
        std::process::exit(0);
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(
    name: &Path,
    input: Vec<i64>,
    memory: Vec<Option<i64>>,
    trace: bool,
    minimal: bool,
) -> Result<()> {
    use MsgColor::*;
    match name.extension() {
        Some(ext) if ext == "mail" => {}
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    }

    if !minimal {
        file_message(Green, "Parsing", name);
    }
    let contents = fs::read_to_string(name).into_diagnostic()?;
    let program = parse(&contents)?;

    let tracer: Box<dyn Tracer> = if trace || env::is_trace_enabled() {
        Box::new(TermTracer)
    } else {
        Box::new(NullTracer)
    };
    let mut machine = RunEnvironment::new(program, input, memory).with_tracer(tracer);

    if !minimal {
        message(Green, "Running", "mailroom program");
    }
    let state = machine.run()?;

    if minimal {
        for val in state.output() {
            println!("{val}");
        }
        return Ok(());
    }

    let output = state
        .output()
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    message(Cyan, "Output", output.as_str());
    match state.hand() {
        Some(val) => message(Cyan, "Hand", val.to_string().as_str()),
        None => message(Cyan, "Hand", "empty"),
    }
    file_message(Green, "Completed", name);
    Ok(())
}

fn watch(name: &Path) -> Result<()> {
    use MsgColor::*;
    if !name.exists() {
        bail!("File does not exist. Exiting...")
    }
    // Vim breaks if watching a single file
    let folder_path = match name.parent() {
        Some(pth) if pth.is_dir() => pth.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    // Clear screen and move cursor to top left
    print!("\x1B[2J\x1B[2;1H");
    file_message(Green, "Watching", name);
    message(Cyan, "Help", "press CTRL+C to exit");

    let name = name.to_path_buf();
    let mut watcher =
        Hotwatch::new_with_custom_delay(Duration::from_millis(500)).into_diagnostic()?;

    watcher
        .watch(folder_path, move |event: Event| match event.kind {
            // Watch remove for vim changes
            EventKind::Modify(_) | EventKind::Remove(_) => {
                // Clear screen
                print!("\x1B[2J\x1B[2;1H");
                file_message(Green, "Watching", &name);
                message(Green, "Re-checking", "file change detected");
                message(Cyan, "Help", "press CTRL+C to exit");

                // Makes reruns visually obvious
                sleep(Duration::from_millis(50));

                let contents = match fs::read_to_string(&name) {
                    Ok(cts) => cts,
                    Err(e) => {
                        eprintln!("{e}. Exiting...");
                        std::process::exit(1)
                    }
                };
                match parse(&contents) {
                    Ok(_) => message(Green, "Success", "no errors found!"),
                    Err(e) => println!("\n{:?}", e),
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        })
        .into_diagnostic()?;
    watcher.run();
    Ok(())
}

/// Parse source text into a subroutine table for running or checking.
fn parse(contents: &str) -> Result<Program> {
    ProgramParser::new(contents).parse()
}

const LOGO: &str = r#"
    ___________________
   |\_________________/|
   | \               / |
   |  \             /  |
   |   \___________/   |
   |   [  SATCHEL  ]   |
   |___________________|"#;

const SHORT_INFO: &str = r"
Welcome to satchel, an interpreter toolchain for mailroom robot programs.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
