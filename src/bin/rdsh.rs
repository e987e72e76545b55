/// Interactive ramdisk shell

use clap::Parser;
use demodisk::cli::{init_logging, ShellOptions};
use demodisk::shell::COMMAND_NAMES;
use demodisk::{Flow, Session};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::io::Stdout;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rdsh")]
#[command(about = "Edit a QNX demodisk ramdisk", long_about = None)]
struct Cli {
    /// Ramdisk file (.ramdisk, .z or .qnxde)
    #[arg(short, long)]
    image: PathBuf,

    /// Script of commands to run first
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Exit after the script instead of prompting
    #[arg(long)]
    batch: bool,
}

/// Command completer for the prompt
struct CommandCompleter;

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only the command word
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = COMMAND_NAMES
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".rdsh_history");
        p
    })
}

fn prompt(session: &mut Session<Stdout>) -> rustyline::Result<()> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandCompleter));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let input = match rl.readline("rdsh> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match session.execute(input) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => println!("Error: {}", e),
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let options = ShellOptions {
        image: cli.image,
        script: cli.script,
        batch: cli.batch,
    };

    let result = options
        .validate()
        .and_then(|_| options.read_script())
        .and_then(|script| {
            let mut session = Session::open(&options.image, std::io::stdout())?;
            Ok((session_script(&mut session, script.as_deref())?, session))
        });

    let (flow, mut session) = match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if flow == Flow::Quit || options.batch {
        return ExitCode::SUCCESS;
    }

    println!("=== rdsh ===");
    println!("Editing {}. Type 'help' for available commands\n", options.image.display());
    match prompt(&mut session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn session_script(session: &mut Session<Stdout>, script: Option<&str>) -> demodisk::Result<Flow> {
    match script {
        Some(script) => session.run_script(script),
        None => Ok(Flow::Continue),
    }
}
