/// Blank programs out of the execute-in-place image

use clap::Parser;
use demodisk::cli::{init_logging, run_xip, XipOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "xipclean")]
#[command(about = "Remove programs from a QNX demodisk xip image", long_about = None)]
struct Cli {
    /// XIP image, usually xip.z
    #[arg(short, long)]
    input: PathBuf,

    /// Program to remove; repeat for several (default: cool)
    #[arg(short, long)]
    remove: Vec<String>,

    /// Output file (default: rewrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let options = XipOptions {
        input: cli.input,
        remove: cli.remove,
        output: cli.output,
    };

    match run_xip(&options) {
        Ok(output) => {
            println!("Removed {} from {}", options.programs().join(", "), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
