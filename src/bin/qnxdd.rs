/// Split a demodisk image into part files and join them back

use clap::Parser;
use demodisk::cli::{init_logging, run_split, SplitMode, SplitOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "qnxdd")]
#[command(about = "Unpack, repack or describe a QNX demodisk image", long_about = None)]
struct Cli {
    /// unpack, pack or info
    #[arg(short, long, default_value = "unpack", value_parser = parse_mode)]
    mode: SplitMode,

    /// Demodisk image to unpack or describe
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Working directory for part files
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,

    /// Packed image (default: qnxdemo_repack.dat in the working directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_mode(s: &str) -> Result<SplitMode, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let options = SplitOptions {
        mode: cli.mode,
        input: cli.input,
        workdir: cli.workdir,
        output: cli.output,
    };

    match run_split(&options) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
