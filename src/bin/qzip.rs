/// Convert between .ramdisk, .z and .qnxde files

use clap::Parser;
use demodisk::cli::{init_logging, run_qzip, QzipOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "qzip")]
#[command(about = "Compress or expand QNX demodisk files; direction follows the input extension", long_about = None)]
struct Cli {
    /// Input file (.ramdisk, .z or .qnxde)
    #[arg(short, long)]
    input: PathBuf,

    /// Cipher the compressed output as a .qnxde extension
    #[arg(short, long)]
    extension: bool,

    /// Output file (default: input with the target extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let options = QzipOptions {
        input: cli.input,
        output: cli.output,
        extension: cli.extension,
    };

    match run_qzip(&options) {
        Ok((output, size)) => {
            println!("Wrote {} ({} bytes)", output.display(), size);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
