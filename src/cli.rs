use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "docsift",
    about = "Scan document trees and record the files that mention your keywords"
)]
pub struct Cli {
    /// Where results.redb, fulltext/ and faces/ live
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors; hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a directory tree and record every keyword match
    Scan(ScanArgs),
    /// Show the output location and record count
    Status(StatusArgs),
    /// List recorded matches
    Records(RecordsArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Scan --

#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Root of the tree to scan
    pub root: PathBuf,

    /// Number of files processed in parallel
    #[arg(
        short = 'j',
        long,
        default_value_t = docsift::pipeline::DEFAULT_WORKERS as u32,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub workers: u32,

    /// Keyword file, one keyword per line (default: built-in vocabulary)
    #[arg(short, long)]
    pub keywords: Option<PathBuf>,

    /// Skip paths (relative to the root) matching this glob; repeatable
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Disable face detection on images
    #[arg(long)]
    pub no_faces: bool,

    /// SeetaFace frontal model file used for face detection
    #[arg(long, env = "DOCSIFT_FACE_MODEL")]
    pub face_model: Option<PathBuf>,

    /// Smallest face edge, in pixels, worth keeping
    #[arg(long, default_value_t = docsift::faces::DEFAULT_MIN_FACE_SIZE)]
    pub min_face_size: u32,

    /// Directory holding tesseract language data
    #[arg(long, value_name = "DIR")]
    pub tessdata: Option<PathBuf>,

    /// OCR language (tesseract traineddata name)
    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Records --

#[derive(Debug, Parser)]
pub struct RecordsArgs {
    /// Show at most this many records
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output full records as a JSON array
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docsift",
            &mut std::io::stdout(),
        );
    }
}
