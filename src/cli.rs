use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "loupe")]
#[command(about = "Browse the repositories under a directory and pick a file by typing a few fragments of its path")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Directory to scan for repositories (repeatable, defaults to the current directory)
    #[arg(short, long = "root")]
    pub roots: Vec<PathBuf>,
    /// How many directory levels below each root to search
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// File to preselect; its repository is opened directly
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive browser (default)
    Run(RunArgs),
    /// Render one frame of a JSON session to text
    Screenshot {
        /// Path to the JSON session file
        #[arg(short, long)]
        session: PathBuf,
        /// Output file for the screenshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Terminal width for rendering
        #[arg(long, default_value = "80")]
        width: u16,
        /// Terminal height for rendering
        #[arg(long, default_value = "24")]
        height: u16,
    },
    /// Run a headless script against the navigator
    Test {
        /// Path to the script file
        #[arg(short, long)]
        script: PathBuf,
        /// Session to start from (defaults to a small built-in file list)
        #[arg(long)]
        session: Option<PathBuf>,
        /// Write screenshots instead of comparing them
        #[arg(long)]
        overwrite: bool,
        /// Print every step and log to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}
