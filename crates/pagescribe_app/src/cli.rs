use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pagescribe")]
#[command(about = "Resumable novel and web page downloader", long_about = None)]
pub struct Cli {
    /// RON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding run checkpoints
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Directory exported files are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download every chapter of a novel into one text file
    Novel {
        /// Index page of the novel
        index_url: String,
    },
    /// Scrape a list of URLs into one XML document bundle
    Urls {
        /// File with one URL per line, or `-` for stdin
        input: String,

        /// Checkpoint name; derived from the list when omitted
        #[arg(long)]
        run_id: Option<String>,

        /// Shortest pause between pages, in seconds
        #[arg(long)]
        delay_min: Option<u64>,

        /// Longest pause between pages, in seconds
        #[arg(long)]
        delay_max: Option<u64>,

        /// Load pages in a Chromium tab instead of plain HTTP
        #[arg(long)]
        chrome: bool,
    },
    /// Export what an interrupted run has collected so far
    SavePartial { run_id: String },
    /// Show the saved progress of a run
    Status { run_id: String },
}
