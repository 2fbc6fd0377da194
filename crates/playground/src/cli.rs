use std::path::PathBuf;

use clap::Parser;

/// Run a scripted editing session against an in-memory backend
#[derive(Parser, Debug)]
#[command(name = "folio-playground", version)]
pub struct CliArgs {
    /// Editor config (JSON); defaults apply when missing or unreadable
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Script of editing steps (JSON); runs the built-in demo when omitted
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,
}
