mod cli;
mod logging;
mod script;

use anyhow::Context as _;
use clap::Parser;
use folio_editor::EditorConfig;

use crate::cli::CliArgs;
use crate::script::Script;

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = CliArgs::parse();

    let config = EditorConfig::load_or_default(args.config.as_deref());
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::demo()?,
    };

    let report = script.run(config)?;
    let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{json}");
    Ok(())
}
