//! Clear command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Run the clear command.
pub async fn run_clear(yes: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Clear) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if !yes && !confirm("Remove all records from the vector store?")? {
        Output::info("Cancelled.");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let store = orchestrator.vector_store();

    store.initialize().await?;
    let count = store.count().await?;
    store.clear().await?;

    Output::success(&format!("Removed {} records.", count));
    Ok(())
}

/// Prompt user for yes/no confirmation.
fn confirm(message: &str) -> io::Result<bool> {
    print!("{} {} {} ", style("?").cyan(), message, style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
