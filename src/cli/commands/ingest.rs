//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let knowledge_dir = settings.knowledge_dir();
    if !knowledge_dir.is_dir() {
        Output::warning(&format!(
            "Knowledge directory does not exist: {}",
            knowledge_dir.display()
        ));
        Output::info("Put .txt, .md, .csv or .tsv files there and run 'abitur ingest' again.");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Ingesting knowledge directory...");
    let added = orchestrator.initialize(force).await;
    spinner.finish_and_clear();

    match added {
        Ok(0) if !force => {
            Output::info("Vector store is already populated. Use --force to re-ingest.");
        }
        Ok(count) => {
            Output::success(&format!("Ingested {} chunks into the vector store.", count));
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
