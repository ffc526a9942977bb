//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Поиск...");
    let results = orchestrator.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("Ничего не найдено по этому запросу.");
            } else {
                Output::success(&format!("Найдено результатов: {}", results.len()));

                for result in &results {
                    Output::search_result(
                        &result.metadata.source,
                        &result.metadata.section,
                        result.score,
                        &result.text,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Поиск не удался: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
