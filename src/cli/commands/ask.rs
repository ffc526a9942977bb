//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{RagEngine, RagSource};
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_chunks: usize,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    settings.rag.max_context_chunks = max_chunks as u32;

    let orchestrator = Arc::new(Orchestrator::new(settings.clone())?);
    let mut engine = RagEngine::new(orchestrator, &settings);
    if let Some(model) = model {
        engine = engine.with_model(&model);
    }

    let spinner = Output::spinner("Ищу ответ в базе знаний...");

    match engine.ask(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            match response.source {
                RagSource::Knowledge => {
                    Output::info(&format!(
                        "Ответ основан на {} фрагментах базы знаний.",
                        response.context.len()
                    ));
                }
                RagSource::Generic => {
                    Output::warning("В базе знаний нет точной информации по этому вопросу.");
                }
                RagSource::Unavailable => {
                    Output::warning("Сервис генерации ответов временно недоступен.");
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Не удалось получить ответ: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
