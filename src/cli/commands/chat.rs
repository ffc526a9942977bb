//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::rag::RagEngine;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    let orchestrator = Arc::new(Orchestrator::new(settings.clone())?);
    let mut engine = RagEngine::new(orchestrator, &settings);
    if let Some(model) = model {
        engine = engine.with_model(&model);
    }

    println!("\n{}", style("Abitur Chat").bold().cyan());
    println!(
        "{}\n",
        style("Задавайте вопросы о поступлении. 'exit' для выхода, 'clear' для сброса диалога.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Вы:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        stdin.lock().read_line(&mut input)?;

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("До свидания!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            engine.clear_history();
            Output::info("История диалога очищена.");
            continue;
        }

        match engine.ask(input).await {
            Ok(response) => {
                println!("\n{} {}\n", style("Abitur:").cyan().bold(), response.answer);
            }
            Err(e) => {
                Output::error(&format!("Ошибка: {}", e));
            }
        }
    }

    Ok(())
}
