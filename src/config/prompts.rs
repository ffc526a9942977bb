//! Prompt templates for Abitur.
//!
//! The defaults carry the admissions-assistant persona in Russian, matching
//! the knowledge base. Prompts can be customized by placing TOML files in the
//! custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for RAG response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Template used when the knowledge base produced usable context.
    pub grounded: String,
    /// Template used when nothing relevant was found.
    pub fallback: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            grounded: r#"Ты - виртуальный ассистент приемной комиссии университета. Твоя задача - точно отвечать на вопросы о поступлении, опираясь ТОЛЬКО на предоставленную информацию.

ИНФОРМАЦИЯ ИЗ БАЗЫ ЗНАНИЙ:
{{context}}

ЗАПРОС ПОЛЬЗОВАТЕЛЯ: {{question}}

ПРАВИЛА ОТВЕТА:
1. Используй ТОЛЬКО информацию из предоставленного контекста.
2. Если в контексте недостаточно информации для полного ответа, честно скажи об этом. Не додумывай факты.
3. Указывай источник информации, если он известен из контекста.
4. Отвечай кратко, структурированно и по делу.
5. Если вопрос касается разных программ (бакалавриат, магистратура, гимназия, СПО), четко разделяй информацию по каждой программе.

Твой ответ:"#
                .to_string(),

            fallback: r#"Ты - виртуальный ассистент приемной комиссии университета. Твоя задача - помогать абитуриентам и студентам с информацией об университете.

К сожалению, у меня нет точной информации по этому запросу в базе данных.

ЗАПРОС ПОЛЬЗОВАТЕЛЯ: {{question}}

ПРАВИЛА ОТВЕТА:
1. Честно признай, что у тебя нет точной информации по этому вопросу в базе данных.
2. Предложи обратиться в приемную комиссию: {{admissions_contact}}.
3. Не придумывай факты и не давай потенциально неверную информацию.

Твой ответ:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        // Deployments without a configured contact still render a sane fallback.
        prompts
            .variables
            .entry("admissions_contact".to_string())
            .or_insert_with(|| "телефон или сайт приемной комиссии университета".to_string());

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.grounded.contains("{{context}}"));
        assert!(prompts.rag.fallback.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_contact_default_is_set() {
        let prompts = Prompts::load(None, None).unwrap();
        assert!(prompts.variables.contains_key("admissions_contact"));
    }
}
