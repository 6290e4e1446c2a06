//! Prompt templates for EduAI.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the study-assistant conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// Fixed instructions placed at the top of every turn.
    pub instructions: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            instructions: "You are an AI Study Buddy with access to structured Canvas course data. \
Your role is to help the user plan their study, answer questions about upcoming assignments and quizzes, \
and provide personalized study plans. Use the provided context to answer questions accurately. \
When a study plan is requested (e.g., 'Plan my week' or 'Give me a five-day study plan'), \
output a neatly formatted plan with bold headings and a table or bullet list format. \
If asked about upcoming assignments or quizzes, automatically select the most imminent items based on due dates. \
Take special note of all due dates and ALWAYS use the {{timezone}} timezone when referring to them. \
Pay close attention to the current date and time. If an assignment is due today at 11:59 PM and it is still earlier \
in the day, make sure to indicate that it is due TODAY at 11:59 PM, not tomorrow. \
Be precise with time information and understand time sensitivity. \
Assume that the current week is the relevant week if not specified, and never ask the user clarifying questions. \
Respond in a friendly, helpful, and professional manner, ensuring that your response is presentable and well-structured. \
If some data is missing, fill in plausible details to ensure a complete and helpful answer. \
Also do not use terms like \"based on your given data\" etc. You should sound natural."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The chat instructions with `{{timezone}}` and custom variables filled in.
    pub fn chat_instructions(&self, timezone: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("timezone".to_string(), timezone.to_string());
        self.render_with_custom(&self.chat.instructions, &vars)
    }
}
