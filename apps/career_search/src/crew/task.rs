use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::error;

use crate::crew::agent::Agent;
use crate::crew::config::{load_config, TaskConfig};
use crate::crew::context::Context;
use crate::errors::AppError;
use crate::llm_client::prompts::{render_template, CONTEXT_HEADER, TASK_PROMPT_TEMPLATE};

const QUERY_PLACEHOLDER: &str = "{query}";
const OUTPUT_SCHEMA_PLACEHOLDER: &str = "{output_schema}";

/// A unit of work bound to the agent that performs it.
#[derive(Debug)]
pub struct Task {
    name: String,
    description: String,
    expected_output: String,
    agent: Arc<Agent>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    #[allow(dead_code)]
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// The user prompt for this task, with earlier outputs appended when there are any.
    pub fn prompt(&self, context: &Context) -> String {
        let context = if context.is_empty() {
            String::new()
        } else {
            format!("{CONTEXT_HEADER}{}\n", context.render())
        };

        render_template(
            TASK_PROMPT_TEMPLATE,
            &[
                ("description", self.description.as_str()),
                ("expected_output", self.expected_output.as_str()),
                ("context", context.as_str()),
            ],
        )
    }
}

/// Builds tasks from `configs/tasks.yml`.
pub struct TasksFactory {
    config: HashMap<String, TaskConfig>,
}

impl TasksFactory {
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self, AppError> {
        Ok(Self {
            config: load_config(config_path)?,
        })
    }

    pub fn from_config(config: HashMap<String, TaskConfig>) -> Self {
        Self { config }
    }

    /// `query` fills `{query}` in the description and `output_schema` fills
    /// `{output_schema}` in the expected output. A value whose placeholder is absent is ignored.
    pub fn create_task(
        &self,
        task_type: &str,
        agent: Arc<Agent>,
        query: Option<&str>,
        output_schema: Option<&str>,
    ) -> Result<Task, AppError> {
        let task_config = self
            .config
            .get(task_type)
            .ok_or_else(|| AppError::ConfigNotFound {
                kind: "task",
                key: task_type.to_string(),
            })?;

        let description = fill_placeholder(&task_config.description, QUERY_PLACEHOLDER, query);
        let expected_output = fill_placeholder(
            &task_config.expected_output,
            OUTPUT_SCHEMA_PLACEHOLDER,
            output_schema,
        );

        for (field, value) in [
            ("description", &description),
            ("expected_output", &expected_output),
        ] {
            if value.trim().is_empty() {
                error!("Error creating task: '{task_type}' has no {field}");
                return Err(AppError::Construction(format!(
                    "task '{task_type}' has no {field}"
                )));
            }
        }

        Ok(Task {
            name: task_type.to_string(),
            description: dedent(&description),
            expected_output: dedent(&expected_output),
            agent,
        })
    }
}

fn fill_placeholder(template: &str, placeholder: &str, value: Option<&str>) -> String {
    match value {
        Some(value) if template.contains(placeholder) => template.replace(placeholder, value),
        _ => template.to_string(),
    }
}

/// Removes the whitespace prefix shared by all non-blank lines.
/// Whitespace-only lines become empty.
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(|common, indent| {
            let shared = common
                .char_indices()
                .zip(indent.chars())
                .take_while(|((_, a), b)| a == b)
                .last()
                .map_or(0, |((i, c), _)| i + c.len_utf8());
            &common[..shared]
        })
        .unwrap_or("");

    let mut out = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}
