//! Agents: role-configured actors bound to a language model and a set of tools.
//!
//! An agent runs one task through a bounded ReAct loop. The model either names a tool
//! (`Action:` / `Action Input:`) and receives an `Observation:`, or answers with
//! `Final Answer:`. Tool failures abort the task.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::crew::config::{load_config, AgentConfig};
use crate::crew::context::Context;
use crate::crew::task::Task;
use crate::errors::AppError;
use crate::llm_client::prompts::{
    render_template, AGENT_SYSTEM_TEMPLATE, FORCE_FINAL_ANSWER, NO_TOOLS_PROTOCOL, TOOL_PROTOCOL_TEMPLATE,
    UNKNOWN_TOOL_OBSERVATION,
};
use crate::llm_client::{ChatMessage, ChatModel};
use crate::tools::Tool;

/// Tool calls allowed per task before the agent is told to answer.
pub const MAX_ITERATIONS: usize = 15;

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const OBSERVATION: &str = "Observation:";

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentOptions {
    pub verbose: bool,
    /// Carried for parity with the crew config; sequential crews never delegate.
    pub allow_delegation: bool,
}

pub struct Agent {
    role: String,
    goal: String,
    backstory: String,
    tools: Vec<Arc<dyn Tool>>,
    llm: Arc<dyn ChatModel>,
    options: AgentOptions,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("tools", &self.tool_names())
            .field("options", &self.options)
            .finish()
    }
}

/// One parsed model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Action { tool: String, input: String },
    FinalAnswer(String),
}

impl Agent {
    pub fn role(&self) -> &str {
        &self.role
    }

    #[allow(dead_code)]
    pub fn goal(&self) -> &str {
        &self.goal
    }

    #[allow(dead_code)]
    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    #[allow(dead_code)]
    pub fn options(&self) -> AgentOptions {
        self.options
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    fn system_prompt(&self) -> String {
        let tools = if self.tools.is_empty() {
            NO_TOOLS_PROTOCOL.to_string()
        } else {
            let descriptions = self
                .tools
                .iter()
                .map(|t| format!("{}: {}", t.name(), t.description()))
                .collect::<Vec<_>>()
                .join("\n");
            render_template(
                TOOL_PROTOCOL_TEMPLATE,
                &[
                    ("tool_descriptions", descriptions.as_str()),
                    ("tool_names", self.tool_names().join(", ").as_str()),
                ],
            )
        };

        render_template(
            AGENT_SYSTEM_TEMPLATE,
            &[
                ("role", self.role.as_str()),
                ("goal", self.goal.as_str()),
                ("backstory", self.backstory.trim()),
                ("tools", tools.as_str()),
            ],
        )
    }

    /// Runs `task` to a final answer, with `context` holding the earlier task outputs.
    pub async fn execute(&self, task: &Task, context: &Context) -> Result<String, AppError> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(task.prompt(context)),
        ];

        for iteration in 0..MAX_ITERATIONS {
            let reply = self.llm.chat(&messages).await?;
            if self.options.verbose {
                info!("[{}] {}", self.role, reply.trim());
            }

            match parse_agent_step(&reply) {
                AgentStep::FinalAnswer(answer) => return Ok(answer),
                AgentStep::Action { tool, input } => {
                    debug!(role = %self.role, iteration, %tool, "Agent requested tool");
                    let observation = self.use_tool(&tool, &input).await?;
                    messages.push(ChatMessage::assistant(truncate_at_observation(&reply)));
                    messages.push(ChatMessage::user(observation));
                }
            }
        }

        warn!(
            "[{}] reached {} tool calls without a final answer",
            self.role, MAX_ITERATIONS
        );
        messages.push(ChatMessage::user(FORCE_FINAL_ANSWER));
        let reply = self.llm.chat(&messages).await?;
        Ok(match parse_agent_step(&reply) {
            AgentStep::FinalAnswer(answer) => answer,
            AgentStep::Action { .. } => reply.trim().to_string(),
        })
    }

    async fn use_tool(&self, name: &str, input: &str) -> Result<String, AppError> {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!("[{}] asked for unknown tool '{name}'", self.role);
            let tool_names = self.tool_names().join(", ");
            return Ok(render_template(
                UNKNOWN_TOOL_OBSERVATION,
                &[("tool", name), ("tool_names", tool_names.as_str())],
            ));
        };

        let output = tool.run(input).await.map_err(|e| {
            error!("[{}] tool '{name}' failed: {e}", self.role);
            e
        })?;
        Ok(format!("{OBSERVATION} {output}"))
    }
}

/// Parses a model reply into a tool action or a final answer.
/// An action written before any `Final Answer:` wins; a reply with neither marker is the answer.
pub fn parse_agent_step(reply: &str) -> AgentStep {
    let final_at = reply.find(FINAL_ANSWER);
    let action_at = reply.find(ACTION);

    if let Some(action_at) = action_at {
        if final_at.map_or(true, |f| action_at < f) {
            if let Some(step) = parse_action(&reply[action_at..]) {
                return step;
            }
        }
    }

    match final_at {
        Some(at) => AgentStep::FinalAnswer(reply[at + FINAL_ANSWER.len()..].trim().to_string()),
        None => AgentStep::FinalAnswer(reply.trim().to_string()),
    }
}

fn parse_action(text: &str) -> Option<AgentStep> {
    let after_action = &text[ACTION.len()..];
    let tool_line = after_action.lines().next()?.trim();
    let tool = strip_quotes(tool_line.trim_matches(|c| c == '[' || c == ']'));
    if tool.is_empty() {
        return None;
    }

    let input = match after_action.find(ACTION_INPUT) {
        Some(at) => {
            let rest = &after_action[at + ACTION_INPUT.len()..];
            let rest = rest.find(OBSERVATION).map_or(rest, |end| &rest[..end]);
            strip_quotes(rest.trim())
        }
        None => String::new(),
    };

    Some(AgentStep::Action { tool, input })
}

fn strip_quotes(s: &str) -> String {
    s.trim().trim_matches('"').trim_matches('`').trim().to_string()
}

/// The model sometimes invents its own `Observation:`; keep only what precedes it.
fn truncate_at_observation(reply: &str) -> String {
    match reply.find(OBSERVATION) {
        Some(at) => reply[..at].trim_end().to_string(),
        None => reply.trim_end().to_string(),
    }
}

/// Builds agents from `configs/agents.yml`.
pub struct AgentsFactory {
    config: HashMap<String, AgentConfig>,
}

impl AgentsFactory {
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self, AppError> {
        Ok(Self {
            config: load_config(config_path)?,
        })
    }

    pub fn from_config(config: HashMap<String, AgentConfig>) -> Self {
        Self { config }
    }

    /// Binds the role/goal/backstory of `agent_type` verbatim to the given tools and model.
    pub fn create_agent(
        &self,
        agent_type: &str,
        llm: Arc<dyn ChatModel>,
        tools: Vec<Arc<dyn Tool>>,
        options: AgentOptions,
    ) -> Result<Agent, AppError> {
        let agent_config = self
            .config
            .get(agent_type)
            .ok_or_else(|| AppError::ConfigNotFound {
                kind: "agent",
                key: agent_type.to_string(),
            })?;

        for (field, value) in [
            ("role", &agent_config.role),
            ("goal", &agent_config.goal),
            ("backstory", &agent_config.backstory),
        ] {
            if value.trim().is_empty() {
                error!("Error creating agent: '{agent_type}' has no {field}");
                return Err(AppError::Construction(format!(
                    "agent '{agent_type}' has no {field}"
                )));
            }
        }

        Ok(Agent {
            role: agent_config.role.clone(),
            goal: agent_config.goal.clone(),
            backstory: agent_config.backstory.clone(),
            tools,
            llm,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::task::TasksFactory;
    use crate::crew::testing::{EchoTool, FailingTool, ScriptedModel};
    use crate::crew::config::TaskConfig;

    fn factory() -> AgentsFactory {
        let mut config = HashMap::new();
        config.insert(
            "job_search_expert".to_string(),
            AgentConfig {
                role: "Job Search Expert".to_string(),
                goal: "Find relevant jobs".to_string(),
                backstory: "A seasoned recruiter.".to_string(),
            },
        );
        config.insert(
            "broken".to_string(),
            AgentConfig {
                role: "Broken".to_string(),
                goal: String::new(),
                backstory: "none".to_string(),
            },
        );
        AgentsFactory::from_config(config)
    }

    fn task_for(agent: Arc<Agent>) -> Task {
        let mut config = HashMap::new();
        config.insert(
            "job_search".to_string(),
            TaskConfig {
                description: "Find jobs for {query}".to_string(),
                expected_output: "A list of jobs".to_string(),
            },
        );
        TasksFactory::from_config(config)
            .create_task("job_search", agent, Some("Rust"), None)
            .unwrap()
    }

    #[test]
    fn test_create_agent_binds_config_verbatim() {
        let agent = factory()
            .create_agent(
                "job_search_expert",
                ScriptedModel::arc(vec![]),
                vec![Arc::new(EchoTool)],
                AgentOptions::default(),
            )
            .unwrap();

        assert_eq!(agent.role(), "Job Search Expert");
        assert_eq!(agent.goal(), "Find relevant jobs");
        assert_eq!(agent.backstory(), "A seasoned recruiter.");
        assert_eq!(agent.tool_names(), vec!["echo"]);
        assert!(!agent.options().allow_delegation);
    }

    #[test]
    fn test_create_agent_unknown_type_is_not_found() {
        let err = factory()
            .create_agent("chef", ScriptedModel::arc(vec![]), vec![], AgentOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigNotFound { kind: "agent", .. }));
    }

    #[test]
    fn test_create_agent_blank_field_is_construction_error() {
        let err = factory()
            .create_agent("broken", ScriptedModel::arc(vec![]), vec![], AgentOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Construction(_)));
    }

    #[test]
    fn test_parse_final_answer() {
        let step = parse_agent_step("Thought: I now know the final answer\nFinal Answer: 3 jobs found\n");
        assert_eq!(step, AgentStep::FinalAnswer("3 jobs found".to_string()));
    }

    #[test]
    fn test_parse_action_with_input() {
        let step = parse_agent_step(
            "Thought: I should search\nAction: company_search\nAction Input: \"Acme reviews\"\nObservation: made up",
        );
        assert_eq!(
            step,
            AgentStep::Action {
                tool: "company_search".to_string(),
                input: "Acme reviews".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_action_without_input() {
        let step = parse_agent_step("Action: job_search");
        assert_eq!(
            step,
            AgentStep::Action {
                tool: "job_search".to_string(),
                input: String::new(),
            }
        );
    }

    #[test]
    fn test_final_answer_before_action_wins() {
        let step = parse_agent_step("Final Answer: done. Next Action: none needed");
        assert_eq!(
            step,
            AgentStep::FinalAnswer("done. Next Action: none needed".to_string())
        );
    }

    #[test]
    fn test_plain_reply_is_final_answer() {
        assert_eq!(
            parse_agent_step("  {\"jobs\": []}  "),
            AgentStep::FinalAnswer("{\"jobs\": []}".to_string())
        );
    }

    #[tokio::test]
    async fn test_execute_feeds_observation_back() {
        let model = ScriptedModel::new(vec![
            "Thought: look it up\nAction: echo\nAction Input: ping",
            "Thought: I now know the final answer\nFinal Answer: pong",
        ]);
        let agent = Arc::new(
            factory()
                .create_agent(
                    "job_search_expert",
                    model.clone(),
                    vec![Arc::new(EchoTool)],
                    AgentOptions::default(),
                )
                .unwrap(),
        );
        let task = task_for(agent.clone());

        let answer = agent.execute(&task, &Context::default()).await.unwrap();

        assert_eq!(answer, "pong");
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0][0].content.contains("You are Job Search Expert."));
        assert!(calls[0][0].content.contains("echo: Echoes its input"));
        assert!(calls[0][1].content.contains("Current Task: Find jobs for Rust"));
        assert_eq!(calls[1].last().unwrap().content, "Observation: echo: ping");
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_lists_available_tools() {
        let model = ScriptedModel::new(vec!["Action: teleport\nAction Input: x", "Final Answer: ok"]);
        let agent = Arc::new(
            factory()
                .create_agent(
                    "job_search_expert",
                    model.clone(),
                    vec![Arc::new(EchoTool)],
                    AgentOptions::default(),
                )
                .unwrap(),
        );
        let task = task_for(agent.clone());

        assert_eq!(agent.execute(&task, &Context::default()).await.unwrap(), "ok");
        let calls = model.calls();
        let observation = &calls[1].last().unwrap().content;
        assert!(observation.contains("'teleport' is not a valid tool"));
        assert!(observation.contains("[echo]"));
    }

    #[tokio::test]
    async fn test_execute_tool_failure_aborts() {
        let model = ScriptedModel::new(vec!["Action: fail\nAction Input: x", "Final Answer: unreachable"]);
        let agent = Arc::new(
            factory()
                .create_agent(
                    "job_search_expert",
                    model.clone(),
                    vec![Arc::new(FailingTool)],
                    AgentOptions::default(),
                )
                .unwrap(),
        );
        let task = task_for(agent.clone());

        let err = agent.execute(&task, &Context::default()).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalCall(_)));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_forces_final_answer_after_budget() {
        let mut replies = vec!["Action: echo\nAction Input: again"; MAX_ITERATIONS];
        replies.push("Final Answer: forced");
        let model = ScriptedModel::new(replies);
        let agent = Arc::new(
            factory()
                .create_agent(
                    "job_search_expert",
                    model.clone(),
                    vec![Arc::new(EchoTool)],
                    AgentOptions::default(),
                )
                .unwrap(),
        );
        let task = task_for(agent.clone());

        assert_eq!(agent.execute(&task, &Context::default()).await.unwrap(), "forced");
        let calls = model.calls();
        assert_eq!(calls.len(), MAX_ITERATIONS + 1);
        assert_eq!(calls.last().unwrap().last().unwrap().content, FORCE_FINAL_ANSWER);
    }
}
