//! Prompt fragments used by the agent execution loop.
//! Role/goal/backstory and task text come from configs/*.yml; only the framing lives here.

/// System prompt for every agent. Replace `{role}`, `{goal}`, `{backstory}`, `{tools}`.
pub const AGENT_SYSTEM_TEMPLATE: &str = "\
You are {role}.
{backstory}

Your personal goal is: {goal}

{tools}";

/// Tool catalogue + reply protocol, substituted for `{tools}` when an agent has tools.
/// Replace `{tool_descriptions}` and `{tool_names}`.
pub const TOOL_PROTOCOL_TEMPLATE: &str = "\
You ONLY have access to the following tools, and should NEVER make up tools that are not listed here:

{tool_descriptions}

To use a tool, reply with exactly this format and then STOP:

Thought: what you need to do next
Action: the tool to use, one of [{tool_names}]
Action Input: the input to the tool

The tool result will be sent back to you as an Observation.
When you have everything you need, reply with:

Thought: I now know the final answer
Final Answer: your complete answer";

/// Protocol for agents without tools.
pub const NO_TOOLS_PROTOCOL: &str = "\
You have no tools. Reply with:

Thought: I now know the final answer
Final Answer: your complete answer";

/// Task prompt. Replace `{description}`, `{expected_output}`, `{context}`.
pub const TASK_PROMPT_TEMPLATE: &str = "\
Current Task: {description}

This is the expected criteria for your final answer: {expected_output}
You MUST return the actual complete content as the final answer, not a summary.
{context}
Begin! This is VERY important to you, use the tools available and give your best Final Answer.";

/// Prefix for prior-stage outputs threaded into a task prompt.
pub const CONTEXT_HEADER: &str =
    "\nThis is the context you're working with (outputs of the previous tasks):\n";

/// Sent when the agent names a tool it was not given. Replace `{tool}` and `{tool_names}`.
pub const UNKNOWN_TOOL_OBSERVATION: &str =
    "Observation: '{tool}' is not a valid tool. Use one of [{tool_names}] or give your Final Answer.";

/// Sent once the iteration budget is spent.
pub const FORCE_FINAL_ANSWER: &str = "\
You have used the maximum number of tool calls. \
Do not use any more tools. Give your Final Answer now, using everything gathered so far.";

/// Substitutes `{name}` placeholders in one pass over `template`. Substituted values are
/// never rescanned, and unknown placeholders are kept verbatim.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
