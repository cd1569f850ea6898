use serde::Serialize;

const DIVIDER: &str = "\n\n----------\n\n";

/// Output of one finished task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutput {
    pub task: String,
    pub agent: String,
    pub description: String,
    pub raw: String,
}

/// Accumulated outputs of the tasks run so far, passed explicitly to every later task.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Context {
    outputs: Vec<TaskOutput>,
}

impl Context {
    pub fn push(&mut self, output: TaskOutput) {
        self.outputs.push(output);
    }

    #[allow(dead_code)]
    pub fn outputs(&self) -> &[TaskOutput] {
        &self.outputs
    }

    pub fn last(&self) -> Option<&TaskOutput> {
        self.outputs.last()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Prior raw outputs in run order, separated by a divider.
    pub fn render(&self) -> String {
        self.outputs
            .iter()
            .map(|o| o.raw.trim())
            .collect::<Vec<_>>()
            .join(DIVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(task: &str, raw: &str) -> TaskOutput {
        TaskOutput {
            task: task.to_string(),
            agent: "Agent".to_string(),
            description: String::new(),
            raw: raw.to_string(),
        }
    }

    #[test]
    fn test_render_joins_in_order() {
        let mut context = Context::default();
        assert!(context.is_empty());
        assert_eq!(context.render(), "");

        context.push(output("job_search", "jobs\n"));
        context.push(output("job_rating", "ratings"));

        assert_eq!(context.render(), "jobs\n\n----------\n\nratings");
        assert_eq!(context.last().unwrap().task, "job_rating");
    }
}
