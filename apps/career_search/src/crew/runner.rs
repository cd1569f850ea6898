use std::sync::Arc;

use tracing::{error, info};

use crate::crew::agent::Agent;
use crate::crew::context::{Context, TaskOutput};
use crate::crew::task::Task;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Process {
    /// Tasks run one after another in declaration order.
    #[default]
    Sequential,
}

/// An ordered set of agents and the tasks they perform.
pub struct Crew {
    agents: Vec<Arc<Agent>>,
    tasks: Vec<Task>,
    process: Process,
    verbose: bool,
}

impl Crew {
    /// Every task must be bound to one of `agents`.
    pub fn new(
        agents: Vec<Arc<Agent>>,
        tasks: Vec<Task>,
        process: Process,
        verbose: bool,
    ) -> Result<Self, AppError> {
        if tasks.is_empty() {
            return Err(AppError::Pipeline("crew has no tasks".to_string()));
        }
        if let Some(orphan) = tasks
            .iter()
            .find(|t| !agents.iter().any(|a| Arc::ptr_eq(a, t.agent())))
        {
            return Err(AppError::Pipeline(format!(
                "task '{}' is bound to an agent outside the crew",
                orphan.name()
            )));
        }

        Ok(Self {
            agents,
            tasks,
            process,
            verbose,
        })
    }

    /// Runs every task and returns the last task's output unchanged.
    pub async fn kickoff(self) -> Result<String, AppError> {
        let context = self.run().await?;
        context
            .last()
            .map(|o| o.raw.clone())
            .ok_or_else(|| AppError::Pipeline("crew produced no output".to_string()))
    }

    /// Runs every task, returning the full accumulated context.
    pub async fn run(self) -> Result<Context, AppError> {
        match self.process {
            Process::Sequential => self.run_sequential().await,
        }
    }

    async fn run_sequential(self) -> Result<Context, AppError> {
        let mut context = Context::default();
        let total = self.tasks.len();
        info!("Crew of {} agents starting {total} tasks", self.agents.len());

        for (index, task) in self.tasks.into_iter().enumerate() {
            let agent = task.agent().clone();
            info!(
                "Task {}/{} '{}' started by {}",
                index + 1,
                total,
                task.name(),
                agent.role()
            );

            let raw = agent.execute(&task, &context).await.map_err(|e| {
                error!("Task '{}' failed: {e}", task.name());
                e
            })?;

            if self.verbose {
                info!("Task '{}' output:\n{raw}", task.name());
            }
            info!("Task {}/{} '{}' completed", index + 1, total, task.name());

            context.push(TaskOutput {
                task: task.name().to_string(),
                agent: agent.role().to_string(),
                description: task.description().to_string(),
                raw,
            });
        }

        Ok(context)
    }
}
