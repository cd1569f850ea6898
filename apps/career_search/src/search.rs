//! Job search crew: the fixed four-stage pipeline.
//!
//! Flow: job_search → job_rating → evaluate_company → structure_results.
//! Each stage is one agent with at most one tool; all agents share the same model handle.
//! The final stage's text is returned as-is; the JobResults schema is a prompt hint only.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::crew::{AgentOptions, AgentsFactory, Crew, Process, TasksFactory};
use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::models::job::JobResults;
use crate::tools::{CompanySearchTool, JobSearchTool, JoobleClient, ResumeReaderTool, Tool};

pub struct SearchJobs {
    keywords: String,
    location: String,
    resume: PathBuf,
}

impl SearchJobs {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>, resume: impl Into<PathBuf>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            resume: resume.into(),
        }
    }

    /// Builds and runs the crew. Failures are logged once here and returned.
    pub async fn search(&self, config: &Config, llm: Arc<dyn ChatModel>) -> Result<String, AppError> {
        info!(
            keywords = %self.keywords,
            location = %self.location,
            "Running Job Search Crew..."
        );

        match self.run(config, llm).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("SearchJobs::search() Error: {e}");
                Err(e)
            }
        }
    }

    async fn run(&self, config: &Config, llm: Arc<dyn ChatModel>) -> Result<String, AppError> {
        let options = AgentOptions::default();

        // Data sources
        let resume_tool: Arc<dyn Tool> = Arc::new(ResumeReaderTool::new(&self.resume));
        let job_search_tool: Arc<dyn Tool> = Arc::new(JobSearchTool::new(
            JoobleClient::new(config.jooble_host.clone(), config.jooble_api_key.clone()),
            self.keywords.clone(),
            self.location.clone(),
        ));
        let company_search_tool: Arc<dyn Tool> = Arc::new(
            CompanySearchTool::new(config.serper_api_key.clone()).with_url(&config.serper_url),
        );

        // Agents
        let agents_factory = AgentsFactory::new(&config.agents_config)?;
        let job_search_expert = Arc::new(agents_factory.create_agent(
            "job_search_expert",
            llm.clone(),
            vec![job_search_tool],
            options,
        )?);
        let job_rating_expert = Arc::new(agents_factory.create_agent(
            "job_rating_expert",
            llm.clone(),
            vec![resume_tool],
            options,
        )?);
        let company_rating_expert = Arc::new(agents_factory.create_agent(
            "company_rating_expert",
            llm.clone(),
            vec![company_search_tool],
            options,
        )?);
        let summarization_expert = Arc::new(agents_factory.create_agent(
            "summarization_expert",
            llm,
            vec![],
            options,
        )?);

        let response_schema = JobResults::schema_string();

        // Tasks
        let tasks_factory = TasksFactory::new(&config.tasks_config)?;
        let tasks = vec![
            tasks_factory.create_task(
                "job_search",
                job_search_expert.clone(),
                Some(&self.keywords),
                None,
            )?,
            tasks_factory.create_task("job_rating", job_rating_expert.clone(), None, None)?,
            tasks_factory.create_task(
                "evaluate_company",
                company_rating_expert.clone(),
                None,
                Some(&response_schema),
            )?,
            tasks_factory.create_task(
                "structure_results",
                summarization_expert.clone(),
                None,
                Some(&response_schema),
            )?,
        ];

        let crew = Crew::new(
            vec![
                job_search_expert,
                job_rating_expert,
                company_rating_expert,
                summarization_expert,
            ],
            tasks,
            Process::Sequential,
            options.verbose,
        )?;

        crew.kickoff().await
    }
}
