//! Tool adapters: the external data sources an agent can call during its task.
//!
//! Every adapter is single-shot and stateless per call. A tool error aborts the
//! agent's task and, with it, the crew run.

use async_trait::async_trait;

use crate::errors::AppError;

pub mod jooble;
pub mod resume_reader;
pub mod serper;

pub use jooble::{JobSearchTool, JoobleClient};
pub use resume_reader::ResumeReaderTool;
pub use serper::CompanySearchTool;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Runs the tool with the model-supplied `Action Input`.
    async fn run(&self, input: &str) -> Result<String, AppError>;
}
