use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::tools::Tool;

/// Reads the candidate's resume text from a fixed local path.
pub struct ResumeReaderTool {
    path: PathBuf,
}

impl ResumeReaderTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Tool for ResumeReaderTool {
    fn name(&self) -> &str {
        "read_resume"
    }

    fn description(&self) -> &str {
        "Reads the candidate's resume and returns its full text. Takes no input."
    }

    async fn run(&self, _input: &str) -> Result<String, AppError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::ExternalCall(format!(
                "Failed to read resume '{}': {e}",
                self.path.display()
            ))
        })
    }
}
