use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeInfo {
    #[serde(default)]
    pub challenge_id: Option<String>,
    #[serde(default)]
    pub test_case_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

/// The ranking run's input: which documents, for whom, to do what.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaConfig {
    #[serde(default)]
    pub challenge_info: Option<ChallengeInfo>,
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

impl PersonaConfig {
    pub fn parse(raw: &str) -> PipelineResult<Self> {
        let config: PersonaConfig =
            serde_json::from_str(raw).map_err(|e| PipelineError::Configuration(e.to_string()))?;
        if config.persona.role.trim().is_empty() {
            return Err(PipelineError::Configuration("persona.role is empty".into()));
        }
        if config.job_to_be_done.task.trim().is_empty() {
            return Err(PipelineError::Configuration("job_to_be_done.task is empty".into()));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PipelineError::Configuration(format!("{} not found", path.display()))
            } else {
                PipelineError::Configuration(format!("cannot read {}: {}", path.display(), e))
            }
        })?;
        Self::parse(&raw)
    }

    /// `"<role>: <task>"`, embedded once per run.
    pub fn query(&self) -> String {
        format!("{}: {}", self.persona.role, self.job_to_be_done.task)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}
