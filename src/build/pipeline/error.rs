//! Pipeline error types.

use std::path::PathBuf;

/// Errors raised by a single stage execution context.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("failed to start {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stage exited before replying")]
    Exited,

    #[error("stage exited with {0}")]
    ExitStatus(std::process::ExitStatus),

    #[error("stage has no `{0}` entry point")]
    MissingEntryPoint(&'static str),

    #[error("{0}")]
    Raised(String),
}

/// Errors that can occur while running extension stages.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("failed to read hooks directory {path}: {source}")]
    ReadHooks {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stage '{stage}' failed: {source}")]
    Stage { stage: String, source: StageError },

    #[error("stage '{stage}' set the output name of {document} to {name:?}, which leaves the output directory")]
    TargetName {
        stage: String,
        document: String,
        name: String,
    },

    #[error("stage '{stage}' returned a malformed response for {document}: {source}")]
    Response {
        stage: String,
        document: String,
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, source: StageError) -> Self {
        Self::Stage {
            stage: stage.into(),
            source,
        }
    }
}
