//! Extension stages.
//!
//! A stage is an independently initialised execution context discovered once
//! per run. Each stage may expose three entry points:
//! 1. `before_build` - called once, before any document is processed
//! 2. `transform` - called once per document with a JSON envelope
//! 3. `after_build` - called once, after every document has been written
//!
//! Stages run in discovery order. Any stage failure aborts the build.

mod envelope;
mod error;
mod stages;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use envelope::{StageRequest, StageResponse};
pub use error::{PipelineError, StageError};
#[cfg(test)]
pub use stages::FunctionStage;
use stages::ScriptStage;

use crate::build::document::Document;
use crate::build::markdown::MarkdownRenderer;
use crate::build::paths::is_contained;
use crate::log;

/// File suffix identifying stage definitions in the hooks directory.
pub const STAGE_SUFFIX: &str = ".hook";

/// Named entry points a stage may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    BeforeBuild,
    AfterBuild,
    Transform,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::BeforeBuild => "before_build",
            EntryPoint::AfterBuild => "after_build",
            EntryPoint::Transform => "transform",
        }
    }
}

/// A live stage execution context.
///
/// Contexts are stateful and not reentrant: every call goes through `&mut self`,
/// so state a stage accumulates is observed in document order.
pub trait StageContext: Send {
    /// Returns true if the stage defines the entry point.
    fn has_entry_point(&self, entry: EntryPoint) -> bool;

    /// The single document name this stage's `transform` is restricted to, if any.
    fn target_filter(&self) -> Option<&str>;

    /// Call an entry point. `transform` receives the request envelope and must
    /// return the response; the hooks receive nothing and their result is ignored.
    fn invoke(
        &mut self,
        entry: EntryPoint,
        payload: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, StageError>;

    /// Tear the context down.
    fn close(&mut self) -> Result<(), StageError>;
}

/// A stage with a display name (its file name for script stages).
pub struct Stage {
    pub name: String,
    context: Box<dyn StageContext>,
}

impl Stage {
    pub fn new(name: impl Into<String>, context: impl StageContext + 'static) -> Self {
        Self {
            name: name.into(),
            context: Box::new(context),
        }
    }

    /// Returns true if `transform` should run for the document.
    fn applies_to(&self, doc: &Document) -> bool {
        if !self.context.has_entry_point(EntryPoint::Transform) {
            return false;
        }
        match self.context.target_filter() {
            Some(name) => name == doc.name,
            None => true,
        }
    }
}

/// The ordered stages for one run.
#[derive(Default)]
pub struct StageList {
    stages: Vec<Stage>,
}

impl StageList {
    /// Create an empty stage list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start every `*.hook` file in `hooks_dir`, in file-name order.
    ///
    /// A missing hooks directory yields an empty list.
    pub fn discover(hooks_dir: &Path, working_dir: &Path) -> Result<Self, PipelineError> {
        let mut list = Self::new();
        if !hooks_dir.is_dir() {
            log::debug(&format!("no hooks directory at {}", hooks_dir.display()));
            return Ok(list);
        }

        let read_err = |source| PipelineError::ReadHooks {
            path: hooks_dir.to_path_buf(),
            source,
        };
        let mut paths = std::fs::read_dir(hooks_dir)
            .map_err(read_err)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;
        paths.sort();

        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(STAGE_SUFFIX) || !path.is_file() {
                continue;
            }
            let name = file_name.to_string();
            let context = ScriptStage::spawn(&path, working_dir)
                .map_err(|e| PipelineError::stage(&name, e))?;
            log::debug(&format!("loaded stage {name}"));
            list.push(Stage::new(name, context));
        }

        Ok(list)
    }

    /// Add a stage to the end of the list.
    pub fn push(&mut self, stage: Stage) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Call a build-wide hook on every stage that defines it.
    pub fn run_hook(&mut self, entry: EntryPoint) -> Result<(), PipelineError> {
        for stage in &mut self.stages {
            if !stage.context.has_entry_point(entry) {
                continue;
            }
            stage
                .context
                .invoke(entry, None)
                .map_err(|e| PipelineError::stage(&stage.name, e))?;
        }
        Ok(())
    }

    /// Run every applicable stage's `transform` over the document, in order.
    ///
    /// All stages see the same HTML preview, rendered from the body as it was
    /// before the first stage ran.
    pub fn transform(
        &mut self,
        doc: &mut Document,
        markdown: &MarkdownRenderer,
    ) -> Result<(), PipelineError> {
        if self.stages.is_empty() {
            return Ok(());
        }

        let html = if doc.is_markdown() {
            markdown.render(&doc.content)
        } else {
            String::new()
        };

        for stage in &mut self.stages {
            if !stage.applies_to(doc) {
                continue;
            }

            let request = serde_json::to_value(StageRequest::new(doc, &html))
                .map_err(|e| PipelineError::stage(&stage.name, e.into()))?;
            let reply = stage
                .context
                .invoke(EntryPoint::Transform, Some(&request))
                .map_err(|e| PipelineError::stage(&stage.name, e))?;
            let response: StageResponse =
                serde_json::from_value(reply).map_err(|source| PipelineError::Response {
                    stage: stage.name.clone(),
                    document: doc.name.clone(),
                    source,
                })?;
            if let Some(name) = &response.name
                && !is_contained(name)
            {
                return Err(PipelineError::TargetName {
                    stage: stage.name.clone(),
                    document: doc.name.clone(),
                    name: name.clone(),
                });
            }
            response.apply(doc);
        }

        Ok(())
    }

    /// Close every stage in order. Stops at the first failure.
    pub fn close(mut self) -> Result<(), PipelineError> {
        for stage in &mut self.stages {
            stage
                .context
                .close()
                .map_err(|e| PipelineError::stage(&stage.name, e))?;
        }
        Ok(())
    }
}
