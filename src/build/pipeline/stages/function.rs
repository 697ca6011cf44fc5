//! In-process stage backend.

use serde_json::Value;

use crate::build::pipeline::{EntryPoint, StageContext, StageError};

type Handler = Box<dyn FnMut(Option<&Value>) -> Result<Value, String> + Send>;

/// A stage backed by Rust closures, one per entry point.
///
/// ```ignore
/// let stage = FunctionStage::new()
///     .for_file("index.md")
///     .on(EntryPoint::Transform, |request| Ok(json!({ "data": { "home": true } })));
/// ```
#[derive(Default)]
pub struct FunctionStage {
    handlers: Vec<(EntryPoint, Handler)>,
    for_file: Option<String>,
}

impl FunctionStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for an entry point, replacing any earlier one.
    pub fn on<F>(mut self, entry: EntryPoint, handler: F) -> Self
    where
        F: FnMut(Option<&Value>) -> Result<Value, String> + Send + 'static,
    {
        self.handlers.retain(|(e, _)| *e != entry);
        self.handlers.push((entry, Box::new(handler)));
        self
    }

    /// Restrict `transform` to the document with this logical name.
    pub fn for_file(mut self, name: impl Into<String>) -> Self {
        self.for_file = Some(name.into());
        self
    }
}

impl StageContext for FunctionStage {
    fn has_entry_point(&self, entry: EntryPoint) -> bool {
        self.handlers.iter().any(|(e, _)| *e == entry)
    }

    fn target_filter(&self) -> Option<&str> {
        self.for_file.as_deref()
    }

    fn invoke(&mut self, entry: EntryPoint, payload: Option<&Value>) -> Result<Value, StageError> {
        let (_, handler) = self
            .handlers
            .iter_mut()
            .find(|(e, _)| *e == entry)
            .ok_or(StageError::MissingEntryPoint(entry.as_str()))?;
        handler(payload).map_err(StageError::Raised)
    }

    fn close(&mut self) -> Result<(), StageError> {
        self.handlers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_entry_points() {
        let stage = FunctionStage::new().on(EntryPoint::Transform, |_| Ok(json!({})));
        assert!(stage.has_entry_point(EntryPoint::Transform));
        assert!(!stage.has_entry_point(EntryPoint::BeforeBuild));
        assert_eq!(stage.target_filter(), None);
    }

    #[test]
    fn test_invoke_passes_payload() {
        let mut stage = FunctionStage::new().on(EntryPoint::Transform, |payload| {
            Ok(json!({ "content": payload.and_then(|p| p["content"].as_str()).unwrap_or("") }))
        });
        let reply = stage
            .invoke(EntryPoint::Transform, Some(&json!({ "content": "echo" })))
            .unwrap();
        assert_eq!(reply, json!({ "content": "echo" }));
    }

    #[test]
    fn test_invoke_missing_entry_point() {
        let mut stage = FunctionStage::new();
        let err = stage.invoke(EntryPoint::AfterBuild, None).unwrap_err();
        assert!(matches!(err, StageError::MissingEntryPoint("after_build")));
    }

    #[test]
    fn test_state_persists_between_calls() {
        let mut count = 0;
        let mut stage = FunctionStage::new().on(EntryPoint::Transform, move |_| {
            count += 1;
            Ok(json!({ "data": { "count": count } }))
        });
        stage.invoke(EntryPoint::Transform, None).unwrap();
        let reply = stage.invoke(EntryPoint::Transform, None).unwrap();
        assert_eq!(reply["data"]["count"], 2);
    }
}
