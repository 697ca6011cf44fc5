//! Messages exchanged with a stage's `transform` entry point.
//!
//! Request:
//! ```json
//! { "name": "index.html", "source_path": "pages/index.md", "dest_path": "dist/index.md",
//!   "meta": { "title": "Hello" }, "content": "# Hi", "html": "<h1 id=\"hi\">Hi</h1>\n" }
//! ```
//!
//! Response (every field optional, unknown fields ignored):
//! ```json
//! { "content": "# Hi!", "name": "home.html", "data": { "title": "Hello" }, "extras": {} }
//! ```

use serde::{Deserialize, Serialize};

use crate::build::document::{Document, Mapping};

/// Snapshot of a document handed to a stage.
#[derive(Debug, Serialize)]
pub struct StageRequest<'a> {
    pub name: &'a str,
    pub source_path: String,
    pub dest_path: String,
    pub meta: Option<&'a Mapping>,
    pub content: &'a str,
    /// Markdown preview of the body as it was before any stage ran; empty for
    /// non-markdown sources
    pub html: &'a str,
}

impl<'a> StageRequest<'a> {
    pub fn new(doc: &'a Document, html: &'a str) -> Self {
        Self {
            name: &doc.target_name,
            source_path: doc.source_path.to_string_lossy().into_owned(),
            dest_path: doc.dest_path.to_string_lossy().into_owned(),
            meta: doc.meta.as_ref(),
            content: &doc.content,
            html,
        }
    }
}

/// Mutations a stage asks for. `None` leaves the document field unchanged.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct StageResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<Mapping>,
    #[serde(default)]
    pub extras: Option<Mapping>,
}

impl StageResponse {
    /// Apply the response to a document.
    ///
    /// `content` and `name` replace; `data` and `extras` are merged key by key,
    /// later writes winning.
    pub fn apply(self, doc: &mut Document) {
        if let Some(content) = self.content {
            doc.content = content;
        }
        if let Some(name) = self.name {
            doc.target_name = name;
        }
        if let Some(data) = self.data {
            merge(&mut doc.data, data);
        }
        if let Some(extras) = self.extras {
            merge(&mut doc.extras, extras);
        }
    }
}

/// Shallow merge: each key in `incoming` overwrites the same key in `target`.
pub fn merge(target: &mut Mapping, incoming: Mapping) {
    for (key, value) in incoming {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use serde_json::json;

    use super::*;

    fn doc() -> Document {
        let mut doc = Document::discovered(
            "index.md".to_string(),
            PathBuf::from("pages/index.md"),
            Path::new("dist"),
        );
        doc.parse("---\ntitle: Hello\n---\n# Hi").unwrap();
        doc
    }

    #[test]
    fn test_request_shape() {
        let doc = doc();
        let request = serde_json::to_value(StageRequest::new(&doc, "<h1>Hi</h1>")).unwrap();
        assert_eq!(
            request,
            json!({
                "name": "index.html",
                "source_path": "pages/index.md",
                "dest_path": "dist/index.md",
                "meta": { "title": "Hello" },
                "content": "\n# Hi",
                "html": "<h1>Hi</h1>",
            })
        );
    }

    #[test]
    fn test_request_without_meta_is_null() {
        let mut doc = doc();
        doc.meta = None;
        let request = serde_json::to_value(StageRequest::new(&doc, "")).unwrap();
        assert_eq!(request["meta"], serde_json::Value::Null);
    }

    #[test]
    fn test_response_ignores_unknown_and_null_fields() {
        let response: StageResponse = serde_json::from_value(json!({
            "content": null,
            "name": "home.html",
            "something_else": [1, 2, 3],
        }))
        .unwrap();
        assert_eq!(
            response,
            StageResponse {
                name: Some("home.html".to_string()),
                ..StageResponse::default()
            }
        );
    }

    #[test]
    fn test_response_rejects_non_mapping_data() {
        let result = serde_json::from_value::<StageResponse>(json!({ "data": "nope" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_replaces_and_merges() {
        let mut doc = doc();
        doc.data.insert("keep".into(), json!(true));
        doc.data.insert("x".into(), json!(1));

        let response: StageResponse = serde_json::from_value(json!({
            "content": "replaced",
            "data": { "x": 2, "y": [1] },
            "extras": { "toc": false },
        }))
        .unwrap();
        response.apply(&mut doc);

        assert_eq!(doc.content, "replaced");
        assert_eq!(doc.target_name, "index.html");
        assert_eq!(serde_json::Value::Object(doc.data), json!({ "keep": true, "x": 2, "y": [1] }));
        assert_eq!(serde_json::Value::Object(doc.extras), json!({ "toc": false }));
    }

    #[test]
    fn test_empty_response_is_a_no_op() {
        let mut doc = doc();
        let before = doc.clone();
        StageResponse::default().apply(&mut doc);
        assert_eq!(doc.content, before.content);
        assert_eq!(doc.target_name, before.target_name);
        assert!(doc.data.is_empty());
    }
}
