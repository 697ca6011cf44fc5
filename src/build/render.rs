//! Page composition.
//!
//! A document's final bytes are produced in four passes:
//! 1. The body is rendered as a template against the page data
//! 2. Markdown bodies are converted to HTML
//! 3. The fragment is wrapped in `_layout.html`, or, without a layout, between
//!    `_head.html` and `_tail.html`
//! 4. The composed page is rendered as a template once more, so the head, tail
//!    and layout markup (and any directives a stage left in the body) can use
//!    the page data too
//!
//! Field paths may be written with a leading dot, `{{ .Data.title }}`, as
//! well as bare, `{{ Data.title }}`.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use minijinja::{AutoEscape, Environment, UndefinedBehavior, context};
use regex::{Captures, Regex};
use serde::Serialize;

use super::document::{Document, Mapping};
use super::markdown::MarkdownRenderer;
use super::paths::{HEAD_FILE, LAYOUT_FILE, TAIL_FILE};
use crate::log;

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{[{%].*?[}%]\}").expect("valid directive regex"));

/// A `.Field` at the start of a path: not preceded by an identifier, a
/// closing bracket, a quote or another dot.
static LEADING_DOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[^\w.)\]"'])\.([A-Za-z_])"#).expect("valid field path regex")
});

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error in {name}: {source}")]
    Template {
        name: String,
        source: minijinja::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Site-level information, the same for every page.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext {
    #[serde(rename = "BaseURL")]
    pub base_url: String,
}

/// Data visible to the body and post-composition template passes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageRenderData<'a> {
    pub meta: &'a SiteContext,
    pub data: &'a Mapping,
    pub extras: &'a Mapping,
}

/// The page wrappers found at the root of the pages directory.
#[derive(Debug, Default, Clone)]
pub struct SiteLayout {
    pub layout: Option<String>,
    pub head: Option<String>,
    pub tail: Option<String>,
}

impl SiteLayout {
    /// Read `_layout.html`, `_head.html` and `_tail.html` if they exist.
    pub fn discover(pages_dir: &Path) -> Result<Self, RenderError> {
        let layout = read_optional(&pages_dir.join(LAYOUT_FILE))?;
        let head = read_optional(&pages_dir.join(HEAD_FILE))?;
        let tail = read_optional(&pages_dir.join(TAIL_FILE))?;

        if layout.is_none() {
            log::debug(&format!("no {LAYOUT_FILE} found, skipping"));
        }
        if head.is_some() || tail.is_some() {
            log::warn(&format!(
                "use of {TAIL_FILE} and {HEAD_FILE} is deprecated, please use {LAYOUT_FILE} instead"
            ));
        }

        Ok(Self { layout, head, tail })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, RenderError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RenderError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// The template renderer, wrapping minijinja.
pub struct Renderer {
    env: Environment<'static>,
    site: SiteContext,
    layout: SiteLayout,
}

impl Renderer {
    pub fn new(site: SiteContext, layout: SiteLayout) -> Self {
        let mut env = Environment::new();
        // Missing fields render as empty text, at any depth.
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env, site, layout }
    }

    /// Produce the final output for a document whose stages have settled.
    pub fn render_document(
        &self,
        doc: &Document,
        markdown: &MarkdownRenderer,
    ) -> Result<String, RenderError> {
        let page = PageRenderData {
            meta: &self.site,
            data: &doc.data,
            extras: &doc.extras,
        };

        let expanded = self.render_str(&doc.name, &doc.content, &page)?;

        let fragment = if doc.is_markdown() {
            markdown.render(&expanded)
        } else {
            expanded
        };

        let composed = match &self.layout.layout {
            Some(layout) => {
                let ctx = context! {
                    Meta => page.meta,
                    Data => page.data,
                    Extras => page.extras,
                    Content => fragment,
                };
                self.render_str(LAYOUT_FILE, layout, ctx)?
            }
            None if doc.wants_head_tail() => {
                let head = self.layout.head.as_deref().unwrap_or_default();
                let tail = self.layout.tail.as_deref().unwrap_or_default();
                format!("{head}{fragment}{tail}")
            }
            None => fragment,
        };

        self.render_str(&doc.target_name, &composed, &page)
    }

    fn render_str<S: Serialize>(&self, name: &str, source: &str, ctx: S) -> Result<String, RenderError> {
        self.env
            .render_named_str(name, &strip_leading_dots(source), ctx)
            .map_err(|source| RenderError::Template {
                name: name.to_string(),
                source,
            })
    }
}

/// Rewrite `.Data.title` to `Data.title` inside `{{ }}` and `{% %}` tags.
fn strip_leading_dots(source: &str) -> Cow<'_, str> {
    if !source.contains('.') {
        return Cow::Borrowed(source);
    }
    DIRECTIVE.replace_all(source, |caps: &Captures| {
        LEADING_DOT.replace_all(&caps[0], "${1}${2}").into_owned()
    })
}
