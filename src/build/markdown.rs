//! Markdown rendering.
//!
//! One renderer is configured per run and shared by every document. Rendering
//! is a pure function of the input text and that configuration:
//! - tables, strikethrough, task lists, footnotes and bare-URL autolinks
//! - `id` attributes generated for every heading
//! - raw HTML passed through
//! - XHTML-style void elements (`<br />`, `<hr />`)
//! - optional hard wraps and fenced-code highlighting

use std::collections::HashSet;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html};
use regex::Regex;

use super::highlight::SyntaxHighlighter;

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:https?://|www\.)[^\s<>"']*[^\s<>"'.,:;!?)\]]"#).expect("valid autolink regex")
});

/// Run-wide markdown settings.
#[derive(Default)]
pub struct MarkdownOptions {
    /// Render every soft line break as `<br />`
    pub hard_wrap: bool,
    /// Highlighter for fenced code blocks; plain `<pre><code>` when absent
    pub highlighter: Option<SyntaxHighlighter>,
}

/// Converts markdown to HTML fragments.
pub struct MarkdownRenderer {
    options: Options,
    hard_wrap: bool,
    highlighter: Option<SyntaxHighlighter>,
}

impl MarkdownRenderer {
    pub fn new(settings: MarkdownOptions) -> Self {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;

        Self {
            options,
            hard_wrap: settings.hard_wrap,
            highlighter: settings.highlighter,
        }
    }

    /// Render markdown to an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);

        let mut events: Vec<Event> = Vec::new();

        // Heading events are buffered until the end tag so the id can be
        // derived from the full heading text.
        let mut heading: Option<(Tag, Vec<Event>, String)> = None;
        let mut used_heading_ids: HashSet<String> = HashSet::new();

        let mut code_block: Option<(String, String)> = None;
        // Bare URLs are left alone inside links, image alt text and code.
        let mut link_depth = 0usize;
        let mut in_code = false;

        for event in parser {
            // Fenced code is only intercepted when highlighting is on.
            if let Some((_, code)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => code.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let (Some((language, code)), Some(highlighter)) =
                            (code_block.take(), self.highlighter.as_ref())
                        {
                            let highlighted = highlighter.highlight(&code, &language);
                            events.push(Event::Html(highlighted.into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            let mut out: Vec<Event> = match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang)))
                    if self.highlighter.is_some() =>
                {
                    let language = lang.split_whitespace().next().unwrap_or("").to_string();
                    code_block = Some((language, String::new()));
                    vec![]
                }
                Event::Start(Tag::Heading { .. }) if heading.is_none() => {
                    if let Event::Start(tag) = event {
                        heading = Some((tag, Vec::new(), String::new()));
                    }
                    vec![]
                }
                Event::End(TagEnd::Heading(_)) if heading.is_some() => {
                    let Some((tag, inner, text)) = heading.take() else {
                        continue;
                    };
                    let mut out = Vec::with_capacity(inner.len() + 2);
                    out.push(Event::Start(with_heading_id(tag, &text, &mut used_heading_ids)));
                    out.extend(inner);
                    out.push(event);
                    out
                }
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code = true;
                    vec![event]
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code = false;
                    vec![event]
                }
                Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                    link_depth += 1;
                    vec![event]
                }
                Event::End(TagEnd::Link | TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1);
                    vec![event]
                }
                Event::Text(text) if link_depth == 0 && !in_code => autolink(text),
                Event::SoftBreak if self.hard_wrap => vec![Event::HardBreak],
                _ => vec![event],
            };

            if let Some((_, inner, text)) = heading.as_mut() {
                for event in &out {
                    if let Event::Text(t) | Event::Code(t) = event {
                        text.push_str(t);
                    }
                }
                inner.append(&mut out);
            } else {
                events.append(&mut out);
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

/// Give a heading an `id` derived from its text unless it already has one.
fn with_heading_id<'a>(tag: Tag<'a>, text: &str, used: &mut HashSet<String>) -> Tag<'a> {
    let (level, id, classes, attrs) = match tag {
        Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } => (level, id, classes, attrs),
        other => return other,
    };

    let id = match id {
        Some(existing) => {
            used.insert(existing.to_string());
            existing
        }
        None => {
            let base_id = slugify(text);
            let base_id = if base_id.is_empty() {
                "heading".to_string()
            } else {
                base_id
            };
            let mut id = base_id.clone();
            let mut suffix = 1;
            while used.contains(&id) {
                id = format!("{}-{}", base_id, suffix);
                suffix += 1;
            }
            used.insert(id.clone());
            CowStr::from(id)
        }
    };

    Tag::Heading {
        level,
        id: Some(id),
        classes,
        attrs,
    }
}

/// Split bare URLs out of a text event into autolinks.
fn autolink(text: CowStr<'_>) -> Vec<Event<'_>> {
    if !BARE_URL.is_match(&text) {
        return vec![Event::Text(text)];
    }

    let mut out = Vec::new();
    let mut last = 0;
    for found in BARE_URL.find_iter(&text) {
        if found.start() > last {
            out.push(Event::Text(text[last..found.start()].to_string().into()));
        }
        let url = found.as_str();
        let dest = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: dest.into(),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(url.to_string().into()));
        out.push(Event::End(TagEnd::Link));
        last = found.end();
    }
    if last < text.len() {
        out.push(Event::Text(text[last..].to_string().into()));
    }
    out
}

/// Convert heading text to an id: lowercase, spaces to `-`, other punctuation dropped.
fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-' && c != '_', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::new(MarkdownOptions::default())
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("snake_case API"), "snake_case-api");
    }

    #[test]
    fn test_render_heading_ids() {
        let html = renderer().render("# Hello World\n\n## Hello World\n\n## Hello World");
        assert!(html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(html.contains("<h2 id=\"hello-world-1\">Hello World</h2>"));
        assert!(html.contains("<h2 id=\"hello-world-2\">Hello World</h2>"));
    }

    #[test]
    fn test_heading_keeps_inline_markup() {
        let html = renderer().render("## Using `cargo` *fast*");
        assert!(html.contains("<h2 id=\"using-cargo-fast\">"));
        assert!(html.contains("<code>cargo</code>"));
        assert!(html.contains("<em>fast</em>"));
    }

    #[test]
    fn test_render_is_pure() {
        let r = renderer();
        let input = "# Title\n\nSome *text* with a [link](/x).\n\n| a | b |\n|---|---|\n| 1 | 2 |";
        assert_eq!(r.render(input), r.render(input));
    }

    #[test]
    fn test_extensions_enabled() {
        let html = renderer().render(
            "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\nNote[^1]\n\n[^1]: The footnote.\n",
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("footnote"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = renderer().render("<div class=\"box\">kept</div>\n\ntext <span>inline</span>");
        assert!(html.contains("<div class=\"box\">kept</div>"));
        assert!(html.contains("<span>inline</span>"));
    }

    #[test]
    fn test_hard_wrap() {
        let soft = renderer().render("one\ntwo");
        assert!(!soft.contains("<br />"));

        let hard = MarkdownRenderer::new(MarkdownOptions {
            hard_wrap: true,
            highlighter: None,
        })
        .render("one\ntwo");
        assert!(hard.contains("one<br />\ntwo"));
    }

    #[test]
    fn test_autolink_bare_urls() {
        let html = renderer().render("see https://example.com/docs, or www.rust-lang.org.");
        assert!(html.contains("<a href=\"https://example.com/docs\">https://example.com/docs</a>,"));
        assert!(html.contains("<a href=\"http://www.rust-lang.org\">www.rust-lang.org</a>."));
    }

    #[test]
    fn test_autolink_skips_existing_links_and_code() {
        let html = renderer().render("[https://a.dev](https://a.dev) and `https://b.dev`");
        assert_eq!(html.matches("<a ").count(), 1);
        assert!(html.contains("<code>https://b.dev</code>"));
    }

    #[test]
    fn test_autolink_skips_code_blocks() {
        let source = "```\ncurl https://example.com/api\n```\n\n    wget https://example.com/file\n";
        let plain = renderer().render(source);
        assert!(!plain.contains("<a "), "{plain}");
        assert!(plain.contains("curl https://example.com/api"));
        assert!(plain.contains("wget https://example.com/file"));

        let highlighted = MarkdownRenderer::new(MarkdownOptions {
            hard_wrap: false,
            highlighter: Some(SyntaxHighlighter::new("dracula").unwrap()),
        })
        .render(source);
        assert!(!highlighted.contains("<a "), "{highlighted}");
    }

    #[test]
    fn test_autolink_skips_image_alt_text() {
        let html = renderer().render("![see https://example.com](/logo.png)");
        assert!(!html.contains("<a "), "{html}");
        assert!(html.contains("alt=\"see https://example.com\""));
    }

    #[test]
    fn test_autolink_needs_word_start() {
        let html = renderer().render("awww.example.com and xhttps://example.com");
        assert!(!html.contains("<a "), "{html}");

        let html = renderer().render("(www.example.com)");
        assert!(html.contains("<a href=\"http://www.example.com\">www.example.com</a>)"));
    }

    #[test]
    fn test_code_block_without_highlighting() {
        let html = renderer().render("```rust\nlet x = 1 < 2;\n```");
        assert!(html.contains("<pre><code class=\"language-rust\">let x = 1 &lt; 2;"));
    }

    #[test]
    fn test_code_block_with_highlighting() {
        let r = MarkdownRenderer::new(MarkdownOptions {
            hard_wrap: false,
            highlighter: Some(SyntaxHighlighter::new("dracula").unwrap()),
        });
        let html = r.render("```rust\nlet x = 1;\n```\n\nafter");
        assert!(html.contains("<pre"));
        assert!(html.contains("<p>after</p>"));
    }
}
