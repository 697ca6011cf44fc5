use autumnus::{HtmlInlineBuilder, formatter::Formatter, languages::Language, themes, themes::Theme};

#[derive(thiserror::Error, Debug)]
#[error("unknown highlight theme: {0}")]
pub struct UnknownTheme(String);

/// A syntax highlighter using autumnus (tree-sitter based).
///
/// Colors are inlined from the selected theme so pages need no extra stylesheet.
pub struct SyntaxHighlighter {
    theme: &'static Theme,
}

impl SyntaxHighlighter {
    /// Create a highlighter for the named theme.
    pub fn new(theme_name: &str) -> Result<Self, UnknownTheme> {
        let theme = themes::get(theme_name).map_err(|_| UnknownTheme(theme_name.to_string()))?;
        Ok(Self { theme })
    }

    /// Highlight code and return a complete `<pre>` block.
    /// Returns the code in a plain `<code>` if the language is not supported.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        let lang = Language::guess(language, code);

        if matches!(lang, Language::PlainText)
            && !language.is_empty()
            && language != "plaintext"
            && language != "text"
        {
            return plain_code_block(code, language);
        }

        let formatter = HtmlInlineBuilder::new()
            .source(code)
            .lang(lang)
            .theme(Some(self.theme))
            .build();

        match formatter {
            Ok(f) => {
                let mut output: Vec<u8> = Vec::new();
                if f.format(&mut output).is_ok() {
                    String::from_utf8(output).unwrap_or_else(|_| plain_code_block(code, language))
                } else {
                    plain_code_block(code, language)
                }
            }
            Err(_) => plain_code_block(code, language),
        }
    }
}

/// Create a plain code block without highlighting.
fn plain_code_block(code: &str, language: &str) -> String {
    let escaped = html_escape(code);
    if language.is_empty() {
        format!("<pre><code>{}</code></pre>\n", escaped)
    } else {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            html_escape(language),
            escaped
        )
    }
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
