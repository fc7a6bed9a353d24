//! Markdown rendering service
//!
//! Converts post bodies to HTML with pulldown-cmark, highlighting fenced code
//! with syntect. Rendering is locale-aware: internal links are rewritten to
//! stay inside the reader's locale.
//!
//! # Example
//!
//! ```
//! use oddspress::models::Locale;
//! use oddspress::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("## Odds\n\nSee [the guide](/blog/reading-odds).", Locale::Ja);
//! assert!(html.contains("<h2 id=\"odds\">"));
//! assert!(html.contains("href=\"/ja/blog/reading-odds\""));
//! ```

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::models::Locale;
use crate::services::emoji;

/// Path prefixes that are never locale-prefixed
const UNLOCALIZED_PREFIXES: [&str; 2] = ["/static/", "/api/"];

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{L}\p{N}]+").expect("slug pattern is valid")
});

/// Heading entry for the article's table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Rendered HTML plus the headings it contains
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// A thread-safe, locale-aware Markdown renderer.
///
/// Supported: headings (with slug ids), emphasis, strikethrough, links,
/// images, blockquotes, lists, task lists, tables (wrapped for horizontal
/// scrolling), inline code, highlighted code blocks and emoji badges.
/// Block-level HTML in the input passes through untouched, so feeding
/// rendered output back in does not wrap it in a second paragraph.
#[derive(Clone)]
pub struct MarkdownRenderer {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
    theme_name: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading being collected until its end tag
struct PendingHeading<'a> {
    level: u8,
    events: Vec<Event<'a>>,
    text: String,
}

impl MarkdownRenderer {
    /// Creates a renderer using the "base16-ocean.dark" highlighting theme.
    pub fn new() -> Self {
        Self::with_theme("base16-ocean.dark")
    }

    /// Creates a renderer with a specific syntect theme.
    ///
    /// Falls back to "base16-ocean.dark" if the theme is not found.
    pub fn with_theme(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();

        let validated_theme = if theme_set.themes.contains_key(theme_name) {
            theme_name.to_string()
        } else {
            "base16-ocean.dark".to_string()
        };

        Self {
            syntax_set: Arc::new(syntax_set),
            theme_set: Arc::new(theme_set),
            theme_name: validated_theme,
        }
    }

    /// Renders Markdown to HTML for readers of `locale`.
    pub fn render(&self, markdown: &str, locale: Locale) -> String {
        self.render_with_toc(markdown, locale).html
    }

    /// Renders Markdown to HTML and collects the table of contents.
    pub fn render_with_toc(&self, markdown: &str, locale: Locale) -> Rendered {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(markdown, options);
        let mut toc = Vec::new();
        let events = self.process_events(parser, locale, &mut toc);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        Rendered {
            html: html_output,
            toc,
        }
    }

    fn process_events<'a>(
        &self,
        parser: Parser<'a>,
        locale: Locale,
        toc: &mut Vec<TocEntry>,
    ) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut in_code_block = false;
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();
        let mut heading: Option<PendingHeading<'a>> = None;
        let mut used_ids: HashMap<String, usize> = HashMap::new();
        // True right after a paragraph or list item opens
        let mut at_block_start = false;

        for event in parser {
            let mut out: Vec<Event<'a>> = Vec::with_capacity(2);

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_content.clear();
                    code_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            let lang_str = lang.trim().to_string();
                            if lang_str.is_empty() {
                                None
                            } else {
                                Some(lang_str)
                            }
                        }
                        CodeBlockKind::Indented => None,
                    };
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let highlighted = match code_lang.take() {
                        Some(lang) => self.highlight_code(&code_content, &lang),
                        None => plain_code_block(&code_content),
                    };
                    // Blank line first so re-parsed output opens a fresh `<pre>` block
                    out.push(Event::Html("\n".into()));
                    out.push(Event::Html(highlighted.into()));
                }
                Event::Text(text) if in_code_block => {
                    code_content.push_str(&text);
                }
                Event::Start(Tag::Heading { level, .. }) => {
                    heading = Some(PendingHeading {
                        level: level as u8,
                        events: Vec::new(),
                        text: String::new(),
                    });
                    continue;
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(pending) = heading.take() {
                        let id = unique_id(&slugify(&pending.text), &mut used_ids);
                        out.push(Event::Html(
                            format!("<h{} id=\"{}\">", pending.level, html_escape(&id)).into(),
                        ));
                        out.extend(pending.events);
                        out.push(Event::Html(format!("</h{}>\n", pending.level).into()));
                        toc.push(TocEntry {
                            level: pending.level,
                            id,
                            text: pending.text.trim().to_string(),
                        });
                    }
                }
                Event::Start(Tag::Link { dest_url, title, .. }) => {
                    out.push(Event::Html(link_open(&dest_url, &title, locale).into()));
                }
                Event::End(TagEnd::Link) => {
                    out.push(Event::Html(CowStr::Borrowed("</a>")));
                }
                Event::Start(Tag::Table(alignments)) => {
                    out.push(Event::Html(CowStr::Borrowed("<div class=\"table-wrapper\">\n")));
                    out.push(Event::Start(Tag::Table(alignments)));
                }
                Event::End(TagEnd::Table) => {
                    out.push(Event::End(TagEnd::Table));
                    out.push(Event::Html(CowStr::Borrowed("</div>\n")));
                }
                Event::Start(tag @ (Tag::Paragraph | Tag::Item)) => {
                    out.push(Event::Start(tag));
                    events_push(&mut heading, &mut events, out);
                    at_block_start = true;
                    continue;
                }
                Event::Text(text) => {
                    let expanded = emoji::expand_shortcodes(&text).into_owned();
                    if let Some(pending) = heading.as_mut() {
                        pending.text.push_str(&expanded);
                    }
                    let badge = if at_block_start {
                        emoji::split_badge(&expanded)
                            .map(|(badge, mark, rest)| (badge.to_html(mark), rest.to_string()))
                    } else {
                        None
                    };
                    match badge {
                        Some((badge_html, rest)) => {
                            out.push(Event::Html(badge_html.into()));
                            if !rest.is_empty() {
                                out.push(Event::Text(rest.into()));
                            }
                        }
                        None if expanded == *text => out.push(Event::Text(text)),
                        None => out.push(Event::Text(expanded.into())),
                    }
                }
                Event::Code(code) => {
                    if let Some(pending) = heading.as_mut() {
                        pending.text.push_str(&code);
                    }
                    out.push(Event::Code(code));
                }
                other => out.push(other),
            }

            // Task list markers do not end the block start
            if !out.iter().all(|e| matches!(e, Event::TaskListMarker(_))) {
                at_block_start = false;
            }
            events_push(&mut heading, &mut events, out);
        }

        events
    }

    /// Applies syntax highlighting to a code block.
    ///
    /// Unknown languages render as a plain block with a `language-*` class.
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang));

        match syntax {
            Some(syntax) => {
                let theme = &self.theme_set.themes[&self.theme_name];
                match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
                    Ok(html) => html,
                    Err(_) => plain_code_block(code),
                }
            }
            None => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                html_escape(lang),
                html_escape(code)
            ),
        }
    }
}

/// Route events into the heading being collected, or the output
fn events_push<'a>(
    heading: &mut Option<PendingHeading<'a>>,
    events: &mut Vec<Event<'a>>,
    out: Vec<Event<'a>>,
) {
    match heading.as_mut() {
        Some(pending) => pending.events.extend(out),
        None => events.extend(out),
    }
}

fn plain_code_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>\n", html_escape(code))
}

/// Opening `<a>` tag for a link target
fn link_open(dest: &str, title: &str, locale: Locale) -> String {
    let href = localize_href(dest, locale);
    let mut tag = format!("<a href=\"{}\"", html_escape(&href));
    if !title.is_empty() {
        tag.push_str(&format!(" title=\"{}\"", html_escape(title)));
    }
    if is_external(dest) {
        tag.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
    }
    tag.push('>');
    tag
}

/// Prefix site-internal paths with the reader's locale
///
/// `/blog/x` becomes `/ja/blog/x`. Paths already carrying a locale, asset
/// and API paths, protocol-relative and external URLs are left alone.
pub fn localize_href(dest: &str, locale: Locale) -> String {
    if !dest.starts_with('/') || dest.starts_with("//") {
        return dest.to_string();
    }
    if UNLOCALIZED_PREFIXES.iter().any(|p| dest.starts_with(p)) {
        return dest.to_string();
    }
    if dest == "/" {
        return format!("/{}", locale.code());
    }

    let first_segment = dest[1..]
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");
    if Locale::ALL.iter().any(|l| l.code() == first_segment) {
        return dest.to_string();
    }

    format!("/{}{}", locale.code(), dest)
}

fn is_external(dest: &str) -> bool {
    dest.starts_with("http://") || dest.starts_with("https://")
}

/// Heading slug: lowercase letters and digits joined by single hyphens
///
/// Non-Latin scripts are kept so Japanese and Chinese headings get ids too.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

fn unique_id(base: &str, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(base.to_string()).or_insert(0);
    let id = if *count == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, count)
    };
    *count += 1;
    id
}

/// Escapes HTML special characters in a string.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> String {
        MarkdownRenderer::new().render(md, Locale::En)
    }

    #[test]
    fn test_with_invalid_theme_falls_back() {
        let renderer = MarkdownRenderer::with_theme("no-such-theme");
        assert_eq!(renderer.theme_name, "base16-ocean.dark");
    }

    #[test]
    fn test_render_heading_with_id() {
        let html = render("## What is value?");
        assert!(html.contains("<h2 id=\"what-is-value\">What is value?</h2>"));
    }

    #[test]
    fn test_duplicate_headings_get_unique_ids() {
        let html = render("## Tips\n\n## Tips");
        assert!(html.contains("id=\"tips\""));
        assert!(html.contains("id=\"tips-1\""));
    }

    #[test]
    fn test_non_latin_heading_slug() {
        let html = MarkdownRenderer::new().render("## 資金管理", Locale::Ja);
        assert!(html.contains("<h2 id=\"資金管理\">"));
    }

    #[test]
    fn test_toc_collects_headings() {
        let rendered = MarkdownRenderer::new()
            .render_with_toc("# Title\n\n## First `code`\n\ntext\n\n### Second", Locale::En);
        let levels: Vec<u8> = rendered.toc.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(rendered.toc[1].text, "First code");
        assert_eq!(rendered.toc[1].id, "first-code");
    }

    #[test]
    fn test_render_bold_and_italic() {
        let html = render("**bold** and *italic*");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn test_render_lists() {
        let html = render("- a\n- b\n\n1. one\n2. two");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<ol>"));
        assert_eq!(html.matches("<li>").count(), 4);
    }

    #[test]
    fn test_render_blockquote() {
        let html = render("> Never chase losses");
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("Never chase losses"));
    }

    #[test]
    fn test_render_inline_code() {
        assert!(render("Use `2.50` odds").contains("<code>2.50</code>"));
    }

    #[test]
    fn test_render_table_is_wrapped() {
        let html = render("| Format | Example |\n|---|---|\n| Decimal | 2.50 |");
        assert!(html.contains("<div class=\"table-wrapper\">\n<table>"));
        assert!(html.contains("</table>\n</div>"));
        assert!(html.contains("<td>Decimal</td>"));
    }

    #[test]
    fn test_internal_link_gets_locale() {
        let html = MarkdownRenderer::new().render("[guide](/blog/reading-odds)", Locale::De);
        assert!(html.contains("<a href=\"/de/blog/reading-odds\">guide</a>"));
    }

    #[test]
    fn test_external_link_opens_new_tab() {
        let html = render("[site](https://example.com)");
        assert!(html.contains(
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">site</a>"
        ));
    }

    #[test]
    fn test_link_title() {
        let html = render("[x](/a \"Odds <guide>\")");
        assert!(html.contains("<a href=\"/en/a\" title=\"Odds &lt;guide&gt;\">x</a>"));
    }

    #[test]
    fn test_localize_href() {
        assert_eq!(localize_href("/blog/a", Locale::Ja), "/ja/blog/a");
        assert_eq!(localize_href("/", Locale::Es), "/es");
        assert_eq!(localize_href("/en/blog/a", Locale::Ja), "/en/blog/a");
        assert_eq!(localize_href("/es", Locale::Ja), "/es");
        assert_eq!(localize_href("/static/img.png", Locale::Ja), "/static/img.png");
        assert_eq!(localize_href("/api/v1/posts", Locale::Ja), "/api/v1/posts");
        assert_eq!(localize_href("//cdn.example.com/x", Locale::Ja), "//cdn.example.com/x");
        assert_eq!(localize_href("#odds", Locale::Ja), "#odds");
        assert_eq!(localize_href("/english-premier-league", Locale::De), "/de/english-premier-league");
    }

    #[test]
    fn test_emoji_badge_in_paragraph() {
        let html = render("✅ Compare prices before every bet.");
        assert!(html.contains(
            "<p><span class=\"badge badge-success\" role=\"img\" aria-label=\"success\">✅</span> Compare prices"
        ));
    }

    #[test]
    fn test_emoji_badge_in_list_item() {
        let html = render("- ⚠️ Watch the vig\n- plain");
        assert!(html.contains("<li><span class=\"badge badge-warning\""));
    }

    #[test]
    fn test_emoji_not_badged_mid_sentence() {
        let html = render("Always ✅ check");
        assert!(!html.contains("badge"));
    }

    #[test]
    fn test_shortcode_expands_to_badge() {
        let html = render(":fire: Hot streak");
        assert!(html.contains("badge-hot"));
        assert!(html.contains("🔥"));
    }

    #[test]
    fn test_code_block_without_language() {
        let html = render("```\nlet x = 1 < 2;\n```");
        assert!(html.contains("<pre><code>let x = 1 &lt; 2;\n</code></pre>"));
    }

    #[test]
    fn test_code_block_with_rust_is_highlighted() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_code_block_unknown_language() {
        let html = render("```oddsql\nSELECT price\n```");
        assert!(html.contains("class=\"language-oddsql\""));
    }

    #[test]
    fn test_shortcodes_not_expanded_in_code() {
        let html = render("```\n:fire:\n```");
        assert!(html.contains(":fire:"));
    }

    #[test]
    fn test_render_empty_input() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_rendering_html_again_does_not_double_wrap() {
        let md = "## Heading\n\nFirst paragraph with **bold**\nand a soft break.\n\n\
                  ✅ Badge line\n\n- item\n- [link](/blog/a)\n\n> quote\n\n\
                  | A | B |\n|---|---|\n| 1 | 2 |";
        let once = render(md);
        let twice = render(&once);

        assert_eq!(once.matches("<p>").count(), twice.matches("<p>").count());
        assert!(!twice.contains("<p><p>"));
        assert!(!twice.contains("<p><h2"));
        assert_eq!(once.matches("badge-success").count(), twice.matches("badge-success").count());
    }

    #[test]
    fn test_rendering_code_with_blank_lines_again_is_stable() {
        for md in [
            "Intro\n\n```\na\n\nb\n```",
            "Intro\n\n```rust\nlet a = 1;\n\nlet b = 2;\n```\n\nOutro",
            "Intro\n\n    indented\n\n    code\n\nOutro",
        ] {
            let once = render(md);
            let twice = render(&once);
            assert_eq!(once.matches("<p>").count(), twice.matches("<p>").count(), "{}", md);
            assert!(!twice.contains("</pre></p>"), "{}", twice);
        }

        let once = render("Intro\n\n```\na\n\nb\n```");
        assert!(once.contains("<pre><code>a\n\nb\n</code></pre>"));
        assert!(once.contains("</p>\n\n<pre>"));
    }

    #[test]
    fn test_html_escape_function() {
        assert_eq!(html_escape("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Over/Under 2.5 Goals!"), "over-under-2-5-goals");
        assert_eq!(slugify("???"), "section");
    }
}
