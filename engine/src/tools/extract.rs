//! HTML content extraction
//!
//! Turns a fetched HTML document into `(title, plain text)`. The primary
//! content is the densest `article`, `main` or content-classed `div`
//! container; pages without one fall back to their paragraphs.

use regex::Regex;

/// Title used when a page has none
pub const UNTITLED: &str = "Untitled";

/// Marker appended to truncated text
pub const TRUNCATION_MARKER: &str = "...";

/// Extracted page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub text: String,
}

/// Heuristic main-content extractor
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    noise: Regex,
    title: Regex,
    container_tag: Regex,
    content_class: Regex,
    paragraph: Regex,
}

impl ContentExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            noise: Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->")?,
            title: Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>")?,
            container_tag: Regex::new(r"(?i)<(/?)(article|main|div)\b([^>]*)>")?,
            content_class: Regex::new(r#"(?i)\bclass\s*=\s*["']?[^"'>]*(content|main|article)"#)?,
            paragraph: Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>")?,
        })
    }

    /// Extract the title and primary text of an HTML document
    pub fn extract(&self, html: &str) -> ExtractedContent {
        let cleaned = self.noise.replace_all(html, "");

        let title = self
            .title
            .captures(&cleaned)
            .and_then(|c| c.get(1))
            .map(|m| render_text(m.as_str()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let best = self
            .candidate_fragments(&cleaned)
            .into_iter()
            .map(render_text)
            .filter(|t| !t.is_empty())
            .max_by_key(|t| t.chars().count());

        let text = best.unwrap_or_else(|| self.paragraph_text(&cleaned));

        ExtractedContent { title, text }
    }

    /// Inner HTML of every candidate container, in document order
    fn candidate_fragments<'a>(&self, html: &'a str) -> Vec<&'a str> {
        let tags: Vec<_> = self.container_tag.captures_iter(html).collect();
        let mut fragments = Vec::new();

        for (i, open) in tags.iter().enumerate() {
            let (Some(whole), Some(slash), Some(name), Some(attrs)) =
                (open.get(0), open.get(1), open.get(2), open.get(3))
            else {
                continue;
            };
            if !slash.as_str().is_empty() {
                continue;
            }
            let name = name.as_str().to_ascii_lowercase();
            if name == "div" && !self.content_class.is_match(attrs.as_str()) {
                continue;
            }

            // Find the matching close tag of the same name
            let mut depth = 1usize;
            for tag in &tags[i + 1..] {
                let (Some(t_whole), Some(t_slash), Some(t_name)) = (tag.get(0), tag.get(1), tag.get(2))
                else {
                    continue;
                };
                if !t_name.as_str().eq_ignore_ascii_case(&name) {
                    continue;
                }
                if t_slash.as_str().is_empty() {
                    depth += 1;
                } else {
                    depth -= 1;
                    if depth == 0 {
                        fragments.push(&html[whole.end()..t_whole.start()]);
                        break;
                    }
                }
            }
        }

        fragments
    }

    fn paragraph_text(&self, html: &str) -> String {
        self.paragraph
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .map(|m| render_text(m.as_str()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render an HTML fragment as text with whitespace collapsed
fn render_text(fragment: &str) -> String {
    let rendered = match htmd::convert(fragment) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("HTML conversion failed, using raw fragment: {}", e);
            fragment.to_string()
        }
    };

    rendered
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cap `text` at `max_chars` characters, appending `...` when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
