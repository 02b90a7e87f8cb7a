use crate::types::HtmlRenderer;
use scraper::{node::Node, ElementRef, Html};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Plain-text renderer for feed summaries that keeps media as inline markers.
///
/// Block elements start a new line, `<br>` is a newline, `<img>` becomes
/// `[img:SRC]` and `<video>` becomes `[video:SRC]` (falling back to its first
/// `<source>`). Everything else contributes its text, with whitespace runs
/// collapsed to one space outside `<pre>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerRenderer;

impl HtmlRenderer for MarkerRenderer {
    fn render(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let mut output = String::new();
        render_children(fragment.root_element(), &mut output, false);
        tidy_lines(&output)
    }
}

fn render_children(element: ElementRef<'_>, output: &mut String, preformatted: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) if preformatted => output.push_str(text),
            Node::Text(text) => push_collapsed(text, output),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    render_element(child_element, output, preformatted);
                }
            }
            _ => {}
        }
    }
}

// Source whitespace becomes a single space, never at the start of a line.
fn push_collapsed(text: &str, output: &mut String) {
    for c in text.chars() {
        if !c.is_whitespace() {
            output.push(c);
        } else if !output.is_empty() && !output.ends_with([' ', '\n']) {
            output.push(' ');
        }
    }
}

fn render_element(element: ElementRef<'_>, output: &mut String, preformatted: bool) {
    let name = element.value().name();
    match name {
        "br" => output.push('\n'),
        "img" => {
            if let Some(src) = element.value().attr("src") {
                output.push_str(&format!("[img:{}]", src));
            }
        }
        "video" => {
            if let Some(src) = video_source(element) {
                output.push_str(&format!("[video:{}]", src));
            }
        }
        _ if SKIPPED_ELEMENTS.contains(&name) => {}
        _ if BLOCK_ELEMENTS.contains(&name) => {
            start_line(output);
            render_children(element, output, preformatted || name == "pre");
            start_line(output);
        }
        _ => render_children(element, output, preformatted),
    }
}

fn video_source(element: ElementRef<'_>) -> Option<String> {
    if let Some(src) = element.value().attr("src") {
        return Some(src.to_string());
    }
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "source")
        .and_then(|source| source.value().attr("src"))
        .map(str::to_string)
}

fn start_line(output: &mut String) {
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
}

/// Trim each line's trailing spaces and the leading blank lines.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .skip_while(|line| line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
