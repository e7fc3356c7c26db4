mod dom;

use regex::Regex;
use std::sync::LazyLock;

const BULLET: &str = "• ";

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n\s*\n").expect("static regex")
});

/// Minimal view of the editable region's tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentNode {
    Text(String),
    Element {
        tag: String,
        children: Vec<ContentNode>,
    },
    /// Comments, processing instructions and the like. Contribute nothing.
    Other,
}

impl ContentNode {
    pub fn text(s: impl Into<String>) -> Self {
        ContentNode::Text(s.into())
    }

    /// `tag` is matched case-insensitively.
    pub fn element(tag: &str, children: Vec<ContentNode>) -> Self {
        ContentNode::Element {
            tag: tag.to_ascii_lowercase(),
            children,
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol"
    )
}

/// Line-oriented rendering of `node`, before cleanup.
pub fn render_lines(node: &ContentNode) -> String {
    render(node, "")
}

/// `prior` is what the parent has emitted before this node.
fn render(node: &ContentNode, prior: &str) -> String {
    match node {
        ContentNode::Text(s) => s.clone(),
        ContentNode::Other => String::new(),
        ContentNode::Element { tag, children } => {
            let tag = tag.as_str();
            if tag == "br" {
                return "\n".to_string();
            }

            let block = is_block(tag);
            let mut result = String::new();
            if block && !prior.is_empty() {
                result.push('\n');
            }

            let mut inner = String::new();
            for child in children {
                let s = render(child, &inner);
                inner.push_str(&s);
            }

            if tag == "li" {
                result.push_str(BULLET);
                result.push_str(&inner);
                result.push('\n');
            } else {
                result.push_str(&inner);
                if block {
                    result.push('\n');
                }
            }
            result
        }
    }
}

/// Collapses runs of three or more line breaks (with any whitespace between) to one blank
/// line, then trims.
pub fn tidy(raw: &str) -> String {
    BLANK_RUN.replace_all(raw, "\n\n").trim().to_string()
}

/// Clipboard-ready plain text for `root`. `None` when nothing but whitespace remains.
pub fn plain_text(root: &ContentNode) -> Option<String> {
    let text = tidy(&render_lines(root));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
