//! Comment rendering for the `parsedcomment` property

use crate::model::Entity;

/// Renders a revision comment into display markup
///
/// Injected into the projector so rendering never depends on ambient
/// session state.
pub trait CommentRenderer: Send + Sync {
    fn render(&self, comment: &str, entity: &Entity) -> String;
}

/// Renderer that HTML-escapes the comment text
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapingRenderer;

impl CommentRenderer for EscapingRenderer {
    fn render(&self, comment: &str, _entity: &Entity) -> String {
        let mut out = String::with_capacity(comment.len());
        for c in comment.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                other => out.push(other),
            }
        }
        out
    }
}
