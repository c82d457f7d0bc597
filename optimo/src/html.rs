//! Static HTML import.
//!
//! Builds [`ElementSnapshot`]s for every `textarea` in saved markup so the
//! classifier can be run against a page without a live document. Ancestor
//! context is recovered with descendant selectors: when a container selector
//! matches, a synthetic ancestor carrying the matched fragment is recorded.
//! Rendered height is unknown offline and is read from an inline
//! `height: <n>px` style when present.

use crate::document::{AncestorSnapshot, ElementSnapshot};
use crate::error::{OptimoError, OptimoResult};
use crate::scanner::{classify, signals, Signal};
use lol_html::{element, rewrite_str, RewriteStrSettings};
use serde::Serialize;
use std::cell::RefCell;

fn inline_height(style: &str) -> Option<f64> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("height") {
            value.trim().strip_suffix("px")?.trim().parse().ok()
        } else {
            None
        }
    })
}

fn push_ancestor(snapshots: &RefCell<Vec<ElementSnapshot>>, ancestor: AncestorSnapshot) {
    if let Some(last) = snapshots.borrow_mut().last_mut() {
        last.ancestors.push(ancestor);
    }
}

fn class_hint(fragment: &str) -> AncestorSnapshot {
    AncestorSnapshot {
        class_name: Some(fragment.to_string()),
        test_id: None,
    }
}

/// Snapshot every `textarea` in `html`, in document order.
pub fn snapshot_html(html: &str) -> OptimoResult<Vec<ElementSnapshot>> {
    let snapshots: RefCell<Vec<ElementSnapshot>> = RefCell::new(Vec::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("textarea", |el| {
                    snapshots.borrow_mut().push(ElementSnapshot {
                        tag: "textarea".into(),
                        id: el.get_attribute("id"),
                        class_name: el.get_attribute("class"),
                        test_id: el.get_attribute("data-testid"),
                        placeholder: el.get_attribute("placeholder"),
                        rows: el
                            .get_attribute("rows")
                            .and_then(|r| r.trim().parse().ok()),
                        offset_height: el
                            .get_attribute("style")
                            .and_then(|s| inline_height(&s))
                            .unwrap_or_default(),
                        ancestors: Vec::new(),
                    });
                    Ok(())
                }),
                element!("[data-testid*='textbox'] textarea", |_el| {
                    push_ancestor(
                        &snapshots,
                        AncestorSnapshot {
                            class_name: None,
                            test_id: Some("textbox".into()),
                        },
                    );
                    Ok(())
                }),
                element!("[class*='input'] textarea", |_el| {
                    push_ancestor(&snapshots, class_hint("input"));
                    Ok(())
                }),
                element!("[class*='message'] textarea", |_el| {
                    push_ancestor(&snapshots, class_hint("message"));
                    Ok(())
                }),
                element!("[class*='prompt'] textarea", |_el| {
                    push_ancestor(&snapshots, class_hint("prompt"));
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|e| OptimoError::Html(e.to_string()))?;

    Ok(snapshots.into_inner())
}

/// Classification of one imported element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceAudit {
    /// Position among the page's textareas.
    pub index: usize,
    /// Whether the element would get a trigger.
    pub is_prompt_surface: bool,
    /// Signals that fired.
    pub signals: Vec<Signal>,
    /// The imported attributes.
    pub snapshot: ElementSnapshot,
}

/// Import `html` and classify every textarea.
pub fn audit_html(html: &str) -> OptimoResult<Vec<SurfaceAudit>> {
    Ok(snapshot_html(html)?
        .into_iter()
        .enumerate()
        .map(|(index, snapshot)| SurfaceAudit {
            index,
            is_prompt_surface: classify(&snapshot),
            signals: signals(&snapshot),
            snapshot,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <form class="shipping"><textarea id="address" rows="2"></textarea></form>
        <div data-testid="composer-textbox">
            <textarea placeholder="Reply..."></textarea>
        </div>
        <main class="chat-input-area">
            <section><textarea id="q" style="resize: none; height: 120px"></textarea></section>
        </main>
        <textarea placeholder="Ask me anything" rows="1"></textarea>
    </body></html>"#;

    #[test]
    fn test_snapshot_html_reads_attributes() {
        let snapshots = snapshot_html(PAGE).unwrap();
        assert_eq!(snapshots.len(), 4);

        assert_eq!(snapshots[0].id.as_deref(), Some("address"));
        assert_eq!(snapshots[0].rows, Some(2));
        assert!(snapshots[0].ancestors.is_empty());

        assert_eq!(snapshots[1].ancestors.len(), 1);
        assert_eq!(snapshots[1].ancestors[0].test_id.as_deref(), Some("textbox"));

        assert_eq!(snapshots[2].offset_height, 120.0);
        assert_eq!(snapshots[2].ancestors[0].class_name.as_deref(), Some("input"));

        assert_eq!(snapshots[3].placeholder.as_deref(), Some("Ask me anything"));
    }

    #[test]
    fn test_audit_html() {
        let audit = audit_html(PAGE).unwrap();
        let verdicts: Vec<bool> = audit.iter().map(|a| a.is_prompt_surface).collect();
        assert_eq!(verdicts, vec![false, true, true, true]);
        assert_eq!(audit[1].signals, vec![Signal::ContainerHint]);
        assert_eq!(audit[3].signals, vec![Signal::PlaceholderKeyword]);
        assert!(audit[2].signals.contains(&Signal::Size));
    }

    #[test]
    fn test_inline_height() {
        assert_eq!(inline_height("height:64px"), Some(64.0));
        assert_eq!(inline_height("min-height: 64px"), None);
        assert_eq!(inline_height("height: 50%"), None);
    }

    #[test]
    fn test_empty_document() {
        assert!(snapshot_html("<p>nothing here</p>").unwrap().is_empty());
    }
}
