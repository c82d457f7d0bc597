//! Surface scanner.
//!
//! Finds candidate inputs in the host document and decides which of them are
//! prompt surfaces. Classification is an OR over a fixed, ordered list of
//! independent signals. False positives only cost a harmless trigger button,
//! so the heuristic leans toward inclusion.

use crate::document::{ElementId, ElementSnapshot, HostDocument, MutationRecord};
use crate::positioner::OverlayMetrics;
use crate::tracker::{AttachOutcome, Tracker};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use lazy_static::lazy_static;
use serde::Serialize;

/// Placeholder words typical of chat composers.
const PLACEHOLDER_KEYWORDS: [&str; 5] = ["message", "ask", "chat", "prompt", "type"];
/// Words found in the `id`/`class` of prompt inputs.
const NAMING_KEYWORDS: [&str; 3] = ["prompt", "message", "input"];
/// Class fragments of composer containers.
const CONTAINER_CLASS_HINTS: [&str; 3] = ["input", "message", "prompt"];
/// `data-testid` fragment of composer containers.
const CONTAINER_TEST_ID_HINT: &str = "textbox";
/// Rendered height above which an input counts as a prompt area.
const MIN_PROMPT_HEIGHT: f64 = 50.0;
/// Row count above which an input counts as a prompt area.
const MIN_PROMPT_ROWS: u32 = 2;

lazy_static! {
    static ref PLACEHOLDER_AC: AhoCorasick = AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(PLACEHOLDER_KEYWORDS)
        .expect("valid placeholder keywords");
    static ref NAMING_AC: AhoCorasick = AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(NAMING_KEYWORDS)
        .expect("valid naming keywords");
    /// Attribute substring selectors are case-sensitive.
    static ref CONTAINER_CLASS_AC: AhoCorasick =
        AhoCorasick::new(CONTAINER_CLASS_HINTS).expect("valid container hints");
}

/// One classification signal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Placeholder mentions messaging or prompting.
    PlaceholderKeyword,
    /// `id` names a prompt/message/input.
    IdentifierKeyword,
    /// `class` names a prompt/message/input.
    ClassKeyword,
    /// The element or an ancestor looks like a composer container.
    ContainerHint,
    /// The element is tall enough to be a prompt area.
    Size,
}

impl Signal {
    /// All signals in evaluation order.
    pub const ALL: [Signal; 5] = [
        Signal::PlaceholderKeyword,
        Signal::IdentifierKeyword,
        Signal::ClassKeyword,
        Signal::ContainerHint,
        Signal::Size,
    ];

    /// Whether this signal fires for the snapshot.
    pub fn fires(&self, snapshot: &ElementSnapshot) -> bool {
        match self {
            Self::PlaceholderKeyword => matches_opt(&PLACEHOLDER_AC, &snapshot.placeholder),
            Self::IdentifierKeyword => matches_opt(&NAMING_AC, &snapshot.id),
            Self::ClassKeyword => matches_opt(&NAMING_AC, &snapshot.class_name),
            Self::ContainerHint => {
                container_hint(&snapshot.class_name, &snapshot.test_id)
                    || snapshot
                        .ancestors
                        .iter()
                        .any(|a| container_hint(&a.class_name, &a.test_id))
            }
            Self::Size => {
                snapshot.offset_height > MIN_PROMPT_HEIGHT
                    || snapshot.rows.map(|r| r > MIN_PROMPT_ROWS).unwrap_or(false)
            }
        }
    }

    /// Short name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlaceholderKeyword => "placeholder_keyword",
            Self::IdentifierKeyword => "identifier_keyword",
            Self::ClassKeyword => "class_keyword",
            Self::ContainerHint => "container_hint",
            Self::Size => "size",
        }
    }
}

fn matches_opt(ac: &AhoCorasick, value: &Option<String>) -> bool {
    value.as_deref().map(|v| ac.is_match(v)).unwrap_or(false)
}

fn container_hint(class_name: &Option<String>, test_id: &Option<String>) -> bool {
    matches_opt(&CONTAINER_CLASS_AC, class_name)
        || test_id
            .as_deref()
            .map(|t| t.contains(CONTAINER_TEST_ID_HINT))
            .unwrap_or(false)
}

/// Whether the snapshot describes a prompt surface: true if any signal fires.
pub fn classify(snapshot: &ElementSnapshot) -> bool {
    Signal::ALL.iter().any(|s| s.fires(snapshot))
}

/// The signals that fire for the snapshot, in evaluation order.
pub fn signals(snapshot: &ElementSnapshot) -> Vec<Signal> {
    Signal::ALL
        .iter()
        .copied()
        .filter(|s| s.fires(snapshot))
        .collect()
}

/// Candidate inputs at or below `root` that do not carry the marker yet.
pub fn scan<D: HostDocument + ?Sized>(document: &D, root: ElementId, marker: &str) -> Vec<ElementId> {
    document
        .candidates_within(root)
        .into_iter()
        .filter(|id| document.attribute(*id, marker).is_none())
        .collect()
}

/// Whether a mutation added an element that is, or contains, a candidate.
pub fn mutation_requires_rescan<D: HostDocument + ?Sized>(
    document: &D,
    record: &MutationRecord,
) -> bool {
    record
        .added
        .iter()
        .any(|id| document.contains(*id) && document.holds_candidate(*id))
}

/// Outcome of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Unmarked candidates looked at.
    pub examined: usize,
    /// Surfaces that received a trigger in this pass.
    pub attached: Vec<ElementId>,
    /// Candidates no signal fired for.
    pub rejected: usize,
    /// Candidates that left the document mid-pass.
    pub vanished: usize,
}

/// Scan the whole document, classify unmarked candidates and attach a
/// trigger to every prompt surface.
pub fn scan_pass<D: HostDocument + ?Sized>(
    document: &mut D,
    tracker: &mut Tracker,
    metrics: &OverlayMetrics,
) -> ScanReport {
    let root = document.body();
    let candidates = scan(document, root, tracker.marker());
    let mut report = ScanReport {
        examined: candidates.len(),
        ..Default::default()
    };

    for id in candidates {
        let snapshot = match document.snapshot(id) {
            Some(snapshot) => snapshot,
            None => {
                report.vanished += 1;
                continue;
            }
        };

        if !classify(&snapshot) {
            report.rejected += 1;
            continue;
        }

        match tracker.attach(document, id, metrics) {
            AttachOutcome::Attached(_) => report.attached.push(id),
            AttachOutcome::AlreadyAttached => (),
            AttachOutcome::Vanished => report.vanished += 1,
        }
    }

    log::debug!(
        "scan pass: examined={} attached={} rejected={} vanished={}",
        report.examined,
        report.attached.len(),
        report.rejected,
        report.vanished
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AncestorSnapshot;

    #[test]
    fn test_plain_textarea_is_rejected() {
        let snapshot = ElementSnapshot::textarea().with_height(40.0).with_rows(2);
        assert!(!classify(&snapshot));
        assert!(signals(&snapshot).is_empty());
    }

    #[test]
    fn test_placeholder_keywords_are_case_insensitive() {
        let snapshot = ElementSnapshot::textarea().with_placeholder("Send a MESSAGE to ChatBot");
        assert!(classify(&snapshot));
        assert_eq!(signals(&snapshot), vec![Signal::PlaceholderKeyword]);

        let snapshot = ElementSnapshot::textarea().with_placeholder("Type here");
        assert!(classify(&snapshot));

        let snapshot = ElementSnapshot::textarea().with_placeholder("Address line 2");
        assert!(!classify(&snapshot));
    }

    #[test]
    fn test_identifier_and_class_keywords() {
        let snapshot = ElementSnapshot::textarea().with_id("PromptTextarea");
        assert_eq!(signals(&snapshot), vec![Signal::IdentifierKeyword]);

        let snapshot = ElementSnapshot::textarea().with_class("composer Message-box");
        assert_eq!(signals(&snapshot), vec![Signal::ClassKeyword]);
    }

    #[test]
    fn test_container_hints_follow_attribute_selector_rules() {
        let snapshot = ElementSnapshot::textarea().with_ancestor(AncestorSnapshot {
            class_name: None,
            test_id: Some("chat-textbox-root".into()),
        });
        assert_eq!(signals(&snapshot), vec![Signal::ContainerHint]);

        let snapshot = ElementSnapshot::textarea()
            .with_ancestor(AncestorSnapshot::default())
            .with_ancestor(AncestorSnapshot {
                class_name: Some("user-input-wrapper".into()),
                test_id: None,
            });
        assert!(classify(&snapshot));

        // Substring selectors do not fold case.
        let snapshot = ElementSnapshot::textarea().with_ancestor(AncestorSnapshot {
            class_name: Some("UserInput".into()),
            test_id: None,
        });
        assert!(!classify(&snapshot));
    }

    #[test]
    fn test_container_hint_includes_element_itself() {
        let mut snapshot = ElementSnapshot::textarea();
        snapshot.test_id = Some("textbox".into());
        assert_eq!(signals(&snapshot), vec![Signal::ContainerHint]);
    }

    #[test]
    fn test_size_signal() {
        assert!(classify(&ElementSnapshot::textarea().with_height(51.0)));
        assert!(!classify(&ElementSnapshot::textarea().with_height(50.0)));
        assert!(classify(&ElementSnapshot::textarea().with_rows(3)));
    }

    #[test]
    fn test_signals_keep_evaluation_order() {
        let snapshot = ElementSnapshot::textarea()
            .with_rows(6)
            .with_class("prompt-input")
            .with_placeholder("Ask anything");
        assert_eq!(
            signals(&snapshot),
            vec![
                Signal::PlaceholderKeyword,
                Signal::ClassKeyword,
                Signal::ContainerHint,
                Signal::Size
            ]
        );
    }
}
