//! Host document abstraction.
//!
//! The core never touches a concrete DOM. Everything it reads or writes on the
//! host page goes through [`HostDocument`], so the same session logic runs
//! against a browser binding, the in-memory [`MemoryDocument`] or a snapshot
//! imported from markup.
//!
//! The host page is treated as adversarial: elements can vanish between a
//! scan and their use, so every read returns an `Option` and every write
//! reports whether it landed.

mod memory;

pub use memory::{ElementSpec, MemoryDocument};

use crate::layout::{Placement, Rect};
use serde::{Deserialize, Serialize};

/// Stable identity of an element in the host document.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Handle of a registered event listener.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Computed CSS `position`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssPosition {
    /// Not a containing block for absolute children.
    #[default]
    Static,
    /// `position: relative`.
    Relative,
    /// `position: absolute`.
    Absolute,
    /// `position: fixed`.
    Fixed,
    /// `position: sticky`.
    Sticky,
}

impl CssPosition {
    /// Whether absolutely positioned children resolve against this element.
    pub fn is_positioned(&self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// Controls the core inserts into the host page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Round button placed on a surface that opens the panel.
    Trigger,
    /// The configuration panel container.
    Panel,
    /// Close control inside the panel.
    CloseButton,
    /// Submit control inside the panel.
    SubmitButton,
    /// Transient status message.
    Notice,
}

impl ControlKind {
    /// Class name given to the control.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Trigger => "optimo-trigger-btn",
            Self::Panel => "optimo-toolbar",
            Self::CloseButton => "optimo-close-btn",
            Self::SubmitButton => "optimo-optimize-btn",
            Self::Notice => "optimo-notification",
        }
    }

    /// Tag name used for the control.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Trigger | Self::CloseButton | Self::SubmitButton => "button",
            Self::Panel | Self::Notice => "div",
        }
    }
}

/// Change notifications dispatched on a surface after its content is replaced.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// `input`, bubbling.
    Input,
    /// `change`, bubbling.
    Change,
}

impl DomEvent {
    /// DOM event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
        }
    }
}

/// Where a listener is registered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// A single element.
    Element(ElementId),
    /// The whole document (outside-click detection).
    Document,
    /// The window (resize).
    Window,
}

/// Event types the core listens for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ListenKind {
    /// `click`.
    Click,
    /// `resize`.
    Resize,
}

/// A batch of child-list changes observed on the host document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
    /// Elements inserted into the document.
    pub added: Vec<ElementId>,
    /// Elements removed from the document.
    pub removed: Vec<ElementId>,
}

impl MutationRecord {
    /// A record of added elements.
    pub fn added(added: Vec<ElementId>) -> Self {
        Self {
            added,
            removed: Vec::new(),
        }
    }

    /// A record of removed elements.
    pub fn removed(removed: Vec<ElementId>) -> Self {
        Self {
            added: Vec::new(),
            removed,
        }
    }
}

/// Attributes of an ancestor that the classifier looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorSnapshot {
    /// `class` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// `data-testid` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
}

/// Immutable capture of the element attributes the classifier reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Lowercase tag name.
    pub tag: String,
    /// `id` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `class` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// `data-testid` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    /// `placeholder` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// `rows` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    /// Rendered height (`offsetHeight`).
    pub offset_height: f64,
    /// Ancestors, nearest first.
    #[serde(default)]
    pub ancestors: Vec<AncestorSnapshot>,
}

impl ElementSnapshot {
    /// Snapshot of a `textarea`.
    pub fn textarea() -> Self {
        Self {
            tag: "textarea".to_string(),
            ..Default::default()
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the class.
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the rows.
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Set the rendered height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.offset_height = height;
        self
    }

    /// Push an ancestor (call from nearest to farthest).
    pub fn with_ancestor(mut self, ancestor: AncestorSnapshot) -> Self {
        self.ancestors.push(ancestor);
        self
    }
}

/// The host page as seen by the core.
pub trait HostDocument {
    /// Fallback container for overlays (`document.body`).
    fn body(&self) -> ElementId;

    /// Whether the element is still attached to the document.
    fn contains(&self, id: ElementId) -> bool;

    /// Candidate input elements at or below `root`, in document order.
    fn candidates_within(&self, root: ElementId) -> Vec<ElementId>;

    /// Snapshot the attributes the classifier reads.
    fn snapshot(&self, id: ElementId) -> Option<ElementSnapshot>;

    /// Read an attribute.
    fn attribute(&self, id: ElementId, name: &str) -> Option<String>;

    /// Write an attribute.
    fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> bool;

    /// Drop an attribute. Returns whether it was present.
    fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool;

    /// Bounding box in viewport coordinates.
    fn bounding_rect(&self, id: ElementId) -> Option<Rect>;

    /// Nearest positioned ancestor (`offsetParent`), if any.
    fn offset_parent(&self, id: ElementId) -> Option<ElementId>;

    /// Computed CSS position.
    fn position(&self, id: ElementId) -> Option<CssPosition>;

    /// Override the inline CSS position.
    fn set_position(&mut self, id: ElementId, position: CssPosition) -> bool;

    /// Append a new control as the last child of `parent`.
    fn create_control(&mut self, parent: ElementId, kind: ControlKind) -> Option<ElementId>;

    /// Set the absolute offsets of a control.
    fn place(&mut self, id: ElementId, placement: Placement) -> bool;

    /// Enable or disable a control.
    fn set_disabled(&mut self, id: ElementId, disabled: bool) -> bool;

    /// Replace the text content of a control.
    fn set_text(&mut self, id: ElementId, text: &str) -> bool;

    /// Current value of an input element.
    fn value(&self, id: ElementId) -> Option<String>;

    /// Replace the value of an input element.
    fn set_value(&mut self, id: ElementId, value: &str) -> bool;

    /// Dispatch a bubbling event on an element.
    fn dispatch(&mut self, id: ElementId, event: DomEvent) -> bool;

    /// Remove an element and its subtree.
    fn remove(&mut self, id: ElementId) -> bool;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn is_within(&self, node: ElementId, ancestor: ElementId) -> bool;

    /// Register a listener.
    fn listen(&mut self, target: ListenTarget, kind: ListenKind) -> ListenerId;

    /// Remove a listener.
    fn unlisten(&mut self, listener: ListenerId) -> bool;

    /// Whether the element is, or contains, a candidate input.
    fn holds_candidate(&self, id: ElementId) -> bool {
        !self.candidates_within(id).is_empty()
    }

    /// Container that absolutely positioned overlays for `id` resolve against.
    fn overlay_container(&self, id: ElementId) -> ElementId {
        self.offset_parent(id).unwrap_or_else(|| self.body())
    }
}
