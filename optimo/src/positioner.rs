//! Overlay positioner and the single panel slot.

use crate::document::{ControlKind, ElementId, HostDocument, ListenKind, ListenTarget, ListenerId};
use crate::entitlement::Tier;
use crate::layout::{Placement, Rect};

/// Label of the submit control.
pub const SUBMIT_LABEL: &str = "Optimize Prompt";
/// Label of the submit control while a request is pending.
pub const BUSY_LABEL: &str = "Optimizing...";

/// Overlay geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OverlayMetrics {
    /// Distance of the trigger from the anchor's top and right edges.
    pub trigger_inset: f64,
    /// Trigger width and height.
    pub trigger_size: f64,
    /// Gap between the anchor's bottom edge and the panel.
    pub panel_gap: f64,
}

impl Default for OverlayMetrics {
    fn default() -> Self {
        Self {
            trigger_inset: 8.0,
            trigger_size: 32.0,
            panel_gap: 8.0,
        }
    }
}

/// Which overlay is being placed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverlayRole {
    /// Inside the anchor's top-right corner.
    Trigger,
    /// Directly below the anchor, left-aligned.
    Panel,
}

/// Trigger offsets inside the container so it sits in the anchor's top-right corner.
pub fn place_trigger(anchor: &Rect, container: &Rect, metrics: &OverlayMetrics) -> Placement {
    Placement::new(
        anchor.right() - container.left - (metrics.trigger_size + metrics.trigger_inset),
        anchor.top - container.top + metrics.trigger_inset,
    )
}

/// Panel offsets inside the container so it sits directly below the anchor.
pub fn place_panel(anchor: &Rect, container: &Rect, metrics: &OverlayMetrics) -> Placement {
    Placement::new(
        anchor.left - container.left,
        anchor.bottom() - container.top + metrics.panel_gap,
    )
}

/// Compute and apply the placement of `overlay` for `anchor`.
///
/// Returns `None` when the anchor, container or overlay left the document.
pub fn place<D: HostDocument + ?Sized>(
    document: &mut D,
    overlay: ElementId,
    anchor: ElementId,
    container: ElementId,
    role: OverlayRole,
    metrics: &OverlayMetrics,
) -> Option<Placement> {
    let anchor_rect = document.bounding_rect(anchor)?;
    let container_rect = document.bounding_rect(container)?;
    let placement = match role {
        OverlayRole::Trigger => place_trigger(&anchor_rect, &container_rect, metrics),
        OverlayRole::Panel => place_panel(&anchor_rect, &container_rect, metrics),
    };
    if document.place(overlay, placement) {
        Some(placement)
    } else {
        None
    }
}

/// An open configuration panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Surface that owns the panel.
    pub surface: ElementId,
    /// Trigger that opened it.
    pub trigger: Option<ElementId>,
    /// Panel container element.
    pub root: ElementId,
    /// Close control.
    pub close: Option<ElementId>,
    /// Submit control.
    pub submit: Option<ElementId>,
    /// Positioned ancestor holding the panel.
    pub container: ElementId,
    /// Tier rendered into the panel when it was opened.
    pub tier: Tier,
    listeners: Vec<ListenerId>,
}

/// Where a click landed relative to the open panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PanelClick {
    /// No panel is open.
    NoPanel,
    /// The panel's close control.
    Close,
    /// The panel's submit control.
    Submit,
    /// Somewhere else inside the panel.
    Inside,
    /// The trigger that owns the panel.
    OwnTrigger,
    /// Outside both the panel and its trigger.
    Outside,
}

/// The one panel slot of a session.
#[derive(Debug, Default)]
pub struct PanelSlot {
    current: Option<Panel>,
}

impl PanelSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open panel.
    pub fn current(&self) -> Option<&Panel> {
        self.current.as_ref()
    }

    /// Whether a panel is open.
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Open a panel for `surface`, tearing down any open panel first.
    pub fn open<D: HostDocument + ?Sized>(
        &mut self,
        document: &mut D,
        surface: ElementId,
        trigger: Option<ElementId>,
        tier: Tier,
        metrics: &OverlayMetrics,
    ) -> Option<&Panel> {
        self.close(document);

        if !document.contains(surface) {
            log::warn!("panel requested for detached surface {:?}", surface);
            return None;
        }

        let container = document.overlay_container(surface);
        let root = document.create_control(container, ControlKind::Panel)?;
        document.set_attribute(root, "data-tier", tier.as_str());

        let close = document.create_control(root, ControlKind::CloseButton);
        let submit = document.create_control(root, ControlKind::SubmitButton);
        if let Some(submit) = submit {
            document.set_text(submit, SUBMIT_LABEL);
        }

        place(document, root, surface, container, OverlayRole::Panel, metrics);

        let mut listeners = Vec::with_capacity(3);
        listeners.push(document.listen(ListenTarget::Document, ListenKind::Click));
        for control in [close, submit].into_iter().flatten() {
            listeners.push(document.listen(ListenTarget::Element(control), ListenKind::Click));
        }

        log::debug!("panel opened for {:?} ({})", surface, tier.as_str());

        self.current = Some(Panel {
            surface,
            trigger,
            root,
            close,
            submit,
            container,
            tier,
            listeners,
        });
        self.current.as_ref()
    }

    /// Close the open panel, removing its element and listeners.
    pub fn close<D: HostDocument + ?Sized>(&mut self, document: &mut D) -> Option<Panel> {
        let panel = self.current.take()?;
        for listener in &panel.listeners {
            document.unlisten(*listener);
        }
        document.remove(panel.root);
        log::debug!("panel closed for {:?}", panel.surface);
        Some(panel)
    }

    /// Classify a click target.
    pub fn classify_click<D: HostDocument + ?Sized>(
        &self,
        document: &D,
        target: ElementId,
    ) -> PanelClick {
        let panel = match &self.current {
            Some(panel) => panel,
            None => return PanelClick::NoPanel,
        };
        if panel.close == Some(target) {
            PanelClick::Close
        } else if panel.submit == Some(target) {
            PanelClick::Submit
        } else if document.is_within(target, panel.root) {
            PanelClick::Inside
        } else if panel
            .trigger
            .map(|t| document.is_within(target, t))
            .unwrap_or(false)
        {
            PanelClick::OwnTrigger
        } else {
            PanelClick::Outside
        }
    }

    /// Recompute the panel placement after a layout change.
    pub fn reposition<D: HostDocument + ?Sized>(
        &self,
        document: &mut D,
        metrics: &OverlayMetrics,
    ) -> Option<Placement> {
        let panel = self.current.as_ref()?;
        place(
            document,
            panel.root,
            panel.surface,
            panel.container,
            OverlayRole::Panel,
            metrics,
        )
    }

    /// Toggle the busy state of the submit control.
    pub fn set_busy<D: HostDocument + ?Sized>(&self, document: &mut D, busy: bool) {
        if let Some(submit) = self.current.as_ref().and_then(|p| p.submit) {
            document.set_disabled(submit, busy);
            document.set_text(submit, if busy { BUSY_LABEL } else { SUBMIT_LABEL });
        }
    }
}
