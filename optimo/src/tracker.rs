//! Attachment tracker.
//!
//! Keeps the one-trigger-per-surface bookkeeping. The marker attribute on the
//! surface itself is the source of truth for idempotency, the map here only
//! routes trigger clicks back to their surface and lets removed surfaces be
//! cleaned up.

use crate::document::{
    ControlKind, CssPosition, ElementId, HostDocument, ListenKind, ListenTarget, ListenerId,
};
use crate::positioner::{place, OverlayMetrics, OverlayRole};
use std::collections::HashMap;

/// A trigger attached to a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// The prompt surface.
    pub surface: ElementId,
    /// The trigger control.
    pub trigger: ElementId,
    /// Positioned ancestor the trigger lives in.
    pub container: ElementId,
    /// Container that was switched from static to relative positioning.
    pub promoted_ancestor: Option<ElementId>,
    listener: ListenerId,
}

/// Result of [`Tracker::attach`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    /// A trigger was created.
    Attached(Attachment),
    /// The surface already carries the marker.
    AlreadyAttached,
    /// The surface left the document.
    Vanished,
}

/// Per-session attachment state.
#[derive(Debug)]
pub struct Tracker {
    marker: String,
    attachments: HashMap<ElementId, Attachment>,
}

impl Tracker {
    /// A tracker using `marker` as the idempotency attribute.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            attachments: HashMap::new(),
        }
    }

    /// The idempotency attribute name.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Attach a trigger to `surface` unless it is already marked.
    pub fn attach<D: HostDocument + ?Sized>(
        &mut self,
        document: &mut D,
        surface: ElementId,
        metrics: &OverlayMetrics,
    ) -> AttachOutcome {
        if !document.contains(surface) {
            return AttachOutcome::Vanished;
        }
        if document.attribute(surface, &self.marker).is_some() {
            return AttachOutcome::AlreadyAttached;
        }

        let container = document.overlay_container(surface);
        let promoted_ancestor = match document.position(container) {
            Some(CssPosition::Static) => {
                document.set_position(container, CssPosition::Relative);
                Some(container)
            }
            _ => None,
        };

        let trigger = match document.create_control(container, ControlKind::Trigger) {
            Some(trigger) => trigger,
            None => return AttachOutcome::Vanished,
        };
        document.set_attribute(trigger, "title", "Optimize prompt");
        place(document, trigger, surface, container, OverlayRole::Trigger, metrics);
        let listener = document.listen(ListenTarget::Element(trigger), ListenKind::Click);
        document.set_attribute(surface, &self.marker, "true");

        if let Some(promoted) = promoted_ancestor {
            log::info!("promoted {:?} to relative positioning", promoted);
        }
        log::info!("attached trigger {:?} to surface {:?}", trigger, surface);

        let attachment = Attachment {
            surface,
            trigger,
            container,
            promoted_ancestor,
            listener,
        };
        self.attachments.insert(surface, attachment.clone());
        AttachOutcome::Attached(attachment)
    }

    /// Remove a surface's trigger and forget it.
    pub fn detach<D: HostDocument + ?Sized>(
        &mut self,
        document: &mut D,
        surface: ElementId,
    ) -> Option<Attachment> {
        let attachment = self.attachments.remove(&surface)?;
        document.unlisten(attachment.listener);
        document.remove(attachment.trigger);
        log::debug!("detached surface {:?}", surface);
        Some(attachment)
    }

    /// Drop every tracked surface that left the document or lost its trigger.
    ///
    /// A surface that is still present but whose trigger was removed has its
    /// marker cleared so the next scan attaches a fresh trigger.
    pub fn prune<D: HostDocument + ?Sized>(&mut self, document: &mut D) -> Vec<ElementId> {
        let mut gone: Vec<ElementId> = self
            .attachments
            .values()
            .filter(|a| !document.contains(a.surface) || !document.contains(a.trigger))
            .map(|a| a.surface)
            .collect();
        gone.sort();
        for surface in &gone {
            self.detach(document, *surface);
            if document.remove_attribute(*surface, &self.marker) {
                log::debug!("trigger of {:?} removed, surface unmarked", surface);
            }
        }
        gone
    }

    /// Surface whose trigger contains `target`.
    pub fn surface_for_trigger<D: HostDocument + ?Sized>(
        &self,
        document: &D,
        target: ElementId,
    ) -> Option<ElementId> {
        self.attachments
            .values()
            .find(|a| document.is_within(target, a.trigger))
            .map(|a| a.surface)
    }

    /// Attachment of a surface.
    pub fn attachment(&self, surface: ElementId) -> Option<&Attachment> {
        self.attachments.get(&surface)
    }

    /// Whether the surface has a trigger.
    pub fn is_attached(&self, surface: ElementId) -> bool {
        self.attachments.contains_key(&surface)
    }

    /// Recompute every trigger placement. Returns how many landed.
    pub fn reposition<D: HostDocument + ?Sized>(
        &self,
        document: &mut D,
        metrics: &OverlayMetrics,
    ) -> usize {
        self.attachments
            .values()
            .filter(|a| {
                place(
                    document,
                    a.trigger,
                    a.surface,
                    a.container,
                    OverlayRole::Trigger,
                    metrics,
                )
                .is_some()
            })
            .count()
    }

    /// Enable or disable a surface's trigger.
    pub fn set_busy<D: HostDocument + ?Sized>(
        &self,
        document: &mut D,
        surface: ElementId,
        busy: bool,
    ) {
        if let Some(attachment) = self.attachments.get(&surface) {
            document.set_disabled(attachment.trigger, busy);
        }
    }

    /// Number of tracked surfaces.
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}
