//! In-memory host document.

use super::{
    AncestorSnapshot, ControlKind, CssPosition, DomEvent, ElementId, ElementSnapshot,
    HostDocument, ListenKind, ListenTarget, ListenerId,
};
use crate::layout::{Placement, Rect};
use std::collections::{BTreeMap, HashMap};

/// Description of an element to append to a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    rect: Rect,
    position: CssPosition,
    value: String,
}

impl ElementSpec {
    /// A new element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// A `textarea`.
    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    /// A `div`.
    pub fn div() -> Self {
        Self::new("div")
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the `id`.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Set the `class`.
    pub fn class(self, class_name: impl Into<String>) -> Self {
        self.attr("class", class_name)
    }

    /// Set the `placeholder`.
    pub fn placeholder(self, placeholder: impl Into<String>) -> Self {
        self.attr("placeholder", placeholder)
    }

    /// Set `rows`.
    pub fn rows(self, rows: u32) -> Self {
        self.attr("rows", rows.to_string())
    }

    /// Set the bounding box.
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the computed position.
    pub fn position(mut self, position: CssPosition) -> Self {
        self.position = position;
        self
    }

    /// Set the initial value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    rect: Rect,
    position: CssPosition,
    value: String,
    text: String,
    placement: Option<Placement>,
    disabled: bool,
    control: Option<ControlKind>,
}

/// A small DOM kept in memory.
///
/// Implements [`HostDocument`] with tree structure, geometry, computed
/// position, listener bookkeeping and a log of dispatched events. Used by the
/// test suite and the CLI.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: HashMap<ElementId, Node>,
    root: ElementId,
    body: ElementId,
    next_id: u64,
    listeners: BTreeMap<ListenerId, (ListenTarget, ListenKind)>,
    next_listener: u64,
    dispatched: Vec<(ElementId, DomEvent)>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Default viewport size.
    const VIEWPORT: Rect = Rect {
        left: 0.0,
        top: 0.0,
        width: 1280.0,
        height: 800.0,
    };

    /// An empty document with `<html><body></body></html>`.
    pub fn new() -> Self {
        let root = ElementId(0);
        let body = ElementId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                tag: "html".into(),
                children: vec![body],
                rect: Self::VIEWPORT,
                ..Default::default()
            },
        );
        nodes.insert(
            body,
            Node {
                tag: "body".into(),
                parent: Some(root),
                rect: Self::VIEWPORT,
                ..Default::default()
            },
        );
        Self {
            nodes,
            root,
            body,
            next_id: 2,
            listeners: BTreeMap::new(),
            next_listener: 0,
            dispatched: Vec::new(),
        }
    }

    fn allocate(&mut self, parent: ElementId, node: Node) -> Option<ElementId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                ..node
            },
        );
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        Some(id)
    }

    /// Append an element as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, spec: ElementSpec) -> Option<ElementId> {
        self.allocate(
            parent,
            Node {
                tag: spec.tag,
                attributes: spec.attributes,
                rect: spec.rect,
                position: spec.position,
                value: spec.value,
                ..Default::default()
            },
        )
    }

    /// Update an element's bounding box (layout change).
    pub fn set_rect(&mut self, id: ElementId, rect: Rect) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Parent of an element.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Tag name of an element.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.tag.as_str())
    }

    /// Controls of a kind currently in the document, in creation order.
    pub fn controls(&self, kind: ControlKind) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.control == Some(kind))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Controls of a kind that are children of `parent`.
    pub fn child_controls(&self, parent: ElementId, kind: ControlKind) -> Vec<ElementId> {
        self.nodes
            .get(&parent)
            .map(|p| {
                p.children
                    .iter()
                    .copied()
                    .filter(|c| self.nodes.get(c).and_then(|n| n.control) == Some(kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Placement applied to a control.
    pub fn placement(&self, id: ElementId) -> Option<Placement> {
        self.nodes.get(&id).and_then(|n| n.placement)
    }

    /// Text content of a control.
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.text.as_str())
    }

    /// Whether a control is disabled.
    pub fn is_disabled(&self, id: ElementId) -> bool {
        self.nodes.get(&id).map(|n| n.disabled).unwrap_or(false)
    }

    /// Events dispatched so far.
    pub fn dispatched(&self) -> &[(ElementId, DomEvent)] {
        &self.dispatched
    }

    /// Events dispatched on one element.
    pub fn dispatched_on(&self, id: ElementId) -> Vec<DomEvent> {
        self.dispatched
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, e)| *e)
            .collect()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listeners on a target.
    pub fn listeners_on(&self, target: ListenTarget) -> usize {
        self.listeners.values().filter(|(t, _)| *t == target).count()
    }

    fn walk(&self, root: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.nodes.get(&root) {
            out.push(root);
            for child in &node.children {
                self.walk(*child, out);
            }
        }
    }

    fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }
}

impl HostDocument for MemoryDocument {
    fn body(&self) -> ElementId {
        self.body
    }

    fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn candidates_within(&self, root: ElementId) -> Vec<ElementId> {
        let mut all = Vec::new();
        self.walk(root, &mut all);
        all.retain(|id| self.tag(*id) == Some("textarea"));
        all
    }

    fn snapshot(&self, id: ElementId) -> Option<ElementSnapshot> {
        let node = self.nodes.get(&id)?;
        let ancestors = self
            .ancestors(id)
            .filter(|a| *a != self.root)
            .filter_map(|a| self.nodes.get(&a))
            .map(|a| AncestorSnapshot {
                class_name: a.attributes.get("class").cloned(),
                test_id: a.attributes.get("data-testid").cloned(),
            })
            .collect();

        Some(ElementSnapshot {
            tag: node.tag.clone(),
            id: node.attributes.get("id").cloned(),
            class_name: node.attributes.get("class").cloned(),
            test_id: node.attributes.get("data-testid").cloned(),
            placeholder: node.attributes.get("placeholder").cloned(),
            rows: node
                .attributes
                .get("rows")
                .and_then(|r| r.trim().parse().ok()),
            offset_height: node.rect.height,
            ancestors,
        })
    }

    fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.nodes.get(&id)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.attributes.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        self.nodes
            .get_mut(&id)
            .map(|node| node.attributes.remove(name).is_some())
            .unwrap_or(false)
    }

    fn bounding_rect(&self, id: ElementId) -> Option<Rect> {
        self.nodes.get(&id).map(|n| n.rect)
    }

    fn offset_parent(&self, id: ElementId) -> Option<ElementId> {
        if id == self.body || id == self.root || !self.contains(id) {
            return None;
        }
        self.ancestors(id)
            .find(|a| {
                *a == self.body
                    || self
                        .nodes
                        .get(a)
                        .map(|n| n.position.is_positioned())
                        .unwrap_or(false)
            })
            .or(Some(self.body))
    }

    fn position(&self, id: ElementId) -> Option<CssPosition> {
        self.nodes.get(&id).map(|n| n.position)
    }

    fn set_position(&mut self, id: ElementId, position: CssPosition) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    fn create_control(&mut self, parent: ElementId, kind: ControlKind) -> Option<ElementId> {
        let mut attributes = BTreeMap::new();
        attributes.insert("class".to_string(), kind.class_name().to_string());
        self.allocate(
            parent,
            Node {
                tag: kind.tag_name().to_string(),
                attributes,
                position: CssPosition::Absolute,
                control: Some(kind),
                ..Default::default()
            },
        )
    }

    fn place(&mut self, id: ElementId, placement: Placement) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.placement = Some(placement);
                true
            }
            None => false,
        }
    }

    fn set_disabled(&mut self, id: ElementId, disabled: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.disabled = disabled;
                true
            }
            None => false,
        }
    }

    fn set_text(&mut self, id: ElementId, text: &str) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.text = text.to_string();
                true
            }
            None => false,
        }
    }

    fn value(&self, id: ElementId) -> Option<String> {
        self.nodes.get(&id).map(|n| n.value.clone())
    }

    fn set_value(&mut self, id: ElementId, value: &str) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.value = value.to_string();
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, id: ElementId, event: DomEvent) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.dispatched.push((id, event));
        true
    }

    fn remove(&mut self, id: ElementId) -> bool {
        if id == self.root || id == self.body || !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id).and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        let mut subtree = Vec::new();
        self.walk(id, &mut subtree);
        for node in &subtree {
            self.nodes.remove(node);
        }
        self.listeners.retain(|_, (target, _)| match target {
            ListenTarget::Element(el) => !subtree.contains(el),
            _ => true,
        });
        true
    }

    fn is_within(&self, node: ElementId, ancestor: ElementId) -> bool {
        (node == ancestor && self.contains(node)) || self.ancestors(node).any(|a| a == ancestor)
    }

    fn listen(&mut self, target: ListenTarget, kind: ListenKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (target, kind));
        id
    }

    fn unlisten(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(&listener).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_collects_ancestors_nearest_first() {
        let mut doc = MemoryDocument::new();
        let outer = doc
            .append(doc.body(), ElementSpec::div().attr("data-testid", "composer-textbox"))
            .unwrap();
        let inner = doc.append(outer, ElementSpec::div().class("wrap")).unwrap();
        let area = doc
            .append(
                inner,
                ElementSpec::textarea()
                    .id("q")
                    .rows(4)
                    .rect(Rect::new(0.0, 0.0, 100.0, 60.0)),
            )
            .unwrap();

        let snapshot = doc.snapshot(area).unwrap();
        assert_eq!(snapshot.tag, "textarea");
        assert_eq!(snapshot.id.as_deref(), Some("q"));
        assert_eq!(snapshot.rows, Some(4));
        assert_eq!(snapshot.offset_height, 60.0);
        assert_eq!(snapshot.ancestors[0].class_name.as_deref(), Some("wrap"));
        assert_eq!(
            snapshot.ancestors[1].test_id.as_deref(),
            Some("composer-textbox")
        );
        // wrap, testid div, body
        assert_eq!(snapshot.ancestors.len(), 3);
    }

    #[test]
    fn test_offset_parent_falls_back_to_body() {
        let mut doc = MemoryDocument::new();
        let plain = doc.append(doc.body(), ElementSpec::div()).unwrap();
        let area = doc.append(plain, ElementSpec::textarea()).unwrap();
        assert_eq!(doc.offset_parent(area), Some(doc.body()));

        let positioned = doc
            .append(plain, ElementSpec::div().position(CssPosition::Relative))
            .unwrap();
        let nested = doc.append(positioned, ElementSpec::textarea()).unwrap();
        assert_eq!(doc.offset_parent(nested), Some(positioned));
        assert_eq!(doc.overlay_container(nested), positioned);
    }

    #[test]
    fn test_remove_drops_subtree_and_listeners() {
        let mut doc = MemoryDocument::new();
        let wrap = doc.append(doc.body(), ElementSpec::div()).unwrap();
        let area = doc.append(wrap, ElementSpec::textarea()).unwrap();
        let button = doc.create_control(wrap, ControlKind::Trigger).unwrap();
        doc.listen(ListenTarget::Element(button), ListenKind::Click);
        doc.listen(ListenTarget::Window, ListenKind::Resize);

        assert!(doc.holds_candidate(wrap));
        assert!(doc.remove(wrap));
        assert!(!doc.contains(area));
        assert!(!doc.contains(button));
        assert_eq!(doc.listener_count(), 1);
        assert!(!doc.remove(wrap));
        assert!(!doc.remove(doc.body()));
    }

    #[test]
    fn test_candidates_in_document_order() {
        let mut doc = MemoryDocument::new();
        let a = doc.append(doc.body(), ElementSpec::textarea()).unwrap();
        let wrap = doc.append(doc.body(), ElementSpec::div()).unwrap();
        let b = doc.append(wrap, ElementSpec::textarea()).unwrap();
        doc.append(wrap, ElementSpec::new("input")).unwrap();

        assert_eq!(doc.candidates_within(doc.body()), vec![a, b]);
        assert_eq!(doc.candidates_within(b), vec![b]);
        assert!(doc.is_within(b, wrap));
        assert!(doc.is_within(b, b));
        assert!(!doc.is_within(a, wrap));
    }
}
