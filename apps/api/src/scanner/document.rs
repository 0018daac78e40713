//! In-memory document implementing the DOM facade.
//!
//! Built from a JSON element snapshot so the scanner can run without a browser:
//!
//! ```json
//! {"tag": "form", "children": [
//!   {"tag": "label", "attrs": {"for": "email"}, "text": "E-Mail Address*"},
//!   {"tag": "input", "attrs": {"id": "email", "type": "email"}}
//! ]}
//! ```
//!
//! Dispatched events are recorded so callers can check what a listener on any
//! ancestor would have observed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scanner::dom::{Dom, DomMut, FieldEvent};

/// Serializable element tree used to build a `Document`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Leading text, placed before any children.
    pub text: Option<String>,
    pub children: Vec<ElementSnapshot>,
    /// Whether the element has a layout box. Defaults to true.
    #[serde(default = "default_rendered")]
    pub rendered: bool,
    /// Initial value for form controls.
    pub value: Option<String>,
}

fn default_rendered() -> bool {
    true
}

impl ElementSnapshot {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            rendered: true,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.rendered = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        rendered: bool,
        value: String,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub event: FieldEvent,
    pub bubbles: bool,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    focused: Option<NodeId>,
    events: Vec<DispatchedEvent>,
}

/// A textarea's text content is its default value.
fn initial_value(snapshot: &ElementSnapshot) -> String {
    match &snapshot.value {
        Some(value) => value.clone(),
        None if snapshot.tag.eq_ignore_ascii_case("textarea") => {
            snapshot.text.clone().unwrap_or_default()
        }
        None => String::new(),
    }
}

impl Document {
    pub fn from_snapshot(snapshot: &ElementSnapshot) -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            focused: None,
            events: Vec::new(),
        };
        doc.insert(snapshot, None);
        doc
    }

    fn insert(&mut self, snapshot: &ElementSnapshot, parent: Option<NodeId>) -> NodeId {
        let id = self.push(
            NodeKind::Element {
                tag: snapshot.tag.to_ascii_lowercase(),
                attrs: snapshot.attrs.clone(),
                rendered: snapshot.rendered,
                value: initial_value(snapshot),
            },
            parent,
        );
        if let Some(text) = &snapshot.text {
            self.push(NodeKind::Text(text.clone()), Some(id));
        }
        for child in &snapshot.children {
            self.insert(child, Some(id));
        }
        id
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    /// Events a listener attached to `listener` would have observed: those
    /// targeted at it, plus bubbling events from its descendants.
    #[cfg(test)]
    pub fn events_observed_by(&self, listener: NodeId) -> Vec<FieldEvent> {
        self.events
            .iter()
            .filter(|e| e.target == listener || (e.bubbles && self.is_ancestor(listener, e.target)))
            .map(|e| e.event)
            .collect()
    }

    #[cfg(test)]
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes[node.0].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p.0].parent;
        }
        false
    }

    /// First element carrying `name="value"`.
    #[cfg(test)]
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|id| self.attr(*id, name).as_deref() == Some(value))
    }

    /// Current values of every tagged control, keyed by autofill id.
    pub fn tagged_values(&self, id_attr: &str) -> BTreeMap<String, String> {
        self.nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Element { attrs, value, .. } => attrs
                    .get(id_attr)
                    .map(|id| (id.clone(), value.clone())),
                NodeKind::Text(_) => None,
            })
            .collect()
    }
}

impl Dom for Document {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    fn value(&self, node: NodeId) -> String {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { value, .. }) => value.clone(),
            _ => String::new(),
        }
    }

    fn is_rendered(&self, node: NodeId) -> bool {
        // A hidden ancestor hides the whole subtree.
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(data) = self.nodes.get(id.0) else {
                return false;
            };
            if let NodeKind::Element { rendered: false, .. } = data.kind {
                return false;
            }
            current = data.parent;
        }
        true
    }
}

impl DomMut for Document {
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element { attrs, .. }) = self.nodes.get_mut(node.0).map(|n| &mut n.kind)
        {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn set_value(&mut self, node: NodeId, new_value: &str) {
        if let Some(NodeKind::Element { value, .. }) = self.nodes.get_mut(node.0).map(|n| &mut n.kind)
        {
            *value = new_value.to_string();
        }
    }

    fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    fn dispatch(&mut self, node: NodeId, event: FieldEvent, bubbles: bool) {
        self.events.push(DispatchedEvent {
            target: node,
            event,
            bubbles,
        });
    }
}
