//! Minimal DOM facade the scanner works against.
//!
//! `Dom` is the read side: tree navigation, attributes, text and layout. `DomMut`
//! adds the handful of mutations a fill needs. Everything else the scanner uses
//! (`inner_text`, `closest`, `element_by_id`, ...) is derived here from those
//! primitives, so label inference stays a pure function over any implementor.

use std::fmt::Debug;

/// Synthetic notifications replayed after a value write so reactive host
/// frameworks observe the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEvent {
    Input,
    Change,
    Blur,
}

/// Read-only view of a page.
pub trait Dom {
    type Node: Copy + Eq + Debug;

    fn root(&self) -> Self::Node;
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
    /// All child nodes, elements and text alike, in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    /// Lowercase tag name for elements, `None` for text nodes.
    fn tag_name(&self, node: Self::Node) -> Option<String>;
    /// Raw text for text nodes, `None` for elements.
    fn text(&self, node: Self::Node) -> Option<String>;
    fn attr(&self, node: Self::Node, name: &str) -> Option<String>;
    /// Current value of a form control. Empty for anything else.
    fn value(&self, node: Self::Node) -> String;
    /// True when the element produces a non-empty layout box.
    fn is_rendered(&self, node: Self::Node) -> bool;
}

/// Mutations needed to tag and fill controls.
pub trait DomMut: Dom {
    fn set_attr(&mut self, node: Self::Node, name: &str, value: &str);
    fn set_value(&mut self, node: Self::Node, value: &str);
    fn focus(&mut self, node: Self::Node);
    fn dispatch(&mut self, node: Self::Node, event: FieldEvent, bubbles: bool);
}

pub fn is_element<D: Dom>(dom: &D, node: D::Node) -> bool {
    dom.tag_name(node).is_some()
}

pub fn has_tag<D: Dom>(dom: &D, node: D::Node, tags: &[&str]) -> bool {
    dom.tag_name(node)
        .map(|t| tags.contains(&t.as_str()))
        .unwrap_or(false)
}

pub fn has_role<D: Dom>(dom: &D, node: D::Node, role: &str) -> bool {
    dom.attr(node, "role")
        .map(|r| r.trim().eq_ignore_ascii_case(role))
        .unwrap_or(false)
}

pub fn is_form_control<D: Dom>(dom: &D, node: D::Node) -> bool {
    has_tag(dom, node, &["input", "textarea", "select"])
}

/// Element descendants of `node` (excluding `node`) in document order.
pub fn descendants<D: Dom>(dom: &D, node: D::Node) -> Vec<D::Node> {
    let mut out = Vec::new();
    let mut stack: Vec<D::Node> = dom.children(node).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if !is_element(dom, current) {
            continue;
        }
        out.push(current);
        stack.extend(dom.children(current).into_iter().rev());
    }
    out
}

/// Every element in the document, in document order.
pub fn all_elements<D: Dom>(dom: &D) -> Vec<D::Node> {
    let root = dom.root();
    let mut out = Vec::new();
    if is_element(dom, root) {
        out.push(root);
    }
    out.extend(descendants(dom, root));
    out
}

/// First element descendant of `node` satisfying `pred`.
pub fn find_descendant<D: Dom>(
    dom: &D,
    node: D::Node,
    pred: impl Fn(D::Node) -> bool,
) -> Option<D::Node> {
    descendants(dom, node).into_iter().find(|n| pred(*n))
}

/// Nearest inclusive ancestor satisfying `pred`, like `Element.closest`.
pub fn closest<D: Dom>(
    dom: &D,
    node: D::Node,
    pred: impl Fn(D::Node) -> bool,
) -> Option<D::Node> {
    let mut current = Some(node);
    while let Some(n) = current {
        if is_element(dom, n) && pred(n) {
            return Some(n);
        }
        current = dom.parent(n);
    }
    None
}

pub fn previous_element_sibling<D: Dom>(dom: &D, node: D::Node) -> Option<D::Node> {
    let parent = dom.parent(node)?;
    let siblings = dom.children(parent);
    let index = siblings.iter().position(|n| *n == node)?;
    siblings[..index]
        .iter()
        .rev()
        .copied()
        .find(|n| is_element(dom, *n))
}

pub fn element_by_id<D: Dom>(dom: &D, id: &str) -> Option<D::Node> {
    all_elements(dom)
        .into_iter()
        .find(|n| dom.attr(*n, "id").as_deref() == Some(id))
}

/// Rendered text of `node`: non-empty text-node fragments joined by spaces.
pub fn inner_text<D: Dom>(dom: &D, node: D::Node) -> String {
    collect_text(dom, node, &|_| false)
}

/// Text of `node` with every nested input/textarea/select subtree removed, so a
/// wrapping container never echoes the control's own value back as its label.
pub fn text_without_controls<D: Dom>(dom: &D, node: D::Node) -> String {
    collect_text(dom, node, &|n| is_form_control(dom, n))
}

fn collect_text<D: Dom>(dom: &D, node: D::Node, skip: &dyn Fn(D::Node) -> bool) -> String {
    let mut parts = Vec::new();
    push_text(dom, node, skip, &mut parts);
    parts.join(" ")
}

fn push_text<D: Dom>(
    dom: &D,
    node: D::Node,
    skip: &dyn Fn(D::Node) -> bool,
    parts: &mut Vec<String>,
) {
    if let Some(text) = dom.text(node) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
        return;
    }
    if skip(node) {
        return;
    }
    for child in dom.children(node) {
        push_text(dom, child, skip, parts);
    }
}
