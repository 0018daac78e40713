//! Derives a human-readable label for a control with no
//! markup contract from the host page.
//!
//! Ordered fallback chain, first usable text wins:
//! 1. `aria-labelledby` (referenced elements' text, concatenated)
//! 2. `<label for=...>`
//! 3. `aria-label`
//! 4. `placeholder`
//! 5. nearest semantic container, controls stripped (or the container's previous sibling)
//! 6. previous sibling element when it is a label/span/div

use crate::scanner::dom::{
    all_elements, closest, element_by_id, has_role, has_tag, inner_text,
    previous_element_sibling, text_without_controls, Dom,
};

/// Labels at or above this length are rejected.
pub const MAX_LABEL_LEN: usize = 200;
/// Container-derived text at or above this length usually means the wrong ancestor.
pub const MAX_CONTAINER_TEXT_LEN: usize = 100;
/// Container text shorter than this is treated as empty.
const MIN_CONTAINER_TEXT_LEN: usize = 2;

/// Strips required-field markers, collapses whitespace and trims.
///
/// Idempotent: `clean_label(clean_label(s)) == clean_label(s)`.
pub fn clean_label(raw: &str) -> String {
    raw.replace('*', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Infers and cleans the label for `control`. Returns `None` when nothing
/// usable was found or the result is implausibly long.
pub fn infer_label<D: Dom>(dom: &D, control: D::Node) -> Option<String> {
    let raw = raw_label(dom, control)?;
    let cleaned = clean_label(&raw);
    if cleaned.is_empty() || char_len(&cleaned) >= MAX_LABEL_LEN {
        return None;
    }
    Some(cleaned)
}

fn raw_label<D: Dom>(dom: &D, control: D::Node) -> Option<String> {
    from_labelledby(dom, control)
        .or_else(|| from_label_for(dom, control))
        .or_else(|| non_blank(dom.attr(control, "aria-label")))
        .or_else(|| non_blank(dom.attr(control, "placeholder")))
        .or_else(|| from_container(dom, control))
        .or_else(|| from_previous_sibling(dom, control))
}

fn from_labelledby<D: Dom>(dom: &D, control: D::Node) -> Option<String> {
    let ids = dom.attr(control, "aria-labelledby")?;
    let text = ids
        .split_whitespace()
        .filter_map(|id| element_by_id(dom, id))
        .map(|el| inner_text(dom, el))
        .collect::<Vec<_>>()
        .join(" ");
    non_blank(Some(text))
}

fn from_label_for<D: Dom>(dom: &D, control: D::Node) -> Option<String> {
    let id = dom.attr(control, "id").filter(|id| !id.is_empty())?;
    let label = all_elements(dom).into_iter().find(|n| {
        has_tag(dom, *n, &["label"]) && dom.attr(*n, "for").as_deref() == Some(id.as_str())
    })?;
    non_blank(Some(inner_text(dom, label)))
}

/// Label-ish wrapper: a `<label>`, a form/input group, a field or container
/// div, or a presentation/group role.
fn is_semantic_container<D: Dom>(dom: &D, node: D::Node) -> bool {
    if has_tag(dom, node, &["label"])
        || has_role(dom, node, "presentation")
        || has_role(dom, node, "group")
    {
        return true;
    }
    let class = dom.attr(node, "class").unwrap_or_default().to_ascii_lowercase();
    if class
        .split_whitespace()
        .any(|c| c == "form-group" || c == "input-group")
    {
        return true;
    }
    has_tag(dom, node, &["div"]) && (class.contains("field") || class.contains("container"))
}

fn from_container<D: Dom>(dom: &D, control: D::Node) -> Option<String> {
    let parent = dom.parent(control)?;
    let container = closest(dom, parent, |n| is_semantic_container(dom, n))?;
    let own_text = text_without_controls(dom, container);
    let own_text = own_text.trim();

    if char_len(own_text) < MIN_CONTAINER_TEXT_LEN {
        // Some layouts put the label in the container's previous sibling.
        let sibling = previous_element_sibling(dom, container)?;
        let sibling_text = inner_text(dom, sibling);
        return bounded(sibling_text.trim(), MAX_CONTAINER_TEXT_LEN);
    }

    bounded(own_text, MAX_CONTAINER_TEXT_LEN)
}

fn from_previous_sibling<D: Dom>(dom: &D, control: D::Node) -> Option<String> {
    let sibling = previous_element_sibling(dom, control)?;
    if !has_tag(dom, sibling, &["label", "span", "div"]) {
        return None;
    }
    non_blank(Some(inner_text(dom, sibling)))
}

fn bounded(text: &str, max: usize) -> Option<String> {
    if text.is_empty() || char_len(text) >= max {
        None
    } else {
        Some(text.to_string())
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
