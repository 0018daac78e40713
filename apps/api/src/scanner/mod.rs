//! Page Scanner — discovers fillable controls, labels them, and applies fills.
//!
//! Runs against any `Dom` implementor. Knows nothing about the user profile.

pub mod document;
pub mod dom;
pub mod label;
pub mod retry;

use tracing::{debug, warn};

use crate::models::{DetectedField, FieldType};
use crate::scanner::dom::{
    all_elements, find_descendant, has_role, has_tag, inner_text,
    is_form_control, Dom, DomMut, FieldEvent,
};
use crate::scanner::label::{clean_label, infer_label};

/// Attribute used to tag discovered controls with a stable id.
pub const AUTOFILL_ID_ATTR: &str = "data-autofill-id";

/// Input types that never carry user data.
/// Id namespace of the list-item pass.
const LIST_ITEM_ID_PREFIX: &str = "gf_";

const NON_DATA_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "image", "reset"];

/// How a control stores and reports its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    TextLike,
    TextArea,
    Select,
}

impl FieldKind {
    pub fn of<D: Dom>(dom: &D, node: D::Node) -> Option<Self> {
        match dom.tag_name(node)?.as_str() {
            "input" => Some(FieldKind::TextLike),
            "textarea" => Some(FieldKind::TextArea),
            "select" => Some(FieldKind::Select),
            _ => None,
        }
    }
}

/// A discovered control paired with its page, exposing read/write/notify.
pub struct Control<'a, D: Dom> {
    dom: &'a mut D,
    node: D::Node,
    kind: FieldKind,
}

impl<'a, D: DomMut> Control<'a, D> {
    pub fn new(dom: &'a mut D, node: D::Node) -> Option<Self> {
        let kind = FieldKind::of(dom, node)?;
        Some(Self { dom, node, kind })
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn read(&self) -> String {
        self.dom.value(self.node)
    }

    pub fn write(&mut self, value: &str) {
        self.dom.focus(self.node);
        self.dom.set_value(self.node, value);
    }

    /// Replays the input lifecycle so framework-managed state picks up the write.
    pub fn notify(&mut self) {
        for event in [FieldEvent::Input, FieldEvent::Change, FieldEvent::Blur] {
            self.dom.dispatch(self.node, event, true);
        }
    }
}

/// Stateful scanner for one page load. The counter keeps generated ids unique
/// across repeated scans of the same page.
#[derive(Debug, Default)]
pub struct Scanner {
    next_id: u64,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers every fillable control on the page, in document order.
    pub fn scan<D: DomMut>(&mut self, dom: &mut D) -> Vec<DetectedField> {
        let mut fields = self.scan_native(dom);

        if fields.is_empty() || has_custom_widgets(dom) {
            let extra: Vec<DetectedField> = scan_list_items(dom)
                .into_iter()
                .filter(|f| fields.iter().all(|native| native.id != f.id))
                .collect();
            debug!("Secondary ARIA scan found {} fields", extra.len());
            fields.extend(extra);
        }

        debug!("Scan found {} fields", fields.len());
        fields
    }

    fn scan_native<D: DomMut>(&mut self, dom: &mut D) -> Vec<DetectedField> {
        let controls: Vec<D::Node> = all_elements(dom)
            .into_iter()
            .filter(|n| is_form_control(dom, *n))
            .collect();

        let mut fields = Vec::new();
        for control in controls {
            if !is_candidate(dom, control) {
                continue;
            }
            let Some(name) = infer_label(dom, control) else {
                continue;
            };
            let id = self.tag(dom, control);
            let tag = dom.tag_name(control).unwrap_or_default();
            let input_type = dom.attr(control, "type");
            fields.push(DetectedField::new(
                id,
                name,
                FieldType::from_control(&tag, input_type.as_deref()),
                dom.value(control),
            ));
        }
        fields
    }

    /// Returns the control's existing autofill id, or assigns a fresh one.
    fn tag<D: DomMut>(&mut self, dom: &mut D, control: D::Node) -> String {
        if let Some(existing) = dom.attr(control, AUTOFILL_ID_ATTR).filter(|v| !v.is_empty()) {
            return existing;
        }
        let id = format!("autofill_{}", self.next_id);
        self.next_id += 1;
        dom.set_attr(control, AUTOFILL_ID_ATTR, &id);
        id
    }

    /// Writes `value` into the control tagged `id` and replays input, change and
    /// blur. Returns false when no such control exists.
    pub fn fill<D: DomMut>(&self, dom: &mut D, id: &str, value: &str) -> bool {
        let Some(node) = find_tagged(dom, id) else {
            warn!("Fill target {id} not found on page");
            return false;
        };
        let Some(mut control) = Control::new(dom, node) else {
            warn!("Fill target {id} is not a form control");
            return false;
        };
        debug!(
            "Filling {id} ({:?}), replacing {} chars",
            control.kind(),
            control.read().chars().count()
        );
        control.write(value);
        control.notify();
        true
    }
}

/// Non-data types and invisible controls are skipped; `aria-hidden` exempts an
/// invisible control from the visibility check.
fn is_candidate<D: Dom>(dom: &D, control: D::Node) -> bool {
    if has_tag(dom, control, &["input"]) {
        let input_type = dom
            .attr(control, "type")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if NON_DATA_INPUT_TYPES.contains(&input_type.as_str()) {
            return false;
        }
    }
    dom.is_rendered(control) || dom.attr(control, "aria-hidden").is_some()
}

/// List/combobox roles signal non-native widgets such as multi-step form builders.
fn has_custom_widgets<D: Dom>(dom: &D) -> bool {
    all_elements(dom)
        .into_iter()
        .any(|n| has_role(dom, n, "listitem") || has_role(dom, n, "combobox"))
}

/// Pairs each `listitem` role's first data input with its `heading` role title.
/// Uses a separate `gf_` id namespace and skips controls the native pass tagged.
/// Inputs tagged by an earlier list-item pass keep their id.
fn scan_list_items<D: DomMut>(dom: &mut D) -> Vec<DetectedField> {
    let items: Vec<D::Node> = all_elements(dom)
        .into_iter()
        .filter(|n| has_role(dom, *n, "listitem"))
        .collect();

    let mut fields = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let input = find_descendant(dom, item, |n| {
            has_tag(dom, n, &["textarea"])
                || (has_tag(dom, n, &["input"])
                    && !dom
                        .attr(n, "type")
                        .map(|t| t.eq_ignore_ascii_case("hidden"))
                        .unwrap_or(false))
        });
        let Some(input) = input else {
            continue;
        };
        let existing = dom.attr(input, AUTOFILL_ID_ATTR);
        if existing
            .as_deref()
            .is_some_and(|id| !id.starts_with(LIST_ITEM_ID_PREFIX))
        {
            continue;
        }
        let Some(heading) = find_descendant(dom, item, |n| has_role(dom, n, "heading")) else {
            continue;
        };
        let title = clean_label(&inner_text(dom, heading));
        if title.is_empty() {
            continue;
        }

        let id = match existing {
            Some(id) => id,
            None => {
                let id = format!("{LIST_ITEM_ID_PREFIX}{index}");
                dom.set_attr(input, AUTOFILL_ID_ATTR, &id);
                id
            }
        };
        let field_type = if has_tag(dom, input, &["textarea"]) {
            FieldType::Textarea
        } else {
            FieldType::Text
        };
        fields.push(DetectedField::new(id, title, field_type, dom.value(input)));
    }
    fields
}

fn find_tagged<D: Dom>(dom: &D, id: &str) -> Option<D::Node> {
    all_elements(dom)
        .into_iter()
        .find(|n| dom.attr(*n, AUTOFILL_ID_ATTR).as_deref() == Some(id))
}
