//! # DOM: Arena Document Model
//!
//! A small, owned document tree that the controllers operate on. Nodes live in
//! an arena and are addressed by [`NodeId`]; ids are never reused, so a `NodeId`
//! is a stable element identity for the lifetime of the page (detached nodes
//! keep their id, they simply stop resolving through [`Document::by_id`]).
//!
//! Markup is parsed with `html5ever` into an `RcDom` and immediately copied into
//! the arena, so the document itself is `Send` and free of reference counting.

use crate::error::DomError;
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    Attribute, LocalName, ParseOpts, QualName, local_name, namespace_url, ns, parse_document,
    parse_fragment,
};
use markup5ever_rcdom::{Handle, Node as RcNode, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::collections::HashMap;

/// Stable identity of a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where to insert a node relative to an anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

const FORM_CONTROLS: &[&str] = &["input", "select", "textarea"];

/// An element: tag, ordered attributes and the live form-control state.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    checked: bool,
    hidden: bool,
}

impl Element {
    fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let mut element = Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            value: String::new(),
            checked: false,
            hidden: false,
        };
        element.value = element.attr("value").unwrap_or_default().to_string();
        element.checked = element.attr("checked").is_some();
        element.hidden = element.attr("hidden").is_some()
            || element.attr("style").is_some_and(style_hides);
        element
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Adds a class; a class already present is left alone.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    pub fn remove_class(&mut self, class: &str) {
        let Some(existing) = self.attr("class") else {
            return;
        };
        let remaining: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        let remaining = remaining.join(" ");
        self.set_attr("class", remaining);
    }

    /// Lowercased `type` attribute of an `input`, `"text"` when absent.
    pub fn input_type(&self) -> String {
        self.attr("type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".to_string())
    }

    pub fn is_form_control(&self) -> bool {
        FORM_CONTROLS.contains(&self.tag.as_str())
    }

    pub fn is_submit(&self) -> bool {
        self.tag == "input" && self.input_type() == "submit"
    }

    pub fn is_disabled(&self) -> bool {
        self.attr("disabled").is_some()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    fn set_visible(&mut self, visible: bool) {
        self.hidden = !visible;
        let mut declarations: Vec<String> = self
            .attr("style")
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|decl| !decl.is_empty() && !is_display_declaration(decl))
            .map(str::to_string)
            .collect();
        self.remove_attr("hidden");
        if !visible {
            declarations.push("display: none".to_string());
        }
        if declarations.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", format!("{};", declarations.join("; ")));
        }
    }
}

fn is_display_declaration(decl: &str) -> bool {
    decl.split(':')
        .next()
        .is_some_and(|prop| prop.trim().eq_ignore_ascii_case("display"))
}

fn style_hides(style: &str) -> bool {
    style.split(';').any(|decl| {
        let mut parts = decl.splitn(2, ':');
        let prop = parts.next().unwrap_or_default().trim();
        let value = parts.next().unwrap_or_default().trim();
        prop.eq_ignore_ascii_case("display") && value.eq_ignore_ascii_case("none")
    })
}

/// The page document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document (no `html`, `head` or `body`).
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    /// Parses a complete HTML document.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        let mut document = Self::new();
        let root = document.root;
        for child in dom.document.children.borrow().iter() {
            if let Some(node) = document.import(child) {
                document.attach(root, node, None);
            }
        }
        document.initialize_controls(root);
        document.rebuild_id_index();
        document
    }

    /// Parses an HTML fragment into detached top-level nodes.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
            .one(html);

        // The fragment parser wraps its output in a synthetic <html> element.
        let wrapper = dom.document.children.borrow().first().cloned();
        let Some(wrapper) = wrapper else {
            return Vec::new();
        };
        let mut roots = Vec::new();
        for child in wrapper.children.borrow().iter() {
            if let Some(node) = self.import(child) {
                self.initialize_controls(node);
                roots.push(node);
            }
        }
        roots
    }

    fn import(&mut self, handle: &Handle) -> Option<NodeId> {
        let node = match &handle.data {
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect();
                self.push(NodeKind::Element(Element::new(&name.local, attrs)))
            }
            NodeData::Text { contents } => self.push(NodeKind::Text(contents.borrow().to_string())),
            _ => return None,
        };
        for child in handle.children.borrow().iter() {
            if let Some(child) = self.import(child) {
                self.attach(node, child, None);
            }
        }
        Some(node)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Textareas take their value from their text, selects from the selected option.
    fn initialize_controls(&mut self, root: NodeId) {
        let mut nodes = vec![root];
        nodes.extend(self.descendants(root));
        for node in nodes {
            let value = match self.element(node).map(Element::tag) {
                Some("textarea") => self.text_content(node),
                Some("select") => self.selected_option_value(node).unwrap_or_default(),
                _ => continue,
            };
            if let Some(element) = self.element_mut(node) {
                element.value = value;
            }
        }
    }

    fn selected_option_value(&self, select: NodeId) -> Option<String> {
        let options: Vec<NodeId> = self
            .descendants(select)
            .into_iter()
            .filter(|n| self.element(*n).is_some_and(|e| e.tag() == "option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|n| self.element(*n).is_some_and(|e| e.attr("selected").is_some()))
            .or_else(|| options.first().copied())?;
        let option = self.element(chosen)?;
        Some(match option.attr("value") {
            Some(value) => value.to_string(),
            None => self.text_content(chosen).trim().to_string(),
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn require_element(&self, node: NodeId) -> Result<&Element, DomError> {
        self.element(node).ok_or(DomError::NotAnElement(node))
    }

    fn require_element_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        self.element_mut(node).ok_or(DomError::NotAnElement(node))
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Ancestors from the parent upward, root last.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent(current);
        }
        out
    }

    /// Descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// True when the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root || self.is_descendant_of(node, self.root)
    }

    /// Nearest ancestor element with the given tag.
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(node)
            .into_iter()
            .find(|n| self.tag(*n) == Some(tag))
    }

    pub fn form_of(&self, node: NodeId) -> Option<NodeId> {
        self.closest(node, "form")
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.element(node).and_then(Element::id)
    }

    fn rebuild_id_index(&mut self) {
        let mut index = HashMap::new();
        for node in self.descendants(self.root) {
            if let Some(id) = self.id_of(node) {
                index.entry(id.to_string()).or_insert(node);
            }
        }
        self.id_index = index;
    }

    /// Connected elements under `scope` whose tag is one of `tags`.
    pub fn select_tags(&self, scope: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.tag(*n).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    pub fn select_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.element(*n).is_some_and(|e| e.has_class(class)))
            .collect()
    }

    pub fn first_of_tag(&self, tag: &str) -> Option<NodeId> {
        self.select_tags(self.root, &[tag]).into_iter().next()
    }

    /// The `head` element, created under the first `html` element (or root) if absent.
    pub fn head(&mut self) -> NodeId {
        if let Some(head) = self.first_of_tag("head") {
            return head;
        }
        let parent = self.first_of_tag("html").unwrap_or(self.root);
        let head = self.create_element("head", Vec::new());
        let first = self.children(parent).first().copied();
        self.attach(parent, head, first);
        head
    }

    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag, attrs)))
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        self.nodes[child.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        match before.and_then(|b| siblings.iter().position(|s| *s == b)) {
            Some(index) => siblings.insert(index, child),
            None => siblings.push(child),
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if parent != self.root {
            self.require_element(parent)?;
        }
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(DomError::HierarchyRequest(child));
        }
        self.detach(child);
        self.attach(parent, child, None);
        self.rebuild_id_index();
        Ok(())
    }

    /// Inserts `node` as a sibling immediately before or after `anchor`.
    pub fn insert_adjacent(
        &mut self,
        anchor: NodeId,
        position: Position,
        node: NodeId,
    ) -> Result<(), DomError> {
        let parent = self.parent(anchor).ok_or(DomError::Detached(anchor))?;
        if node == anchor || self.is_descendant_of(anchor, node) {
            return Err(DomError::HierarchyRequest(node));
        }
        self.detach(node);
        let before = match position {
            Position::Before => Some(anchor),
            Position::After => {
                let siblings = self.children(parent);
                siblings
                    .iter()
                    .position(|s| *s == anchor)
                    .and_then(|i| siblings.get(i + 1).copied())
            }
        };
        self.attach(parent, node, before);
        self.rebuild_id_index();
        Ok(())
    }

    /// Detaches a node (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
        self.rebuild_id_index();
    }

    /// Replaces the children of `node` with the parsed `html`. Returns the
    /// detached former children.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        self.require_element(node)?;
        let old = std::mem::take(&mut self.nodes[node.0].children);
        for child in &old {
            self.nodes[child.0].parent = None;
        }
        for fresh in self.parse_fragment(html) {
            self.attach(node, fresh, None);
        }
        self.rebuild_id_index();
        Ok(old)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            _ => self
                .children(node)
                .iter()
                .map(|c| self.text_content(*c))
                .collect(),
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let scope = match &self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(html_name(&element.tag)),
            _ => None,
        };
        self.serialize(node, TraversalScope::ChildrenOnly(scope))
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        match self.nodes[node.0].kind {
            NodeKind::Document => self.serialize(node, TraversalScope::ChildrenOnly(None)),
            _ => self.serialize(node, TraversalScope::IncludeNode),
        }
    }

    /// Serializes through html5ever, so raw-text elements keep their contents verbatim.
    fn serialize(&self, node: NodeId, traversal_scope: TraversalScope) -> String {
        let handle = SerializableHandle::from(self.export(node));
        let opts = SerializeOpts {
            traversal_scope,
            ..SerializeOpts::default()
        };
        let mut bytes = Vec::new();
        if let Err(err) = serialize(&mut bytes, &handle, opts) {
            tracing::warn!(%err, "html serialization failed");
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Copies the subtree back into an `RcDom` handle.
    fn export(&self, node: NodeId) -> Handle {
        let data = match &self.nodes[node.0].kind {
            NodeKind::Document => NodeData::Document,
            NodeKind::Text(text) => NodeData::Text {
                contents: RefCell::new(StrTendril::from_slice(text)),
            },
            NodeKind::Element(element) => NodeData::Element {
                name: html_name(&element.tag),
                attrs: RefCell::new(
                    element
                        .attrs()
                        .map(|(key, value)| Attribute {
                            name: QualName::new(None, ns!(), LocalName::from(key)),
                            value: StrTendril::from_slice(value),
                        })
                        .collect(),
                ),
                template_contents: RefCell::new(None),
                mathml_annotation_xml_integration_point: false,
            },
        };
        let handle = RcNode::new(data);
        for child in self.children(node) {
            handle.children.borrow_mut().push(self.export(*child));
        }
        handle
    }

    pub fn value(&self, node: NodeId) -> Result<&str, DomError> {
        Ok(self.require_element(node)?.value())
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let element = self.require_element_mut(node)?;
        element.value = value.to_string();
        if element.tag() == "input" {
            element.set_attr("value", value);
        }
        Ok(())
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), DomError> {
        self.require_element_mut(node)?.checked = checked;
        Ok(())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.require_element_mut(node)?.set_attr(name, value);
        if name.eq_ignore_ascii_case("id") {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.require_element_mut(node)?.add_class(class);
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.require_element_mut(node)?.remove_class(class);
        Ok(())
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(Element::is_visible)
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), DomError> {
        self.require_element_mut(node)?.set_visible(visible);
        Ok(())
    }

    /// True if the node and every ancestor up to (and including) its form are
    /// visible. Reaching the document root without a hidden ancestor also counts
    /// as visible; a detached node never is.
    pub fn is_deep_visible(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            match self.element(current) {
                Some(element) if !element.is_visible() => return false,
                Some(element) if element.tag() == "form" => return true,
                _ => {}
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Form controls (`input`, `select`, `textarea`) inside `form`, in document order.
    pub fn form_controls(&self, form: NodeId) -> Vec<NodeId> {
        self.select_tags(form, FORM_CONTROLS)
    }

    /// Name/value pairs a form would submit, leaving out submit buttons.
    pub fn serialize_form(&self, form: NodeId) -> Vec<(String, String)> {
        self.form_controls(form)
            .into_iter()
            .filter_map(|node| {
                let element = self.element(node)?;
                let name = element.attr("name").filter(|n| !n.is_empty())?;
                if element.is_disabled() {
                    return None;
                }
                if element.tag() == "input" {
                    match element.input_type().as_str() {
                        "submit" | "button" | "reset" | "image" | "file" => return None,
                        "checkbox" | "radio" if !element.is_checked() => return None,
                        "checkbox" | "radio" if element.attr("value").is_none() => {
                            return Some((name.to_string(), "on".to_string()));
                        }
                        _ => {}
                    }
                }
                Some((name.to_string(), element.value().to_string()))
            })
            .collect()
    }
}

fn html_name(tag: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head><script src="/assets/core.js"></script></head><body>
        <form id="f"><div id="wrap" style="display: none"><input id="a" name="a" value="1"></div>
        <input id="b" name="b" value="2"><input type="submit" id="go" name="go" value="Go">
        <input type="checkbox" id="c" name="c"></form>
        <div id="outside"><span id="s">x</span></div></body></html>"#;

    #[test]
    fn test_parse_indexes_ids_and_values() {
        let doc = Document::parse(PAGE);
        let b = doc.by_id("b").unwrap();
        assert_eq!(doc.value(b).unwrap(), "2");
        assert_eq!(doc.tag(doc.by_id("f").unwrap()), Some("form"));
        assert!(doc.by_id("missing").is_none());
    }

    #[test]
    fn test_deep_visibility_stops_at_form() {
        let doc = Document::parse(PAGE);
        assert!(!doc.is_deep_visible(doc.by_id("a").unwrap()));
        assert!(doc.is_deep_visible(doc.by_id("b").unwrap()));
        assert!(doc.is_deep_visible(doc.by_id("s").unwrap()));
    }

    #[test]
    fn test_set_inner_html_detaches_old_children() {
        let mut doc = Document::parse(PAGE);
        let outside = doc.by_id("outside").unwrap();
        let span = doc.by_id("s").unwrap();
        let removed = doc.set_inner_html(outside, "<p id=\"p\">A</p>").unwrap();
        assert_eq!(removed, vec![span]);
        assert!(doc.by_id("s").is_none());
        assert!(!doc.is_connected(span));
        assert_eq!(doc.inner_html(outside), "<p id=\"p\">A</p>");
    }

    #[test]
    fn test_insert_adjacent_after_and_before() {
        let mut doc = Document::parse(PAGE);
        let span = doc.by_id("s").unwrap();
        let after = doc.create_element("em", vec![("id".into(), "after".into())]);
        let before = doc.create_element("em", vec![("id".into(), "before".into())]);
        doc.insert_adjacent(span, Position::After, after).unwrap();
        doc.insert_adjacent(span, Position::Before, before).unwrap();
        let outside = doc.by_id("outside").unwrap();
        assert_eq!(
            doc.inner_html(outside),
            "<em id=\"before\"></em><span id=\"s\">x</span><em id=\"after\"></em>"
        );
    }

    #[test]
    fn test_serialize_form_skips_submit_and_unchecked() {
        let mut doc = Document::parse(PAGE);
        let form = doc.by_id("f").unwrap();
        assert_eq!(
            doc.serialize_form(form),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
        doc.set_checked(doc.by_id("c").unwrap(), true).unwrap();
        assert_eq!(doc.serialize_form(form).last().unwrap().1, "on");
    }

    #[test]
    fn test_visibility_round_trips_through_style() {
        let mut doc = Document::parse(PAGE);
        let wrap = doc.by_id("wrap").unwrap();
        doc.set_visible(wrap, true).unwrap();
        assert!(doc.element(wrap).unwrap().attr("style").is_none());
        doc.set_visible(wrap, false).unwrap();
        assert_eq!(doc.element(wrap).unwrap().attr("style"), Some("display: none;"));
    }

    #[test]
    fn test_class_helpers_are_idempotent() {
        let mut doc = Document::parse(PAGE);
        let b = doc.by_id("b").unwrap();
        doc.add_class(b, "t-error").unwrap();
        doc.add_class(b, "t-error").unwrap();
        assert_eq!(doc.element(b).unwrap().attr("class"), Some("t-error"));
        doc.remove_class(b, "t-error").unwrap();
        assert!(!doc.element(b).unwrap().has_class("t-error"));
    }

    #[test]
    fn test_inline_script_survives_reparse() {
        let mut doc = Document::parse(PAGE);
        let outside = doc.by_id("outside").unwrap();
        let markup = "<script>if (a < b && c) {}</script><p title=\"a &amp; b\">x &lt; y</p>";
        doc.set_inner_html(outside, markup).unwrap();
        assert_eq!(doc.inner_html(outside), markup);

        let script = doc.select_tags(outside, &["script"])[0];
        assert_eq!(doc.text_content(script), "if (a < b && c) {}");
        assert_eq!(doc.inner_html(script), "if (a < b && c) {}");

        let copy = doc.inner_html(outside);
        doc.set_inner_html(outside, &copy).unwrap();
        assert_eq!(doc.inner_html(outside), markup);
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let doc = Document::parse(PAGE);
        let b = doc.by_id("b").unwrap();
        assert_eq!(doc.outer_html(b), "<input id=\"b\" name=\"b\" value=\"2\">");
        assert!(doc.outer_html(doc.root()).starts_with("<html><head><script src="));
    }
}
