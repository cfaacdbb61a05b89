//! # LLApp Page
//!
//! Page interaction helpers for the LLApp web application, running on a
//! small DOM built with html5ever.
//!
//! ## Helpers
//!
//! 1. **Dropdowns**: trigger clicks toggle their menu, outside clicks close all menus
//! 2. **Item navigation**: clicking a list item navigates to its target URL
//! 3. **Practice toggle**: a checkbox switches the practice form between two actions
//! 4. **Auto-focus**: the first empty text field receives focus
//!
//! Dropdown and navigation wiring run once when a [`Page`] is loaded; the
//! other two are called on demand.

pub mod bindings;
pub mod events;
pub mod forms;
pub mod helpers;
pub mod navigation;
pub mod page;
pub mod selector;
pub mod style;

pub use bindings::{DropdownBinding, NavItemBinding, PageBindings, PracticeToggle};
pub use events::{
    DomEvent, Event, EventDispatcher, EventListenerCallback, EventPhase, EventTarget,
    FocusEventData, ListenerOptions, MouseEventData,
};
pub use forms::{CheckableState, ControlKind, FormControl, InputType};
pub use helpers::{
    auto_focus_first_input, initialize_dropdowns, initialize_item_navigation, update_practice_url,
};
pub use navigation::{Location, Navigator};
pub use page::Page;
pub use selector::Selector;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Node not found")]
    NodeNotFound,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Unique identifier for a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Type of DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    DocumentType { name: String },
    Element { tag_name: String },
    Text(String),
    Comment(String),
}

/// A DOM node.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Element attributes; empty for other node types.
    attributes: RefCell<HashMap<String, String>>,
    /// Live state for `<input>` and `<textarea>`.
    control: Option<FormControl>,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
    children: RefCell<Vec<Rc<Node>>>,
    pub event_target: EventTarget,
}

impl Node {
    /// Create a new node. Form control state is derived from the attributes.
    pub fn new(id: NodeId, node_type: NodeType, attributes: HashMap<String, String>) -> Rc<Self> {
        let control = match node_type {
            NodeType::Element { ref tag_name } if tag_name == "input" => Some(FormControl::input(
                attributes.get("type").map(String::as_str),
                attributes.get("value").map(String::as_str),
                attributes.contains_key("checked"),
            )),
            NodeType::Element { ref tag_name } if tag_name == "textarea" => {
                Some(FormControl::textarea())
            }
            _ => None,
        };

        Rc::new(Self {
            id,
            node_type,
            attributes: RefCell::new(attributes),
            control,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            event_target: EventTarget::new(),
        })
    }

    /// Get the tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { tag_name } => Some(tag_name.as_str()),
            _ => None,
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.borrow().contains_key(name)
    }

    /// Set an attribute. Ignored on non-element nodes.
    pub fn set_attribute(&self, name: &str, value: &str) {
        if self.is_element() {
            self.attributes
                .borrow_mut()
                .insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow_mut().remove(name)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.attributes
            .borrow()
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|cls| cls == class_name))
    }

    /// Read a property from the inline `style` attribute.
    pub fn style_property(&self, name: &str) -> Option<String> {
        style::get_property(&self.get_attribute("style").unwrap_or_default(), name)
    }

    /// Write a property into the inline `style` attribute.
    pub fn set_style_property(&self, name: &str, value: &str) {
        let current = self.get_attribute("style").unwrap_or_default();
        self.set_attribute("style", &style::set_property(&current, name, value));
    }

    /// Form control state, for `<input>` and `<textarea>` elements.
    pub fn control(&self) -> Option<&FormControl> {
        self.control.as_ref()
    }

    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        match &self.node_type {
            NodeType::Text(text) => result.push_str(text),
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(result);
                }
            }
        }
    }

    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children.borrow().clone()
    }

    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element { .. })
    }

    /// Append a child node.
    pub fn append_child(self: &Rc<Self>, child: Rc<Node>) {
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        self.children.borrow_mut().push(child);
    }

    /// Ancestors from the root down to the parent.
    pub fn ancestors(&self) -> Vec<Rc<Node>> {
        let mut chain = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            chain.push(node);
        }
        chain.reverse();
        chain
    }
}

/// A complete DOM document.
pub struct Document {
    root: Rc<Node>,
    nodes: HashMap<NodeId, Rc<Node>>,
    /// First element in document order for each `id` attribute.
    elements_by_id: HashMap<String, Rc<Node>>,
    next_id: Cell<usize>,
    focused: Cell<Option<NodeId>>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        let root = Node::new(NodeId::new(0), NodeType::Document, HashMap::new());
        let mut nodes = HashMap::new();
        nodes.insert(root.id, root.clone());

        Self {
            root,
            nodes,
            elements_by_id: HashMap::new(),
            next_id: Cell::new(1),
            focused: Cell::new(None),
        }
    }

    /// Parse HTML and create a document.
    pub fn parse_html(html: &str) -> Result<Self, DomError> {
        debug!(len = html.len(), "Parsing HTML");

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| DomError::Parse(e.to_string()))?;

        let mut doc = Document::new();
        let root = doc.root.clone();
        doc.convert_rcdom(&dom.document, &root);
        doc.finish_parsing();

        debug!(node_count = doc.nodes.len(), "HTML parsed");
        Ok(doc)
    }

    fn convert_rcdom(&mut self, handle: &Handle, parent: &Rc<Node>) {
        for child_handle in handle.children.borrow().iter() {
            let mut attributes = HashMap::new();
            let node_type = match &child_handle.data {
                NodeData::Document | NodeData::ProcessingInstruction { .. } => continue,
                NodeData::Doctype { name, .. } => NodeType::DocumentType {
                    name: name.to_string(),
                },
                NodeData::Element { name, attrs, .. } => {
                    for attr in attrs.borrow().iter() {
                        attributes.insert(attr.name.local.to_string(), attr.value.to_string());
                    }
                    NodeType::Element {
                        tag_name: name.local.to_string(),
                    }
                }
                NodeData::Text { contents } => NodeType::Text(contents.borrow().to_string()),
                NodeData::Comment { contents } => NodeType::Comment(contents.to_string()),
            };

            let id = NodeId::new(self.next_id.get());
            self.next_id.set(self.next_id.get() + 1);

            let node = Node::new(id, node_type, attributes);
            self.nodes.insert(id, node.clone());
            parent.append_child(node.clone());

            self.convert_rcdom(child_handle, &node);
        }
    }

    /// Index ids and seed textarea values once the tree is complete.
    fn finish_parsing(&mut self) {
        let mut elements = Vec::new();
        self.traverse(|node| elements.push(node.clone()));

        for node in elements {
            if let Some(id) = node.get_attribute("id") {
                self.elements_by_id.entry(id).or_insert_with(|| node.clone());
            }
            if let Some(control) = node.control() {
                if control.kind == ControlKind::TextArea {
                    control.set_value(node.text_content());
                }
            }
        }
    }

    /// Get the document root. Document-level listeners live here.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    pub fn body(&self) -> Option<Rc<Node>> {
        self.get_elements_by_tag_name("body").into_iter().next()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Node>> {
        self.elements_by_id.get(id).cloned()
    }

    /// Elements with a tag name, in document order.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<Rc<Node>> {
        self.collect(|n| n.tag_name().is_some_and(|t| t.eq_ignore_ascii_case(tag_name)))
    }

    /// Elements carrying a class, in document order.
    pub fn get_elements_by_class_name(&self, class_name: &str) -> Vec<Rc<Node>> {
        self.collect(|n| n.has_class(class_name))
    }

    pub fn get_node(&self, id: NodeId) -> Option<Rc<Node>> {
        self.nodes.get(&id).cloned()
    }

    /// All elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Rc<Node>>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.collect(|n| selector.matches(n)))
    }

    /// First element matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Rc<Node>>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    fn collect(&self, mut predicate: impl FnMut(&Node) -> bool) -> Vec<Rc<Node>> {
        let mut found = Vec::new();
        self.traverse(|node| {
            if predicate(node) {
                found.push(node.clone());
            }
        });
        found
    }

    /// Traverse all nodes depth-first.
    pub fn traverse<F>(&self, mut callback: F)
    where
        F: FnMut(&Rc<Node>),
    {
        Self::traverse_node(&self.root, &mut callback);
    }

    fn traverse_node<F>(node: &Rc<Node>, callback: &mut F)
    where
        F: FnMut(&Rc<Node>),
    {
        callback(node);
        for child in node.children() {
            Self::traverse_node(&child, callback);
        }
    }

    /// Register a listener on the document itself.
    pub fn add_event_listener(
        &self,
        event_type: &str,
        callback: EventListenerCallback,
        options: ListenerOptions,
    ) {
        self.root
            .event_target
            .add_event_listener(event_type, callback, options);
    }

    /// Dispatch an event at `target` along its path from the document root.
    pub fn dispatch_event(&self, target: &Rc<Node>, event: &DomEvent) -> bool {
        EventDispatcher::dispatch(event, target, &target.ancestors())
    }

    /// Dispatch a primary-button click.
    pub fn click(&self, target: &Rc<Node>) -> bool {
        self.dispatch_event(target, &DomEvent::mouse("click", MouseEventData::default()))
    }

    /// Dispatch a primary-button press.
    pub fn mouse_down(&self, target: &Rc<Node>) -> bool {
        self.dispatch_event(target, &DomEvent::mouse("mousedown", MouseEventData::default()))
    }

    /// The focused element, if any.
    pub fn active_element(&self) -> Option<Rc<Node>> {
        self.focused.get().and_then(|id| self.get_node(id))
    }

    /// Move keyboard focus to `target`, firing blur/focusout on the element
    /// losing focus and focus/focusin on `target`.
    pub fn focus(&self, target: &Rc<Node>) -> Result<(), DomError> {
        if !target.is_element() {
            return Err(DomError::InvalidOperation(
                "only elements can receive focus".to_string(),
            ));
        }
        if self.get_node(target.id).is_none() {
            return Err(DomError::NodeNotFound);
        }
        let previous = self.active_element();
        if previous.as_ref().is_some_and(|p| p.id == target.id) {
            return Ok(());
        }

        if let Some(ref previous) = previous {
            let data = FocusEventData {
                related_target: Some(target.id),
            };
            self.dispatch_event(previous, &DomEvent::focus("blur", data));
            self.dispatch_event(previous, &DomEvent::focus("focusout", data));
        }

        self.focused.set(Some(target.id));
        let data = FocusEventData {
            related_target: previous.map(|p| p.id),
        };
        self.dispatch_event(target, &DomEvent::focus("focus", data));
        self.dispatch_event(target, &DomEvent::focus("focusin", data));
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let html = r#"<!DOCTYPE html>
<html>
<head><title>Test</title></head>
<body><p id="main">Hello, world!</p></body>
</html>"#;

        let doc = Document::parse_html(html).unwrap();
        assert!(doc.body().is_some());

        let main = doc.get_element_by_id("main").unwrap();
        assert_eq!(main.tag_name(), Some("p"));
        assert_eq!(main.text_content(), "Hello, world!");
        assert_eq!(main.parent().unwrap().tag_name(), Some("body"));
    }

    #[test]
    fn test_queries_are_in_document_order() {
        let html = r#"<html><body>
    <ul>
        <li class="word-item" id="w1">uno</li>
        <li class="word-item" id="w2">dos</li>
        <li class="word-item" id="w3">tres</li>
    </ul>
    <p class="word-item" id="w4">cuatro</p>
</body></html>"#;

        let doc = Document::parse_html(html).unwrap();
        let ids: Vec<String> = doc
            .get_elements_by_class_name("word-item")
            .iter()
            .filter_map(|n| n.get_attribute("id"))
            .collect();
        assert_eq!(ids, vec!["w1", "w2", "w3", "w4"]);

        assert_eq!(doc.get_elements_by_tag_name("LI").len(), 3);
        assert_eq!(doc.query_selector_all("li.word-item, p").unwrap().len(), 4);
        assert!(doc.query_selector("div").unwrap().is_none());
        assert!(doc.query_selector("li p").is_err());
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first() {
        let doc = Document::parse_html(
            "<html><body><p id='x'>first</p><p id='x'>second</p></body></html>",
        )
        .unwrap();
        assert_eq!(doc.get_element_by_id("x").unwrap().text_content(), "first");
    }

    #[test]
    fn test_attribute_and_style_mutation() {
        let doc = Document::parse_html(
            "<html><body><div id='menu' style='color: red'></div></body></html>",
        )
        .unwrap();
        let menu = doc.get_element_by_id("menu").unwrap();

        assert_eq!(menu.style_property("display"), None);
        menu.set_style_property("display", "block");
        assert_eq!(menu.style_property("display").as_deref(), Some("block"));
        assert_eq!(menu.style_property("color").as_deref(), Some("red"));

        menu.set_attribute("data-open", "1");
        assert!(menu.has_attribute("data-open"));
        assert_eq!(menu.remove_attribute("data-open").as_deref(), Some("1"));
    }

    #[test]
    fn test_form_controls_from_markup() {
        let doc = Document::parse_html(
            r#"<html><body>
                <input id="answer" type="text" value="gato">
                <input id="reverse" type="checkbox" checked>
                <textarea id="notes">remember</textarea>
                <div id="plain"></div>
            </body></html>"#,
        )
        .unwrap();

        let answer = doc.get_element_by_id("answer").unwrap();
        assert_eq!(answer.control().unwrap().value(), "gato");

        let reverse = doc.get_element_by_id("reverse").unwrap();
        assert!(reverse.control().unwrap().is_checked());

        let notes = doc.get_element_by_id("notes").unwrap();
        assert_eq!(notes.control().unwrap().value(), "remember");

        assert!(doc.get_element_by_id("plain").unwrap().control().is_none());
    }

    #[test]
    fn test_focus_moves_between_elements() {
        let doc = Document::parse_html(
            "<html><body><input id='a'><input id='b'></body></html>",
        )
        .unwrap();
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();

        let blurred = Rc::new(Cell::new(false));
        let flag = blurred.clone();
        a.event_target.add_event_listener(
            "blur",
            Box::new(move |_| flag.set(true)),
            ListenerOptions::default(),
        );

        assert!(doc.active_element().is_none());
        doc.focus(&a).unwrap();
        assert_eq!(doc.active_element().unwrap().id, a.id);
        doc.focus(&b).unwrap();
        assert_eq!(doc.active_element().unwrap().id, b.id);
        assert!(blurred.get());

        assert!(matches!(
            doc.focus(doc.root()),
            Err(DomError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_ancestors_start_at_root() {
        let doc = Document::parse_html("<html><body><p id='p'>x</p></body></html>").unwrap();
        let p = doc.get_element_by_id("p").unwrap();
        let chain = p.ancestors();

        assert_eq!(chain[0].node_type, NodeType::Document);
        assert_eq!(chain.last().unwrap().tag_name(), Some("body"));
    }
}
