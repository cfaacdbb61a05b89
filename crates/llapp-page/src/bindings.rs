//! # Page Bindings
//!
//! Typed views of the attribute contract between page markup and the
//! interaction helpers, read from the document once at initialization.

use std::rc::{Rc, Weak};

use llapp_core::PageConfig;
use tracing::debug;

use crate::{Document, DomError, Node, NodeId};

/// A dropdown trigger and the menu it controls.
#[derive(Debug, Clone)]
pub struct DropdownBinding {
    pub trigger: NodeId,
    /// Value of the trigger's menu attribute; empty when absent.
    pub menu_id: String,
    /// The menu element, if the id resolves.
    pub menu: Option<Weak<Node>>,
}

impl DropdownBinding {
    /// Bind every trigger in the document, in document order.
    pub fn scan(doc: &Document, config: &PageConfig) -> Result<Vec<Self>, DomError> {
        let triggers = doc.query_selector_all(&config.dropdown_trigger_selector)?;
        Ok(triggers
            .iter()
            .map(|trigger| {
                let menu_id = trigger
                    .get_attribute(&config.menu_attribute)
                    .unwrap_or_default();
                let menu = doc
                    .get_element_by_id(&menu_id)
                    .map(|menu| Rc::downgrade(&menu));
                if menu.is_none() {
                    debug!(trigger = trigger.id.raw(), menu_id = %menu_id, "Dropdown menu not found");
                }
                Self {
                    trigger: trigger.id,
                    menu_id,
                    menu,
                }
            })
            .collect())
    }

    /// The menu element, while it is still part of the document.
    pub fn menu(&self) -> Option<Rc<Node>> {
        self.menu.as_ref().and_then(Weak::upgrade)
    }
}

/// A list item that navigates when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItemBinding {
    pub item: NodeId,
    /// Target URL; `None` when the attribute is absent or empty.
    pub url: Option<String>,
}

impl NavItemBinding {
    pub fn scan(doc: &Document, config: &PageConfig) -> Result<Vec<Self>, DomError> {
        let items = doc.query_selector_all(&config.nav_item_selector)?;
        Ok(items
            .iter()
            .map(|item| Self {
                item: item.id,
                url: target_url(item, &config.url_attribute),
            })
            .collect())
    }
}

/// Read a navigation target from `attribute`, treating empty as absent.
pub(crate) fn target_url(node: &Node, attribute: &str) -> Option<String> {
    node.get_attribute(attribute).filter(|url| !url.is_empty())
}

/// The two actions the practice form switches between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeToggle {
    pub normal_url: String,
    pub reverse_url: String,
}

impl PracticeToggle {
    pub fn new(normal_url: impl Into<String>, reverse_url: impl Into<String>) -> Self {
        Self {
            normal_url: normal_url.into(),
            reverse_url: reverse_url.into(),
        }
    }

    /// The action for the given checkbox state.
    pub fn action_for(&self, reverse: bool) -> &str {
        if reverse {
            &self.reverse_url
        } else {
            &self.normal_url
        }
    }
}

/// Every binding on a page.
#[derive(Debug, Clone, Default)]
pub struct PageBindings {
    pub dropdowns: Vec<DropdownBinding>,
    pub nav_items: Vec<NavItemBinding>,
}

impl PageBindings {
    pub fn scan(doc: &Document, config: &PageConfig) -> Result<Self, DomError> {
        let bindings = Self {
            dropdowns: DropdownBinding::scan(doc, config)?,
            nav_items: NavItemBinding::scan(doc, config)?,
        };
        debug!(
            dropdowns = bindings.dropdowns.len(),
            nav_items = bindings.nav_items.len(),
            "Page bindings scanned"
        );
        Ok(bindings)
    }
}
