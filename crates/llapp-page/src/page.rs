//! A loaded page: parsed document, configuration and navigator.

use std::rc::Rc;

use llapp_core::PageConfig;
use tracing::info;

use crate::bindings::{PageBindings, PracticeToggle};
use crate::helpers;
use crate::{Document, DomError, Navigator, NodeId};

pub struct Page {
    document: Document,
    config: PageConfig,
    navigator: Rc<dyn Navigator>,
    bindings: PageBindings,
}

impl Page {
    /// Parse `html` and run the content-loaded wiring (dropdowns and item
    /// navigation).
    pub fn load(
        html: &str,
        config: PageConfig,
        navigator: Rc<dyn Navigator>,
    ) -> Result<Self, DomError> {
        let document = Document::parse_html(html)?;
        let bindings = PageBindings::scan(&document, &config)?;
        let page = Self {
            document,
            config,
            navigator,
            bindings,
        };
        page.initialize_dropdowns()?;
        page.initialize_item_navigation()?;

        info!(
            dropdowns = page.bindings.dropdowns.len(),
            nav_items = page.bindings.nav_items.len(),
            "Page loaded"
        );
        Ok(page)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Bindings found when the page loaded.
    pub fn bindings(&self) -> &PageBindings {
        &self.bindings
    }

    /// Wire the dropdowns found at load.
    pub fn initialize_dropdowns(&self) -> Result<usize, DomError> {
        helpers::wire_dropdowns(&self.document, &self.config, &self.bindings.dropdowns)
    }

    /// Wire the navigable items found at load.
    pub fn initialize_item_navigation(&self) -> Result<usize, DomError> {
        helpers::wire_item_navigation(
            &self.document,
            &self.config,
            &self.bindings.nav_items,
            Rc::clone(&self.navigator),
        )
    }

    pub fn update_practice_url(&self, toggle: &PracticeToggle) -> Option<String> {
        helpers::update_practice_url(&self.document, &self.config, toggle)
    }

    pub fn auto_focus_first_input(&self) -> Option<NodeId> {
        helpers::auto_focus_first_input(&self.document)
    }
}
