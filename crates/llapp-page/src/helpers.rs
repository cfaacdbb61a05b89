//! # Interaction Helpers
//!
//! The four page behaviors. The public wiring helpers scan the document for
//! their bindings when called; `Page` hands over the bindings it scanned at
//! load instead. Listeners are keyed, so wiring twice on the same document
//! leaves a single listener per node.

use std::rc::{Rc, Weak};

use llapp_core::PageConfig;
use tracing::{debug, warn};

use crate::bindings::{target_url, DropdownBinding, NavItemBinding, PracticeToggle};
use crate::{Document, DomError, DomEvent, ListenerOptions, Navigator, Node, NodeId};

const DROPDOWN_TOGGLE: &str = "llapp.dropdown.toggle";
const DROPDOWN_PRESS: &str = "llapp.dropdown.press";
const DROPDOWN_DISMISS: &str = "llapp.dropdown.dismiss";
const ITEM_NAVIGATION: &str = "llapp.item.navigate";

const FIRST_INPUT_SELECTOR: &str = "input[type=\"text\"], textarea";

fn is_shown(menu: &Node) -> bool {
    menu.style_property("display").as_deref() == Some("block")
}

fn hide_all(menus: &[Weak<Node>], except: Option<NodeId>) {
    for menu in menus.iter().filter_map(Weak::upgrade) {
        if Some(menu.id) != except {
            menu.set_style_property("display", "none");
        }
    }
}

/// Wire dropdown triggers to their menus.
///
/// A trigger click stops propagation, hides every other menu and toggles its
/// own between `block` and `none`. A press on a trigger stops propagation.
/// Any other click reaching the document hides all menus. The set of menus
/// is the one present when this runs.
///
/// Returns the number of triggers wired.
pub fn initialize_dropdowns(doc: &Document, config: &PageConfig) -> Result<usize, DomError> {
    let bindings = DropdownBinding::scan(doc, config)?;
    wire_dropdowns(doc, config, &bindings)
}

/// Wire the given dropdown bindings.
pub(crate) fn wire_dropdowns(
    doc: &Document,
    config: &PageConfig,
    bindings: &[DropdownBinding],
) -> Result<usize, DomError> {
    let menus: Rc<Vec<Weak<Node>>> = Rc::new(
        doc.query_selector_all(&config.dropdown_menu_selector)?
            .iter()
            .map(Rc::downgrade)
            .collect(),
    );

    let mut wired = 0;
    for binding in bindings {
        let Some(trigger) = doc.get_node(binding.trigger) else {
            continue;
        };

        wired += 1;
        let own_menu = binding.menu.clone();
        let all_menus = Rc::clone(&menus);
        let menu_id = binding.menu_id.clone();
        trigger.event_target.add_event_listener(
            "click",
            Box::new(move |event: &DomEvent| {
                event.event().stop_propagation();
                let menu = own_menu.as_ref().and_then(Weak::upgrade);
                hide_all(&all_menus, menu.as_ref().map(|m| m.id));

                let Some(menu) = menu else {
                    debug!(menu_id = %menu_id, "Dropdown trigger has no menu");
                    return;
                };
                let next = if is_shown(&menu) { "none" } else { "block" };
                menu.set_style_property("display", next);
                debug!(menu_id = %menu_id, display = next, "Dropdown toggled");
            }),
            ListenerOptions::keyed(DROPDOWN_TOGGLE),
        );

        trigger.event_target.add_event_listener(
            "mousedown",
            Box::new(|event: &DomEvent| event.event().stop_propagation()),
            ListenerOptions::keyed(DROPDOWN_PRESS),
        );
    }

    let all_menus = Rc::clone(&menus);
    doc.add_event_listener(
        "click",
        Box::new(move |_| hide_all(&all_menus, None)),
        ListenerOptions::keyed(DROPDOWN_DISMISS),
    );

    debug!(triggers = wired, menus = menus.len(), "Dropdowns initialized");
    Ok(wired)
}

/// Make navigable items clickable.
///
/// The target URL is read when the click happens; an absent or empty URL
/// does nothing. Returns the number of items wired.
pub fn initialize_item_navigation(
    doc: &Document,
    config: &PageConfig,
    navigator: Rc<dyn Navigator>,
) -> Result<usize, DomError> {
    let items = NavItemBinding::scan(doc, config)?;
    wire_item_navigation(doc, config, &items, navigator)
}

/// Wire the given item bindings. The URL scanned into a binding is only
/// used for logging; clicks read the attribute again.
pub(crate) fn wire_item_navigation(
    doc: &Document,
    config: &PageConfig,
    items: &[NavItemBinding],
    navigator: Rc<dyn Navigator>,
) -> Result<usize, DomError> {
    let mut wired = 0;
    for binding in items {
        let Some(item) = doc.get_node(binding.item) else {
            continue;
        };
        if binding.url.is_none() {
            debug!(item = binding.item.raw(), "Item wired without a target URL");
        }
        wired += 1;

        let node = Rc::downgrade(&item);
        let attribute = config.url_attribute.clone();
        let navigator = Rc::clone(&navigator);
        item.event_target.add_event_listener(
            "click",
            Box::new(move |_| {
                let Some(node) = node.upgrade() else {
                    return;
                };
                match target_url(&node, &attribute) {
                    Some(url) => navigator.navigate(&url),
                    None => debug!(item = node.id.raw(), "Item has no target URL"),
                }
            }),
            ListenerOptions::keyed(ITEM_NAVIGATION),
        );
    }

    debug!(items = wired, "Item navigation initialized");
    Ok(wired)
}

/// Point the practice form at the reverse URL when the reverse checkbox is
/// checked, otherwise at the normal URL.
///
/// Returns the action set, or `None` if the checkbox or the form is missing.
pub fn update_practice_url(
    doc: &Document,
    config: &PageConfig,
    toggle: &PracticeToggle,
) -> Option<String> {
    let (Some(checkbox), Some(form)) = (
        doc.get_element_by_id(&config.reverse_checkbox_id),
        doc.get_element_by_id(&config.practice_form_id),
    ) else {
        debug!(
            checkbox = %config.reverse_checkbox_id,
            form = %config.practice_form_id,
            "Practice form elements missing"
        );
        return None;
    };

    let reverse = checkbox.control().is_some_and(|c| c.is_checked());
    let action = toggle.action_for(reverse).to_string();
    form.set_attribute("action", &action);
    debug!(reverse, action = %action, "Practice URL updated");
    Some(action)
}

/// Focus the first text input or textarea if it is empty.
///
/// Returns the focused element.
pub fn auto_focus_first_input(doc: &Document) -> Option<NodeId> {
    let first = match doc.query_selector(FIRST_INPUT_SELECTOR) {
        Ok(first) => first?,
        Err(e) => {
            warn!(error = %e, "Auto-focus selector rejected");
            return None;
        }
    };

    if !first.control().is_some_and(|c| c.is_empty()) {
        debug!(element = first.id.raw(), "First input already has a value");
        return None;
    }

    match doc.focus(&first) {
        Ok(()) => Some(first.id),
        Err(e) => {
            warn!(error = %e, "Auto-focus failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Location;

    const PAGE: &str = r#"<html><body>
        <nav>
            <button class="dropdown-btn" id="lessons-btn" data-menu="lessons">Lessons</button>
            <div class="dropdown-menu" id="lessons"><a>One</a></div>
            <button class="dropdown-btn" id="profile-btn" data-menu="profile">Profile</button>
            <div class="dropdown-menu" id="profile"></div>
        </nav>
        <p id="outside">text</p>
    </body></html>"#;

    fn display(doc: &Document, id: &str) -> Option<String> {
        doc.get_element_by_id(id).unwrap().style_property("display")
    }

    #[test]
    fn test_dropdown_toggle_and_dismiss() {
        let doc = Document::parse_html(PAGE).unwrap();
        assert_eq!(initialize_dropdowns(&doc, &PageConfig::default()).unwrap(), 2);

        let lessons_btn = doc.get_element_by_id("lessons-btn").unwrap();
        let profile_btn = doc.get_element_by_id("profile-btn").unwrap();

        doc.click(&lessons_btn);
        assert_eq!(display(&doc, "lessons").as_deref(), Some("block"));
        assert_eq!(display(&doc, "profile").as_deref(), Some("none"));

        doc.click(&profile_btn);
        assert_eq!(display(&doc, "lessons").as_deref(), Some("none"));
        assert_eq!(display(&doc, "profile").as_deref(), Some("block"));

        doc.click(&profile_btn);
        assert_eq!(display(&doc, "profile").as_deref(), Some("none"));

        doc.click(&lessons_btn);
        doc.click(&doc.get_element_by_id("outside").unwrap());
        assert_eq!(display(&doc, "lessons").as_deref(), Some("none"));
    }

    #[test]
    fn test_dropdown_press_does_not_bubble() {
        let doc = Document::parse_html(PAGE).unwrap();
        initialize_dropdowns(&doc, &PageConfig::default()).unwrap();

        let reached = Rc::new(std::cell::Cell::new(false));
        let flag = Rc::clone(&reached);
        doc.add_event_listener(
            "mousedown",
            Box::new(move |_| flag.set(true)),
            ListenerOptions::default(),
        );

        doc.mouse_down(&doc.get_element_by_id("lessons-btn").unwrap());
        assert!(!reached.get());
        doc.mouse_down(&doc.get_element_by_id("outside").unwrap());
        assert!(reached.get());
    }

    #[test]
    fn test_rewiring_is_idempotent() {
        let doc = Document::parse_html(PAGE).unwrap();
        let config = PageConfig::default();
        initialize_dropdowns(&doc, &config).unwrap();
        initialize_dropdowns(&doc, &config).unwrap();

        let button = doc.get_element_by_id("lessons-btn").unwrap();
        assert_eq!(button.event_target.listener_count("click"), 1);
        assert_eq!(doc.root().event_target.listener_count("click"), 1);

        // A doubly wired toggle would open and close in one click.
        doc.click(&button);
        assert_eq!(display(&doc, "lessons").as_deref(), Some("block"));
    }

    #[test]
    fn test_wire_only_given_bindings() {
        let doc = Document::parse_html(PAGE).unwrap();
        let config = PageConfig::default();
        let bindings = DropdownBinding::scan(&doc, &config).unwrap();
        assert_eq!(wire_dropdowns(&doc, &config, &bindings[..1]).unwrap(), 1);

        let profile_btn = doc.get_element_by_id("profile-btn").unwrap();
        assert!(!profile_btn.event_target.has_listeners("click"));

        doc.click(&doc.get_element_by_id("lessons-btn").unwrap());
        assert_eq!(display(&doc, "lessons").as_deref(), Some("block"));

        // Unwired trigger: the click reaches the document and closes menus.
        doc.click(&profile_btn);
        assert_eq!(display(&doc, "lessons").as_deref(), Some("none"));
    }

    #[test]
    fn test_trigger_without_menu_still_closes_others() {
        let doc = Document::parse_html(
            r#"<html><body>
                <button class="dropdown-btn" id="broken" data-menu="nowhere">?</button>
                <div class="dropdown-menu" id="m" style="display: block"></div>
            </body></html>"#,
        )
        .unwrap();
        initialize_dropdowns(&doc, &PageConfig::default()).unwrap();

        doc.click(&doc.get_element_by_id("broken").unwrap());
        assert_eq!(display(&doc, "m").as_deref(), Some("none"));
    }

    #[test]
    fn test_item_navigation_reads_url_at_click() {
        let doc = Document::parse_html(
            r#"<html><body><ul>
                <li class="word-item" id="a" data-url="/words/7/">siete</li>
                <li class="word-item" id="b">none</li>
            </ul></body></html>"#,
        )
        .unwrap();
        let location = Rc::new(Location::default());
        let wired =
            initialize_item_navigation(&doc, &PageConfig::default(), location.clone()).unwrap();
        assert_eq!(wired, 2);

        doc.click(&doc.get_element_by_id("b").unwrap());
        assert_eq!(location.navigation_count(), 0);

        let a = doc.get_element_by_id("a").unwrap();
        doc.click(&a);
        a.set_attribute("data-url", "/words/8/");
        doc.click(&a);
        assert_eq!(location.history(), vec!["/words/7/", "/words/8/"]);
    }

    #[test]
    fn test_practice_url() {
        let doc = Document::parse_html(
            r#"<html><body>
                <input type="checkbox" id="reverse-practice">
                <form id="practice-form" action="/start/"></form>
            </body></html>"#,
        )
        .unwrap();
        let config = PageConfig::default();
        let toggle = PracticeToggle::new("/practice/", "/practice/reverse/");
        let form = doc.get_element_by_id("practice-form").unwrap();

        assert_eq!(
            update_practice_url(&doc, &config, &toggle).as_deref(),
            Some("/practice/")
        );
        assert_eq!(form.get_attribute("action").as_deref(), Some("/practice/"));

        let checkbox = doc.get_element_by_id("reverse-practice").unwrap();
        checkbox.control().unwrap().set_checked(true);
        update_practice_url(&doc, &config, &toggle);
        assert_eq!(
            form.get_attribute("action").as_deref(),
            Some("/practice/reverse/")
        );
    }

    #[test]
    fn test_practice_url_missing_elements() {
        let doc = Document::parse_html("<html><body><form id='practice-form'></form></body></html>")
            .unwrap();
        let toggle = PracticeToggle::new("/a/", "/b/");
        assert!(update_practice_url(&doc, &PageConfig::default(), &toggle).is_none());
        assert!(doc
            .get_element_by_id("practice-form")
            .unwrap()
            .get_attribute("action")
            .is_none());
    }

    #[test]
    fn test_auto_focus() {
        let doc = Document::parse_html(
            r#"<html><body>
                <input type="checkbox" id="c">
                <input type="Text" id="answer">
                <textarea id="notes"></textarea>
            </body></html>"#,
        )
        .unwrap();
        let answer = doc.get_element_by_id("answer").unwrap();
        assert_eq!(auto_focus_first_input(&doc), Some(answer.id));
        assert_eq!(doc.active_element().unwrap().id, answer.id);
    }

    #[test]
    fn test_auto_focus_skips_filled_field() {
        let doc = Document::parse_html(
            r#"<html><body>
                <textarea id="notes">draft</textarea>
                <input type="text" id="later">
            </body></html>"#,
        )
        .unwrap();
        assert_eq!(auto_focus_first_input(&doc), None);
        assert!(doc.active_element().is_none());

        let empty = Document::parse_html("<html><body><p>no fields</p></body></html>").unwrap();
        assert_eq!(auto_focus_first_input(&empty), None);
    }
}
