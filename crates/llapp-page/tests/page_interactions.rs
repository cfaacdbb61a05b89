//! Page behaviors driven through a loaded lesson page.

use std::rc::Rc;

use llapp_core::PageConfig;
use llapp_page::{Location, Page, PracticeToggle};

const LESSON_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Lesson 3</title></head>
<body>
    <header>
        <button class="dropdown-btn" id="lesson-actions" data-menu="lesson-menu">Actions</button>
        <div class="dropdown-menu" id="lesson-menu">
            <a href="/lessons/3/edit/">Edit</a>
        </div>
        <button class="dropdown-btn" id="account" data-menu="account-menu">Account</button>
        <div class="dropdown-menu" id="account-menu">
            <a href="/logout/">Log out</a>
        </div>
    </header>
    <main id="content">
        <ul class="word-list">
            <li class="word-item" id="perro" data-url="/words/11/">perro</li>
            <li class="word-item" id="gato" data-url="/words/12/">gato</li>
            <li class="word-item" id="draft">borrador</li>
        </ul>
        <form id="practice-form" method="get" action="/lessons/3/practice/">
            <label><input type="checkbox" id="reverse-practice"> Reverse</label>
            <button type="submit">Practice</button>
        </form>
        <form id="add-word">
            <input type="text" id="word" name="word">
            <textarea id="meaning" name="meaning"></textarea>
        </form>
    </main>
</body>
</html>"#;

fn load(html: &str) -> (Page, Rc<Location>) {
    let location = Rc::new(Location::new("http://localhost:8000/lessons/3/"));
    let page = Page::load(html, PageConfig::default(), location.clone()).unwrap();
    (page, location)
}

fn display(page: &Page, id: &str) -> Option<String> {
    page.document()
        .get_element_by_id(id)
        .unwrap()
        .style_property("display")
}

fn click(page: &Page, id: &str) {
    let doc = page.document();
    doc.click(&doc.get_element_by_id(id).unwrap());
}

#[test]
fn dropdown_opens_closes_and_dismisses() {
    let (page, _) = load(LESSON_PAGE);

    click(&page, "lesson-actions");
    assert_eq!(display(&page, "lesson-menu").as_deref(), Some("block"));

    click(&page, "account");
    assert_eq!(display(&page, "lesson-menu").as_deref(), Some("none"));
    assert_eq!(display(&page, "account-menu").as_deref(), Some("block"));

    click(&page, "account");
    assert_eq!(display(&page, "account-menu").as_deref(), Some("none"));

    click(&page, "lesson-actions");
    click(&page, "content");
    assert_eq!(display(&page, "lesson-menu").as_deref(), Some("none"));
    assert_eq!(display(&page, "account-menu").as_deref(), Some("none"));
}

#[test]
fn reinitializing_dropdowns_keeps_single_toggle() {
    let (page, _) = load(LESSON_PAGE);
    page.initialize_dropdowns().unwrap();
    page.initialize_dropdowns().unwrap();

    click(&page, "lesson-actions");
    assert_eq!(display(&page, "lesson-menu").as_deref(), Some("block"));
}

#[test]
fn word_items_navigate_to_their_url() {
    let (page, location) = load(LESSON_PAGE);

    click(&page, "gato");
    assert_eq!(location.href(), "/words/12/");

    click(&page, "draft");
    assert_eq!(location.history(), vec!["/words/12/"]);

    page.initialize_item_navigation().unwrap();
    click(&page, "perro");
    assert_eq!(location.history(), vec!["/words/12/", "/words/11/"]);
}

#[test]
fn practice_form_follows_reverse_checkbox() {
    let (page, _) = load(LESSON_PAGE);
    let toggle = PracticeToggle::new("/lessons/3/practice/", "/lessons/3/practice/reverse/");
    let doc = page.document();
    let form = doc.get_element_by_id("practice-form").unwrap();

    doc.get_element_by_id("reverse-practice")
        .unwrap()
        .control()
        .unwrap()
        .set_checked(true);
    page.update_practice_url(&toggle);
    assert_eq!(
        form.get_attribute("action").as_deref(),
        Some("/lessons/3/practice/reverse/")
    );

    doc.get_element_by_id("reverse-practice")
        .unwrap()
        .control()
        .unwrap()
        .set_checked(false);
    page.update_practice_url(&toggle);
    assert_eq!(
        form.get_attribute("action").as_deref(),
        Some("/lessons/3/practice/")
    );
}

#[test]
fn practice_toggle_without_form_is_silent() {
    let (page, _) = load(
        "<html><body><input type='checkbox' id='reverse-practice' checked></body></html>",
    );
    let toggle = PracticeToggle::new("/a/", "/b/");
    assert_eq!(page.update_practice_url(&toggle), None);
}

#[test]
fn auto_focus_targets_first_empty_text_field() {
    let (page, _) = load(LESSON_PAGE);
    let word = page.document().get_element_by_id("word").unwrap();

    assert_eq!(page.auto_focus_first_input(), Some(word.id));
    assert_eq!(page.document().active_element().unwrap().id, word.id);
}

#[test]
fn auto_focus_leaves_filled_field_alone() {
    let (page, _) = load(
        r#"<html><body>
            <input type="text" id="word" value="casa">
            <textarea id="meaning"></textarea>
        </body></html>"#,
    );
    assert_eq!(page.auto_focus_first_input(), None);
    assert!(page.document().active_element().is_none());
}
