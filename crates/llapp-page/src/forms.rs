//! # Form Controls
//!
//! Live state of `<input>` and `<textarea>` elements: type, value and
//! checkedness. Attributes only provide the initial values.

use std::cell::{Cell, RefCell};

/// Input type for HTML input elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Email,
    Url,
    Tel,
    Number,
    Search,
    Hidden,
    Submit,
    Button,
    Reset,
    Checkbox,
    Radio,
    File,
}

impl InputType {
    /// Parse the `type` attribute (case-insensitive). Unknown or missing
    /// values are text inputs.
    pub fn from_attribute(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return InputType::Text;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "password" => InputType::Password,
            "email" => InputType::Email,
            "url" => InputType::Url,
            "tel" => InputType::Tel,
            "number" => InputType::Number,
            "search" => InputType::Search,
            "hidden" => InputType::Hidden,
            "submit" => InputType::Submit,
            "button" => InputType::Button,
            "reset" => InputType::Reset,
            "checkbox" => InputType::Checkbox,
            "radio" => InputType::Radio,
            "file" => InputType::File,
            _ => InputType::Text,
        }
    }

    /// Check if this input type accepts text.
    pub fn is_text_input(&self) -> bool {
        matches!(
            self,
            InputType::Text
                | InputType::Password
                | InputType::Email
                | InputType::Url
                | InputType::Tel
                | InputType::Number
                | InputType::Search
        )
    }

    /// Check if this is a checkable input.
    pub fn is_checkable(&self) -> bool {
        matches!(self, InputType::Checkbox | InputType::Radio)
    }
}

/// State for checkbox/radio inputs.
#[derive(Debug, Default)]
pub struct CheckableState {
    checked: Cell<bool>,
    /// Checkedness from markup, restored by `reset`.
    default_checked: Cell<bool>,
}

impl CheckableState {
    pub fn new(default_checked: bool) -> Self {
        Self {
            checked: Cell::new(default_checked),
            default_checked: Cell::new(default_checked),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    pub fn set_checked(&self, checked: bool) {
        self.checked.set(checked);
    }

    pub fn toggle(&self) {
        self.checked.set(!self.checked.get());
    }

    pub fn reset(&self) {
        self.checked.set(self.default_checked.get());
    }
}

/// Which element a control belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Input(InputType),
    TextArea,
}

/// Live state of a form control.
#[derive(Debug)]
pub struct FormControl {
    pub kind: ControlKind,
    value: RefCell<String>,
    pub checkable: CheckableState,
}

impl FormControl {
    /// State of an `<input>` built from its attributes.
    pub fn input(type_attr: Option<&str>, value: Option<&str>, checked: bool) -> Self {
        Self {
            kind: ControlKind::Input(InputType::from_attribute(type_attr)),
            value: RefCell::new(value.unwrap_or_default().to_string()),
            checkable: CheckableState::new(checked),
        }
    }

    /// State of a `<textarea>`; its value is filled from its text once
    /// children are known.
    pub fn textarea() -> Self {
        Self {
            kind: ControlKind::TextArea,
            value: RefCell::new(String::new()),
            checkable: CheckableState::default(),
        }
    }

    pub fn value(&self) -> String {
        self.value.borrow().clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.borrow_mut() = value.into();
    }

    pub fn is_empty(&self) -> bool {
        self.value.borrow().is_empty()
    }

    /// Whether the control takes typed text (text-like inputs and textareas).
    pub fn is_text_entry(&self) -> bool {
        match self.kind {
            ControlKind::Input(input_type) => input_type.is_text_input(),
            ControlKind::TextArea => true,
        }
    }

    pub fn is_checked(&self) -> bool {
        match self.kind {
            ControlKind::Input(input_type) if input_type.is_checkable() => {
                self.checkable.is_checked()
            }
            _ => false,
        }
    }

    pub fn set_checked(&self, checked: bool) {
        self.checkable.set_checked(checked);
    }
}
