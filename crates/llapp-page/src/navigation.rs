//! # Navigation
//!
//! The seam through which item clicks leave the page. The host supplies a
//! [`Navigator`]; [`Location`] is the in-process one that records the
//! session's navigations.

use std::cell::RefCell;
use tracing::info;

/// Something that can move the window to another URL.
pub trait Navigator {
    /// Navigate to `url` exactly as given. Relative URLs are resolved by the
    /// host, not here.
    fn navigate(&self, url: &str);
}

/// Location object (window.location) with its navigation history.
#[derive(Debug)]
pub struct Location {
    href: RefCell<String>,
    history: RefCell<Vec<String>>,
}

impl Location {
    /// Create a location positioned at `href`.
    pub fn new(href: &str) -> Self {
        Self {
            href: RefCell::new(href.to_string()),
            history: RefCell::new(Vec::new()),
        }
    }

    /// Current URL.
    pub fn href(&self) -> String {
        self.href.borrow().clone()
    }

    /// URLs navigated to, oldest first. The starting URL is not included.
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }

    pub fn navigation_count(&self) -> usize {
        self.history.borrow().len()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl Navigator for Location {
    fn navigate(&self, url: &str) {
        info!(from = %self.href.borrow(), to = %url, "Navigating");
        *self.href.borrow_mut() = url.to_string();
        self.history.borrow_mut().push(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_records_navigations() {
        let location = Location::new("http://localhost:8000/words/");
        assert_eq!(location.navigation_count(), 0);

        location.navigate("/words/42/");
        location.navigate("/words/43/");

        assert_eq!(location.href(), "/words/43/");
        assert_eq!(location.history(), vec!["/words/42/", "/words/43/"]);
    }

    #[test]
    fn test_default_is_blank() {
        assert_eq!(Location::default().href(), "about:blank");
    }
}
