//! Inline `style` attribute access.

/// Parse an inline style declaration list into ordered `(property, value)`
/// pairs. Property names are lowercased; later duplicates win.
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    let mut declarations: Vec<(String, String)> = Vec::new();
    for declaration in style.split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        match declarations.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value.to_string(),
            None => declarations.push((name, value.to_string())),
        }
    }
    declarations
}

/// Serialize declarations back into attribute form.
pub fn serialize_inline_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set (or with an empty value, remove) one property in a style string.
pub fn set_property(style: &str, name: &str, value: &str) -> String {
    let name = name.to_ascii_lowercase();
    let mut declarations = parse_inline_style(style);
    declarations.retain(|(n, _)| *n != name);
    if !value.is_empty() {
        declarations.push((name, value.to_string()));
    }
    serialize_inline_style(&declarations)
}

/// Read one property from a style string.
pub fn get_property(style: &str, name: &str) -> Option<String> {
    let name = name.to_ascii_lowercase();
    parse_inline_style(style)
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let parsed = parse_inline_style("Display: none; color:red;;  margin : 0 ");
        assert_eq!(
            parsed,
            vec![
                ("display".to_string(), "none".to_string()),
                ("color".to_string(), "red".to_string()),
                ("margin".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_and_get() {
        let style = set_property("color: red", "display", "block");
        assert_eq!(style, "color: red; display: block;");
        assert_eq!(get_property(&style, "DISPLAY").as_deref(), Some("block"));

        let style = set_property(&style, "display", "none");
        assert_eq!(get_property(&style, "display").as_deref(), Some("none"));
        assert_eq!(get_property(&style, "color").as_deref(), Some("red"));

        let style = set_property(&style, "display", "");
        assert_eq!(get_property(&style, "display"), None);
    }

    #[test]
    fn test_malformed_declarations_are_skipped() {
        assert!(parse_inline_style("display; :none; color:").is_empty());
        assert_eq!(get_property("", "display"), None);
    }
}
