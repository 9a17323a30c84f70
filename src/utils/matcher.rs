use log::warn;
use regex::Regex;

/// Tests whether `pattern` matches anywhere in `text`. An empty pattern
/// matches everything; a pattern that fails to compile matches nothing.
pub fn reg_find(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    match Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            warn!("Invalid regex '{}': {}", pattern, e);
            false
        }
    }
}

/// Replaces every match of `pattern` in `text` with `replacement`.
/// `$1`-style capture references are expanded. A pattern that fails to
/// compile leaves the text untouched.
pub fn reg_replace(text: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(text, replacement).into_owned(),
        Err(e) => {
            warn!("Invalid regex '{}': {}", pattern, e);
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_find() {
        assert!(reg_find("HK Node 1", ".*HK.*"));
        assert!(!reg_find("US Node 1", ".*HK.*"));
        assert!(reg_find("anything", ""));
    }

    #[test]
    fn test_reg_replace_with_backreference() {
        assert_eq!(reg_replace("Node-01", r"Node-(\d+)", "N$1"), "N01");
    }

    #[test]
    fn test_bad_pattern_is_inert() {
        assert!(!reg_find("text", "(unclosed"));
        assert_eq!(reg_replace("text", "(unclosed", "x"), "text");
    }
}
