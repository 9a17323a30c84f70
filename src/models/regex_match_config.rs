use crate::utils::matcher::{reg_find, reg_replace};

/// One rename or emoji rule: a regex and its replacement (rename) or the
/// emoji to prefix (emoji).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexMatchConfig {
    pub matcher: String,
    pub replace: String,
}

pub type RegexMatchConfigs = Vec<RegexMatchConfig>;

impl RegexMatchConfig {
    /// Applies this rule as a rename, rewriting matches in place.
    pub fn process(&self, remark: &mut String) {
        *remark = reg_replace(remark, &self.matcher, &self.replace);
    }

    /// Whether this rule's pattern matches the remark.
    pub fn matches(&self, remark: &str) -> bool {
        reg_find(remark, &self.matcher)
    }
}

/// Parses `rename_node` preference lines of the shape
/// `pattern@replacement`; a bare `pattern` deletes its matches.
pub fn parse_rename_rules(lines: &[String]) -> RegexMatchConfigs {
    lines
        .iter()
        .map(|line| match line.find('@') {
            Some(at) => RegexMatchConfig {
                matcher: line[..at].to_string(),
                replace: line[at + 1..].to_string(),
            },
            None => RegexMatchConfig {
                matcher: line.clone(),
                replace: String::new(),
            },
        })
        .collect()
}

/// Parses emoji `rule` preference lines of the shape `pattern,emoji`.
/// Lines without a comma are dropped.
pub fn parse_emoji_rules(lines: &[String]) -> RegexMatchConfigs {
    lines
        .iter()
        .filter_map(|line| {
            line.find(',').map(|comma| RegexMatchConfig {
                matcher: line[..comma].to_string(),
                replace: line[comma + 1..].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rename_rules() {
        let rules = parse_rename_rules(&[
            "Node@Server".to_string(),
            "\\(Premium\\)".to_string(),
        ]);
        assert_eq!(rules[0].replace, "Server");
        assert_eq!(rules[1].replace, "");

        let mut remark = "Node 01 (Premium)".to_string();
        for rule in &rules {
            rule.process(&mut remark);
        }
        assert_eq!(remark, "Server 01 ");
    }

    #[test]
    fn test_parse_emoji_rules() {
        let rules = parse_emoji_rules(&["(HK|Hong Kong),\u{1F1ED}\u{1F1F0}".to_string()]);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].matches("HK 01"));
        assert!(!rules[0].matches("US 01"));
    }
}
