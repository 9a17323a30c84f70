/// One `surge_ruleset` preference entry: a target group and the rule
/// source (a `[]` inline rule, a local file, or a URL).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesetConfig {
    pub group: String,
    pub url: String,
}

pub type RulesetConfigs = Vec<RulesetConfig>;

impl RulesetConfig {
    /// Parses a `group,source` line. The source may itself contain commas,
    /// so only the first comma splits.
    pub fn from_line(line: &str) -> Option<Self> {
        let comma = line.find(',')?;
        Some(RulesetConfig {
            group: line[..comma].trim().to_string(),
            url: line[comma + 1..].trim().to_string(),
        })
    }
}

/// A fetched ruleset ready for emission.
#[derive(Debug, Clone, Default)]
pub struct RulesetContent {
    pub group: String,
    /// Source path or URL; empty for inline `[]` rules.
    pub rule_path: String,
    pub rule_content: String,
}

impl RulesetContent {
    pub fn new(group: &str, rule_path: &str, rule_content: &str) -> Self {
        RulesetContent {
            group: group.to_string(),
            rule_path: rule_path.to_string(),
            rule_content: rule_content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_splits_on_first_comma() {
        let config = RulesetConfig::from_line("Direct,[]GEOIP,CN,DIRECT").unwrap();
        assert_eq!(config.group, "Direct");
        assert_eq!(config.url, "[]GEOIP,CN,DIRECT");
    }

    #[test]
    fn test_from_line_without_comma() {
        assert!(RulesetConfig::from_line("no-comma-here").is_none());
    }
}
