//! Ruleset normalization for the rule-aware dialects.

use log::warn;
use serde_yaml::Value as YamlValue;

use crate::models::RulesetContent;
use crate::utils::ini_reader::IniReader;

/// Rule types Clash cannot evaluate; lines starting with these are
/// dropped on emission.
const CLASH_UNSUPPORTED: [&str; 3] = ["USER-AGENT", "URL-REGEX", "PROCESS-NAME"];

/// Normalizes one ruleset body into per-line rules with the group name
/// appended. `for_clash` additionally drops rule types Clash does not
/// support and strips the modifiers it rejects.
fn normalize_ruleset(ruleset: &RulesetContent, for_clash: bool, out: &mut Vec<String>) {
    let body = &ruleset.rule_content;
    if body.is_empty() {
        warn!(
            "Failed to fetch ruleset or ruleset is empty: '{}'!",
            ruleset.rule_path
        );
        return;
    }

    if let Some(inline) = body.strip_prefix("[]") {
        let mut line = inline.to_string();
        if for_clash && line.starts_with("FINAL") {
            line = line.replacen("FINAL", "MATCH", 1);
        }
        out.push(format!("{},{}", line, ruleset.group));
        return;
    }

    // bodies with a single LF (or none) are split on CR instead
    let delimiter = if body.matches('\n').count() <= 1 {
        '\r'
    } else {
        '\n'
    };

    for raw_line in body.split(delimiter) {
        let mut line = raw_line.replace('\r', "").trim().to_string();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if for_clash {
            if CLASH_UNSUPPORTED
                .iter()
                .any(|unsupported| line.starts_with(unsupported))
            {
                continue;
            }
            if line.starts_with("IP-CIDR") {
                line = line.replace(",no-resolve", "");
            } else if line.starts_with("DOMAIN-SUFFIX") {
                line = line.replace(",force-remote-dns", "");
            }
        }
        out.push(format!("{},{}", line, ruleset.group));
    }
}

/// Merges the rulesets into the `Rule` sequence of a Clash YAML document.
/// When `overwrite` is false the base document's own rules stay in front.
pub fn ruleset_to_clash(base: &mut YamlValue, rulesets: &[RulesetContent], overwrite: bool) {
    let mut rules: Vec<String> = Vec::new();
    if !overwrite {
        if let Some(existing) = base.get("Rule").and_then(YamlValue::as_sequence) {
            for rule in existing {
                if let Some(rule) = rule.as_str() {
                    rules.push(rule.to_string());
                }
            }
        }
    }

    for ruleset in rulesets {
        normalize_ruleset(ruleset, true, &mut rules);
    }

    if let Some(mapping) = base.as_mapping_mut() {
        mapping.insert(
            YamlValue::String("Rule".to_string()),
            YamlValue::Sequence(rules.into_iter().map(YamlValue::String).collect()),
        );
    }
}

/// Merges the rulesets into an INI rule section (`Rule` for Surge and
/// Surfboard, `RoutingRule` for Mellow).
pub fn ruleset_to_ini(
    ini: &mut IniReader,
    section: &str,
    rulesets: &[RulesetContent],
    overwrite: bool,
) {
    ini.set_current_section(section);
    if overwrite {
        ini.erase_section();
    }

    let mut rules = Vec::new();
    for ruleset in rulesets {
        normalize_ruleset(ruleset, false, &mut rules);
    }
    for rule in rules {
        ini.set_unnamed(&rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset(group: &str, path: &str, content: &str) -> RulesetContent {
        RulesetContent::new(group, path, content)
    }

    #[test]
    fn test_inline_rule() {
        let mut rules = Vec::new();
        normalize_ruleset(
            &ruleset("Direct", "", "[]GEOIP,CN,DIRECT"),
            true,
            &mut rules,
        );
        assert_eq!(rules, vec!["GEOIP,CN,DIRECT,Direct"]);
    }

    #[test]
    fn test_inline_final_becomes_match_for_clash() {
        let mut rules = Vec::new();
        normalize_ruleset(&ruleset("Proxy", "", "[]FINAL"), true, &mut rules);
        assert_eq!(rules, vec!["MATCH,Proxy"]);
    }

    #[test]
    fn test_body_normalization_for_clash() {
        let body = "DOMAIN-SUFFIX,ads.example,force-remote-dns\n#comment\n;other\nUSER-AGENT,foo\nIP-CIDR,10.0.0.0/8,no-resolve\n\n";
        let mut rules = Vec::new();
        normalize_ruleset(&ruleset("Ad", "https://x", body), true, &mut rules);
        assert_eq!(
            rules,
            vec!["DOMAIN-SUFFIX,ads.example,Ad", "IP-CIDR,10.0.0.0/8,Ad"]
        );
    }

    #[test]
    fn test_surge_keeps_user_agent_rules() {
        let body = "USER-AGENT,MicroMessenger,DIRECT\nDOMAIN,a.com\n";
        let mut rules = Vec::new();
        normalize_ruleset(&ruleset("G", "p", body), false, &mut rules);
        assert_eq!(
            rules,
            vec!["USER-AGENT,MicroMessenger,DIRECT,G", "DOMAIN,a.com,G"]
        );
    }

    #[test]
    fn test_cr_only_body() {
        let body = "DOMAIN,a.com\rDOMAIN,b.com";
        let mut rules = Vec::new();
        normalize_ruleset(&ruleset("G", "p", body), true, &mut rules);
        assert_eq!(rules, vec!["DOMAIN,a.com,G", "DOMAIN,b.com,G"]);
    }

    #[test]
    fn test_ruleset_to_clash_overwrite() {
        let mut base: YamlValue =
            serde_yaml::from_str("Rule:\n  - 'DOMAIN,old.com,DIRECT'\n").unwrap();
        ruleset_to_clash(
            &mut base,
            &[
                ruleset("Proxy", "", "[]DOMAIN,example.com,DIRECT"),
                ruleset("Ad", "https://x", "DOMAIN-SUFFIX,ads.example\n#comment\n"),
            ],
            true,
        );
        let rules: Vec<String> = base["Rule"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            rules,
            vec!["DOMAIN,example.com,DIRECT,Proxy", "DOMAIN-SUFFIX,ads.example,Ad"]
        );
    }

    #[test]
    fn test_ruleset_to_clash_append_keeps_existing() {
        let mut base: YamlValue =
            serde_yaml::from_str("Rule:\n  - 'DOMAIN,old.com,DIRECT'\n").unwrap();
        ruleset_to_clash(&mut base, &[ruleset("G", "", "[]GEOIP,CN,DIRECT")], false);
        let rules = base["Rule"].as_sequence().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].as_str().unwrap(), "DOMAIN,old.com,DIRECT");
    }
}
