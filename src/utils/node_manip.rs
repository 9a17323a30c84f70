use log::debug;

use crate::models::{ExtraSettings, Proxy};
use crate::utils::string::remove_emoji;

/// Applies the remark pipeline to every node: emoji stripping, rename
/// rules, then emoji prefixing. Runs after filtering and before emission.
pub fn preprocess_nodes(nodes: &mut [Proxy], ext: &ExtraSettings) {
    for node in nodes.iter_mut() {
        if ext.remove_emoji {
            node.remark = remove_emoji(&node.remark).trim().to_string();
        }

        node_rename(node, ext);

        if ext.add_emoji {
            for rule in &ext.emoji_array {
                if rule.replace.is_empty() {
                    continue;
                }
                if rule.matches(&node.remark) {
                    node.remark = format!("{} {}", rule.replace, node.remark);
                    break;
                }
            }
        }
    }
    debug!("Preprocessed {} nodes", nodes.len());
}

fn node_rename(node: &mut Proxy, ext: &ExtraSettings) {
    let original = node.remark.clone();
    for rule in &ext.rename_array {
        if !rule.matcher.is_empty() {
            rule.process(&mut node.remark);
        }
    }
    // renames must never leave a node unnamed
    if node.remark.is_empty() {
        node.remark = original;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_emoji_rules, parse_rename_rules};

    fn node_with_remark(remark: &str) -> Proxy {
        Proxy {
            remark: remark.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_remove_then_add_emoji() {
        let mut nodes = vec![node_with_remark("\u{1F1FA}\u{1F1F8} HK 01")];
        let ext = ExtraSettings {
            remove_emoji: true,
            add_emoji: true,
            emoji_array: parse_emoji_rules(&["HK,\u{1F1ED}\u{1F1F0}".to_string()]),
            ..Default::default()
        };
        preprocess_nodes(&mut nodes, &ext);
        assert_eq!(nodes[0].remark, "\u{1F1ED}\u{1F1F0} HK 01");
    }

    #[test]
    fn test_rename_applies_in_order() {
        let mut nodes = vec![node_with_remark("IPLC Node 01")];
        let ext = ExtraSettings {
            rename_array: parse_rename_rules(&[
                "IPLC ".to_string(),
                "Node@Svr".to_string(),
            ]),
            ..Default::default()
        };
        preprocess_nodes(&mut nodes, &ext);
        assert_eq!(nodes[0].remark, "Svr 01");
    }

    #[test]
    fn test_rename_to_empty_restores_original() {
        let mut nodes = vec![node_with_remark("HK")];
        let ext = ExtraSettings {
            rename_array: parse_rename_rules(&["HK".to_string()]),
            ..Default::default()
        };
        preprocess_nodes(&mut nodes, &ext);
        assert_eq!(nodes[0].remark, "HK");
    }

    #[test]
    fn test_first_matching_emoji_wins() {
        let mut nodes = vec![node_with_remark("HK IPLC")];
        let ext = ExtraSettings {
            add_emoji: true,
            emoji_array: parse_emoji_rules(&[
                "IPLC,\u{2708}".to_string(),
                "HK,\u{1F1ED}\u{1F1F0}".to_string(),
            ]),
            ..Default::default()
        };
        preprocess_nodes(&mut nodes, &ext);
        assert_eq!(nodes[0].remark, "\u{2708} HK IPLC");
    }
}
