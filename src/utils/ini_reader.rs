//! Order-preserving INI reader/writer.
//!
//! Keeps sections in file order and items in insertion order, allows
//! duplicate keys within a section, and can store free-form lines (needed
//! for Surge/Quantumult documents whose sections are not strictly
//! `key = value`).

use std::collections::{HashMap, HashSet};

use thiserror::Error;

/// Marker key for items that are raw lines rather than `key = value` pairs.
pub const NONAME: &str = "{NONAME}";

#[derive(Debug, Error)]
pub enum IniReaderError {
    #[error("empty document")]
    Empty,
    #[error("section '{0}' does not exist")]
    SectionNotFound(String),
}

pub struct IniReader {
    /// section name -> ordered (key, value) items
    content: HashMap<String, Vec<(String, String)>>,
    section_order: Vec<String>,
    current_section: String,
    include_sections: HashSet<String>,
    direct_save_sections: HashSet<String>,
    isolated_items_section: String,
    /// Store lines that are not `key = value` as raw [`NONAME`] items.
    pub store_any_line: bool,
    /// Store lines appearing before the first section header.
    pub store_isolated_line: bool,
}

impl Default for IniReader {
    fn default() -> Self {
        Self::new()
    }
}

impl IniReader {
    pub fn new() -> Self {
        IniReader {
            content: HashMap::new(),
            section_order: Vec::new(),
            current_section: String::new(),
            include_sections: HashSet::new(),
            direct_save_sections: HashSet::new(),
            isolated_items_section: String::new(),
            store_any_line: false,
            store_isolated_line: false,
        }
    }

    /// Restricts parsing to the given section; others are discarded.
    pub fn include_section(&mut self, section: &str) {
        self.include_sections.insert(section.to_string());
    }

    /// Marks a section whose lines are stored verbatim.
    pub fn add_direct_save_section(&mut self, section: &str) {
        self.direct_save_sections.insert(section.to_string());
    }

    pub fn set_isolated_items_section(&mut self, section: &str) {
        self.isolated_items_section = section.to_string();
    }

    fn section_included(&self, section: &str) -> bool {
        self.include_sections.is_empty() || self.include_sections.contains(section)
    }

    fn ensure_section(&mut self, section: &str) {
        if !self.content.contains_key(section) {
            self.content.insert(section.to_string(), Vec::new());
            self.section_order.push(section.to_string());
        }
    }

    pub fn parse(&mut self, document: &str) -> Result<(), IniReaderError> {
        if document.trim().is_empty() {
            return Err(IniReaderError::Empty);
        }

        let mut in_section = if self.store_isolated_line && !self.isolated_items_section.is_empty()
        {
            self.isolated_items_section.clone()
        } else {
            String::new()
        };
        if !in_section.is_empty() && self.section_included(&in_section) {
            self.ensure_section(&in_section.clone());
        }

        for raw_line in document.lines() {
            let line = raw_line.trim_end_matches('\r').trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                in_section = line[1..line.len() - 1].to_string();
                if self.section_included(&in_section) {
                    self.ensure_section(&in_section.clone());
                }
                continue;
            }

            if in_section.is_empty() || !self.section_included(&in_section) {
                continue;
            }

            let item = if self.direct_save_sections.contains(&in_section) {
                (NONAME.to_string(), line.to_string())
            } else if let Some(eq) = line.find('=') {
                (
                    line[..eq].trim().to_string(),
                    line[eq + 1..].trim().to_string(),
                )
            } else if self.store_any_line {
                (NONAME.to_string(), line.to_string())
            } else {
                continue;
            };

            if let Some(items) = self.content.get_mut(&in_section) {
                items.push(item);
            }
        }

        if self.content.is_empty() {
            return Err(IniReaderError::Empty);
        }
        Ok(())
    }

    pub fn section_exist(&self, section: &str) -> bool {
        self.content.contains_key(section)
    }

    /// Moves the cursor to an existing section.
    pub fn enter_section(&mut self, section: &str) -> Result<(), IniReaderError> {
        if !self.section_exist(section) {
            return Err(IniReaderError::SectionNotFound(section.to_string()));
        }
        self.current_section = section.to_string();
        Ok(())
    }

    /// Moves the cursor, creating the section on first write.
    pub fn set_current_section(&mut self, section: &str) {
        self.current_section = section.to_string();
    }

    pub fn get_items(&self, section: &str) -> Vec<(String, String)> {
        self.content.get(section).cloned().unwrap_or_default()
    }

    /// First value stored under `key` in the current section.
    pub fn get(&self, key: &str) -> String {
        self.content
            .get(&self.current_section)
            .and_then(|items| items.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key).as_str(), "true" | "1")
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).parse().unwrap_or(0)
    }

    pub fn item_exist(&self, key: &str) -> bool {
        self.content
            .get(&self.current_section)
            .map(|items| items.iter().any(|(k, _)| k == key))
            .unwrap_or(false)
    }

    pub fn item_prefix_exist(&self, prefix: &str) -> bool {
        self.content
            .get(&self.current_section)
            .map(|items| items.iter().any(|(k, _)| k.starts_with(prefix)))
            .unwrap_or(false)
    }

    /// Values of every item in the current section whose key starts with
    /// `prefix`, in document order.
    pub fn get_all(&self, prefix: &str) -> Vec<String> {
        self.content
            .get(&self.current_section)
            .map(|items| {
                items
                    .iter()
                    .filter(|(k, _)| k.starts_with(prefix))
                    .map(|(_, v)| v.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Appends a `key = value` item to the current section.
    pub fn set(&mut self, key: &str, value: &str) {
        let section = self.current_section.clone();
        self.ensure_section(&section);
        if let Some(items) = self.content.get_mut(&section) {
            items.push((key.to_string(), value.to_string()));
        }
    }

    /// Appends a raw line to the current section.
    pub fn set_unnamed(&mut self, line: &str) {
        self.set(NONAME, line);
    }

    /// Clears all items of the current section, keeping its position.
    pub fn erase_section(&mut self) {
        let section = self.current_section.clone();
        self.ensure_section(&section);
        if let Some(items) = self.content.get_mut(&section) {
            items.clear();
        }
    }

    pub fn remove_section(&mut self, section: &str) {
        self.content.remove(section);
        self.section_order.retain(|s| s != section);
    }

    /// Serializes the document, keeping section order.
    pub fn to_string(&self) -> String {
        let mut output = String::new();
        for section in &self.section_order {
            output.push_str(&format!("[{}]\n", section));
            if let Some(items) = self.content.get(section) {
                for (key, value) in items {
                    if key == NONAME {
                        output.push_str(value);
                    } else if value.is_empty() {
                        output.push_str(key);
                    } else {
                        output.push_str(&format!("{} = {}", key, value));
                    }
                    output.push('\n');
                }
            }
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[General]
loglevel = notify

[Proxy]
Node A = ss, example.com, 8388, encrypt-method=aes-128-gcm, password=pass
DIRECT = direct

[Rule]
DOMAIN,example.com,DIRECT
";

    #[test]
    fn test_parse_sections_in_order() {
        let mut ini = IniReader::new();
        ini.store_any_line = true;
        ini.parse(SAMPLE).unwrap();
        assert!(ini.section_exist("General"));
        assert!(ini.section_exist("Proxy"));
        assert_eq!(ini.get_items("Proxy").len(), 2);
        let out = ini.to_string();
        let general = out.find("[General]").unwrap();
        let proxy = out.find("[Proxy]").unwrap();
        let rule = out.find("[Rule]").unwrap();
        assert!(general < proxy && proxy < rule);
    }

    #[test]
    fn test_store_any_line() {
        let mut ini = IniReader::new();
        ini.store_any_line = true;
        ini.parse(SAMPLE).unwrap();
        let rules = ini.get_items("Rule");
        assert_eq!(rules[0].0, NONAME);
        assert_eq!(rules[0].1, "DOMAIN,example.com,DIRECT");
    }

    #[test]
    fn test_include_section_filter() {
        let mut ini = IniReader::new();
        ini.include_section("Proxy");
        ini.parse(SAMPLE).unwrap();
        assert!(ini.section_exist("Proxy"));
        assert!(!ini.section_exist("General"));
    }

    #[test]
    fn test_isolated_lines() {
        let mut ini = IniReader::new();
        ini.store_any_line = true;
        ini.store_isolated_line = true;
        ini.set_isolated_items_section("Proxy");
        ini.parse("Node = ss, a.com, 1234\n[Other]\nx = y\n").unwrap();
        assert_eq!(ini.get_items("Proxy")[0].0, "Node");
    }

    #[test]
    fn test_erase_and_set() {
        let mut ini = IniReader::new();
        ini.store_any_line = true;
        ini.parse(SAMPLE).unwrap();
        ini.set_current_section("Proxy");
        ini.erase_section();
        ini.set("Node B", "socks5, example.org, 1080");
        assert_eq!(ini.get_items("Proxy").len(), 1);
        assert_eq!(ini.get("Node B"), "socks5, example.org, 1080");
    }

    #[test]
    fn test_multi_value_prefix() {
        let mut ini = IniReader::new();
        ini.parse(
            "[ruleset]\nsurge_ruleset=Proxy,rules/a.list\nsurge_ruleset=Ad,rules/b.list\n",
        )
        .unwrap();
        ini.set_current_section("ruleset");
        assert_eq!(ini.get_all("surge_ruleset").len(), 2);
    }
}
