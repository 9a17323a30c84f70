use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::{Proxy, SS_DEFAULT_GROUP};
use crate::parser::explodes::json_str;
use crate::utils::base64::url_safe_base64_decode;
use crate::utils::url::url_decode;

lazy_static! {
    static ref SS_LEGACY: Regex = Regex::new(r"^(.*?):(.*?)@(.*):(.*)$").expect("static pattern");
}

/// Parse an `ss://` link. Prefers the SIP002 shape
/// `ss://base64(method:password)@host:port` and falls back to the legacy
/// fully-encoded `ss://base64(method:password@host:port)`.
pub fn explode_ss(link: &str, node: &mut Proxy) -> bool {
    if !link.starts_with("ss://") {
        return false;
    }
    let mut body = link[5..].replace('\r', "").replace("/?", "?");

    let mut remark = String::new();
    if let Some(hash) = body.find('#') {
        remark = url_decode(&body[hash + 1..]);
        body.truncate(hash);
    }

    let mut plugin = String::new();
    let mut plugin_opts = String::new();
    let mut group = SS_DEFAULT_GROUP.to_string();
    if let Some(question) = body.find('?') {
        let addition = body[question + 1..].to_string();
        body.truncate(question);
        for (key, value) in url::form_urlencoded::parse(addition.as_bytes()) {
            match key.as_ref() {
                "plugin" => {
                    let plugins = url_decode(&value);
                    match plugins.find(';') {
                        Some(semicolon) => {
                            plugin = plugins[..semicolon].to_string();
                            plugin_opts = plugins[semicolon + 1..].to_string();
                        }
                        None => plugin = plugins,
                    }
                }
                "group" => {
                    if !value.is_empty() {
                        group = url_safe_base64_decode(&value);
                    }
                }
                _ => {}
            }
        }
    }

    let (method, password, server, port_str) = if let Some(at) = body.find('@') {
        let secret = url_safe_base64_decode(&body[..at]);
        let colon = match secret.find(':') {
            Some(pos) => pos,
            None => return false,
        };
        let server_port = &body[at + 1..];
        let port_sep = match server_port.rfind(':') {
            Some(pos) => pos,
            None => return false,
        };
        (
            secret[..colon].to_string(),
            secret[colon + 1..].to_string(),
            server_port[..port_sep].to_string(),
            server_port[port_sep + 1..].to_string(),
        )
    } else {
        let decoded = url_safe_base64_decode(&body);
        let caps = match SS_LEGACY.captures(&decoded) {
            Some(caps) => caps,
            None => return false,
        };
        (
            caps[1].to_string(),
            caps[2].to_string(),
            caps[3].to_string(),
            caps[4].to_string(),
        )
    };

    let port = match port_str.parse::<u16>() {
        Ok(p) if p > 0 => p,
        _ => return false,
    };
    if remark.is_empty() {
        remark = format!("{}:{}", server, port);
    }

    *node = Proxy::ss_construct(
        &group,
        &remark,
        &server,
        port,
        &password,
        &method,
        &plugin,
        &plugin_opts,
        None,
        None,
    );
    true
}

/// Parse an `ssd://` subscription: a base64 JSON envelope whose top-level
/// fields default every server entry.
pub fn explode_ssd(link: &str, nodes: &mut Vec<Proxy>) -> bool {
    if !link.starts_with("ssd://") {
        return false;
    }
    let decoded = url_safe_base64_decode(link[6..].trim());
    let json: Value = match serde_json::from_str(&decoded) {
        Ok(json) => json,
        Err(_) => return false,
    };

    let servers = match json["servers"].as_array() {
        Some(servers) => servers,
        None => return false,
    };

    let group = json_str(&json, "airport");
    let default_port = json_str(&json, "port");
    let default_method = json_str(&json, "encryption");
    let default_password = json_str(&json, "password");
    let default_plugin = json_str(&json, "plugin");
    let default_plugin_opts = json_str(&json, "plugin_options");

    let before = nodes.len();
    for server in servers {
        let host = json_str(server, "server");
        if host.is_empty() {
            continue;
        }
        let port_str = {
            let own = json_str(server, "port");
            if own.is_empty() {
                default_port.clone()
            } else {
                own
            }
        };
        let port = match port_str.parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => continue,
        };
        let pick = |key: &str, default: &str| {
            let own = json_str(server, key);
            if own.is_empty() {
                default.to_string()
            } else {
                own
            }
        };
        let method = pick("encryption", &default_method);
        let password = pick("password", &default_password);
        let plugin = pick("plugin", &default_plugin);
        let plugin_opts = pick("plugin_options", &default_plugin_opts);
        let mut remark = json_str(server, "remarks");
        if remark.is_empty() {
            remark = format!("{}:{}", host, port);
        }

        nodes.push(Proxy::ss_construct(
            &group,
            &remark,
            &host,
            port,
            &password,
            &method,
            &plugin,
            &plugin_opts,
            None,
            None,
        ));
    }

    nodes.len() > before
}

/// Parse the Android Shadowsocks profile export, a bare JSON array of
/// server entries.
pub fn explode_ss_android(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return false,
    };
    let entries = match json.as_array() {
        Some(entries) => entries,
        None => return false,
    };

    let before = nodes.len();
    for entry in entries {
        push_ss_entry(entry, nodes);
    }
    nodes.len() > before
}

/// Parse the Windows Shadowsocks GUI configuration (`configs` array), a
/// `servers` list, or a single shadowsocks-libev config.
pub fn explode_ss_conf(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return false,
    };

    // single libev config
    if json.get("local_address").is_some() && json.get("local_port").is_some() {
        return push_ss_entry(&json, nodes);
    }

    let entries = json["configs"]
        .as_array()
        .or_else(|| json["servers"].as_array());
    let entries = match entries {
        Some(entries) => entries,
        None => return false,
    };

    let before = nodes.len();
    for entry in entries {
        push_ss_entry(entry, nodes);
    }
    nodes.len() > before
}

fn push_ss_entry(entry: &Value, nodes: &mut Vec<Proxy>) -> bool {
    let server = json_str(entry, "server");
    let port = match json_str(entry, "server_port").parse::<u16>() {
        Ok(p) if p > 0 => p,
        _ => return false,
    };
    if server.is_empty() {
        return false;
    }

    let mut remark = json_str(entry, "remarks");
    if remark.is_empty() {
        remark = json_str(entry, "name");
    }
    if remark.is_empty() {
        remark = format!("{}:{}", server, port);
    }

    nodes.push(Proxy::ss_construct(
        SS_DEFAULT_GROUP,
        &remark,
        &server,
        port,
        &json_str(entry, "password"),
        &json_str(entry, "method"),
        &json_str(entry, "plugin"),
        &json_str(entry, "plugin_opts"),
        None,
        None,
    ));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_explode_ss_sip002() {
        let mut node = Proxy::default();
        assert!(explode_ss(
            "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388#name",
            &mut node
        ));
        assert_eq!(node.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(node.server, "1.1.1.1");
        assert_eq!(node.port, 8388);
        assert_eq!(node.method.as_deref(), Some("aes-128-gcm"));
        assert_eq!(node.password.as_deref(), Some("pass"));
        assert_eq!(node.remark, "name");
    }

    #[test]
    fn test_explode_ss_legacy() {
        let link = format!(
            "ss://{}#legacy",
            base64_encode("aes-256-cfb:secret@example.com:443")
        );
        let mut node = Proxy::default();
        assert!(explode_ss(&link, &mut node));
        assert_eq!(node.server, "example.com");
        assert_eq!(node.port, 443);
        assert_eq!(node.method.as_deref(), Some("aes-256-cfb"));
        assert_eq!(node.password.as_deref(), Some("secret"));
        assert_eq!(node.remark, "legacy");
    }

    #[test]
    fn test_explode_ss_with_plugin() {
        let link = "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388/?plugin=obfs-local%3Bobfs%3Dhttp%3Bobfs-host%3Dex.com#p";
        let mut node = Proxy::default();
        assert!(explode_ss(link, &mut node));
        assert_eq!(node.plugin.as_deref(), Some("simple-obfs"));
        assert_eq!(node.plugin_opts_str(), "obfs=http;obfs-host=ex.com");
    }

    #[test]
    fn test_explode_ss_default_remark() {
        let mut node = Proxy::default();
        assert!(explode_ss(
            "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388",
            &mut node
        ));
        assert_eq!(node.remark, "1.1.1.1:8388");
    }

    #[test]
    fn test_explode_ss_rejects_bad_port() {
        let mut node = Proxy::default();
        assert!(!explode_ss(
            "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:0",
            &mut node
        ));
        assert!(!explode_ss(
            "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:notaport",
            &mut node
        ));
    }

    #[test]
    fn test_explode_ssd() {
        let envelope = r#"{
            "airport": "Air",
            "port": 443,
            "encryption": "aes-128-gcm",
            "password": "shared",
            "servers": [
                {"server": "a.example.com", "remarks": "A"},
                {"server": "b.example.com", "port": 8443, "password": "own", "remarks": "B"}
            ]
        }"#;
        let link = format!("ssd://{}", base64_encode(envelope));
        let mut nodes = Vec::new();

        assert!(explode_ssd(&link, &mut nodes));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].group, "Air");
        assert_eq!(nodes[0].port, 443);
        assert_eq!(nodes[0].password.as_deref(), Some("shared"));
        assert_eq!(nodes[1].port, 8443);
        assert_eq!(nodes[1].password.as_deref(), Some("own"));
    }

    #[test]
    fn test_explode_ss_conf_windows() {
        let content = r#"{
            "version": "4.1.6",
            "configs": [
                {"server": "a.com", "server_port": 8388, "password": "p1",
                 "method": "aes-256-gcm", "remarks": "A", "plugin": "", "plugin_opts": ""},
                {"server": "", "server_port": 8388, "password": "skip", "method": "m"}
            ]
        }"#;
        let mut nodes = Vec::new();
        assert!(explode_ss_conf(content, &mut nodes));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].remark, "A");
    }

    #[test]
    fn test_explode_ss_conf_libev_single() {
        let content = r#"{
            "server": "s.com", "server_port": 8388, "password": "pw",
            "method": "chacha20-ietf-poly1305",
            "local_address": "127.0.0.1", "local_port": 1080
        }"#;
        let mut nodes = Vec::new();
        assert!(explode_ss_conf(content, &mut nodes));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].remark, "s.com:8388");
    }
}
