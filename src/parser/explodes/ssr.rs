use serde_json::Value;

use crate::models::{Proxy, SSR_DEFAULT_GROUP, SS_CIPHERS};
use crate::parser::explodes::json_str;
use crate::parser::explodes::ss::explode_ss_conf;
use crate::utils::base64::url_safe_base64_decode;

/// Whether an SSR parameter triple degrades to plain Shadowsocks.
pub fn ssr_is_plain_ss(method: &str, protocol: &str, obfs: &str) -> bool {
    SS_CIPHERS.contains(&method)
        && (protocol.is_empty() || protocol == "origin")
        && (obfs.is_empty() || obfs == "plain")
}

/// Parse an `ssr://` link:
/// `base64(host:port:protocol:method:obfs:base64(password)/?params)`.
/// A node using a stream cipher with `origin`/`plain` is re-tagged as SS.
pub fn explode_ssr(link: &str, node: &mut Proxy) -> bool {
    if !link.starts_with("ssr://") {
        return false;
    }
    let mut decoded = url_safe_base64_decode(&link[6..]).replace('\r', "");

    let mut group = String::new();
    let mut remark = String::new();
    let mut obfs_param = String::new();
    let mut protocol_param = String::new();

    if let Some(query_pos) = decoded.find("/?") {
        let query = decoded[query_pos + 2..].to_string();
        decoded.truncate(query_pos);
        for pair in query.split('&') {
            let (key, value) = match pair.find('=') {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => continue,
            };
            let value = url_safe_base64_decode(value);
            match key {
                "group" => group = value,
                "remarks" => remark = value,
                "obfsparam" => obfs_param = value.replace(' ', ""),
                "protoparam" => protocol_param = value.replace(' ', ""),
                _ => {}
            }
        }
    }

    // the head splits on its last five colons so IPv6 hosts survive
    let mut parts: Vec<&str> = decoded.rsplitn(6, ':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts.reverse();
    let server = parts[0];
    let port = match parts[1].parse::<u16>() {
        Ok(p) if p > 0 => p,
        _ => return false,
    };
    let protocol = parts[2];
    let method = parts[3];
    let obfs = parts[4];
    let password = url_safe_base64_decode(parts[5]);

    if group.is_empty() {
        group = SSR_DEFAULT_GROUP.to_string();
    }
    if remark.is_empty() {
        remark = format!("{}:{}", server, port);
    }

    if ssr_is_plain_ss(method, protocol, obfs) {
        *node = Proxy::ss_construct(
            &group, &remark, server, port, &password, method, "", "", None, None,
        );
    } else {
        *node = Proxy::ssr_construct(
            &group,
            &remark,
            server,
            port,
            protocol,
            method,
            obfs,
            &password,
            &obfs_param,
            &protocol_param,
            None,
            None,
        );
    }
    true
}

/// Parse a ShadowsocksR GUI configuration (`configs` array) or a single
/// shadowsocksr-libev config, which degrades to the SS parser when the
/// parameters are plain.
pub fn explode_ssr_conf(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return false,
    };

    if json.get("local_address").is_some() && json.get("local_port").is_some() {
        let method = json_str(&json, "method");
        let protocol = json_str(&json, "protocol");
        let obfs = json_str(&json, "obfs");
        if ssr_is_plain_ss(&method, &protocol, &obfs) {
            return explode_ss_conf(content, nodes);
        }

        let server = json_str(&json, "server");
        let port = match json_str(&json, "server_port").parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => return false,
        };
        nodes.push(Proxy::ssr_construct(
            SSR_DEFAULT_GROUP,
            &format!("{}:{}", server, port),
            &server,
            port,
            &protocol,
            &method,
            &obfs,
            &json_str(&json, "password"),
            &json_str(&json, "obfs_param"),
            &json_str(&json, "protocol_param"),
            None,
            None,
        ));
        return true;
    }

    let configs = match json["configs"].as_array() {
        Some(configs) => configs,
        None => return false,
    };

    let before = nodes.len();
    for config in configs {
        let server = json_str(config, "server");
        let port = match json_str(config, "server_port").parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => continue,
        };
        if server.is_empty() {
            continue;
        }

        let mut group = json_str(config, "group");
        if group.is_empty() {
            group = SSR_DEFAULT_GROUP.to_string();
        }
        let mut remark = json_str(config, "remarks");
        if remark.is_empty() {
            remark = format!("{}:{}", server, port);
        }

        nodes.push(Proxy::ssr_construct(
            &group,
            &remark,
            &server,
            port,
            &json_str(config, "protocol"),
            &json_str(config, "method"),
            &json_str(config, "obfs"),
            &json_str(config, "password"),
            &json_str(config, "obfsparam"),
            &json_str(config, "protocolparam"),
            None,
            None,
        ));
    }
    nodes.len() > before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;
    use crate::utils::base64::{base64_encode, url_safe_base64_encode};

    fn make_ssr_link(
        server: &str,
        port: u16,
        protocol: &str,
        method: &str,
        obfs: &str,
        password: &str,
        query: &str,
    ) -> String {
        let head = format!(
            "{}:{}:{}:{}:{}:{}",
            server,
            port,
            protocol,
            method,
            obfs,
            url_safe_base64_encode(password)
        );
        let body = if query.is_empty() {
            head
        } else {
            format!("{}/?{}", head, query)
        };
        format!("ssr://{}", base64_encode(&body))
    }

    #[test]
    fn test_explode_ssr_full() {
        let query = format!(
            "remarks={}&group={}&obfsparam={}&protoparam={}",
            url_safe_base64_encode("My SSR"),
            url_safe_base64_encode("My Group"),
            url_safe_base64_encode("obfs.param"),
            url_safe_base64_encode("proto.param")
        );
        let link = make_ssr_link(
            "example.com",
            8443,
            "auth_aes128_md5",
            "aes-256-cfb",
            "tls1.2_ticket_auth",
            "pw",
            &query,
        );
        let mut node = Proxy::default();

        assert!(explode_ssr(&link, &mut node));
        assert_eq!(node.proxy_type, ProxyType::ShadowsocksR);
        assert_eq!(node.server, "example.com");
        assert_eq!(node.port, 8443);
        assert_eq!(node.protocol.as_deref(), Some("auth_aes128_md5"));
        assert_eq!(node.method.as_deref(), Some("aes-256-cfb"));
        assert_eq!(node.obfs.as_deref(), Some("tls1.2_ticket_auth"));
        assert_eq!(node.password.as_deref(), Some("pw"));
        assert_eq!(node.obfs_param.as_deref(), Some("obfs.param"));
        assert_eq!(node.protocol_param.as_deref(), Some("proto.param"));
        assert_eq!(node.remark, "My SSR");
        assert_eq!(node.group, "My Group");
    }

    #[test]
    fn test_explode_ssr_demotes_plain_to_ss() {
        let query = format!(
            "remarks={}&group={}",
            url_safe_base64_encode("R"),
            url_safe_base64_encode("G")
        );
        let link = make_ssr_link("h", 8443, "origin", "aes-128-gcm", "plain", "pw", &query);
        let mut node = Proxy::default();

        assert!(explode_ssr(&link, &mut node));
        assert_eq!(node.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(node.remark, "R");
        assert_eq!(node.group, "G");
    }

    #[test]
    fn test_explode_ssr_defaults() {
        let link = make_ssr_link(
            "example.com",
            8388,
            "auth_chain_a",
            "chacha20",
            "http_simple",
            "pw",
            "",
        );
        let mut node = Proxy::default();

        assert!(explode_ssr(&link, &mut node));
        assert_eq!(node.group, SSR_DEFAULT_GROUP);
        assert_eq!(node.remark, "example.com:8388");
    }

    #[test]
    fn test_explode_ssr_rejects_short_head() {
        let link = format!("ssr://{}", base64_encode("host:8388:origin"));
        let mut node = Proxy::default();
        assert!(!explode_ssr(&link, &mut node));
    }

    #[test]
    fn test_explode_ssr_conf() {
        let content = r#"{
            "serverSubscribes": [],
            "configs": [
                {"server": "a.com", "server_port": 8388, "protocol": "auth_aes128_md5",
                 "method": "aes-256-cfb", "obfs": "tls1.2_ticket_auth", "password": "p",
                 "obfsparam": "o", "protocolparam": "pp", "remarks": "A", "group": "G"}
            ]
        }"#;
        let mut nodes = Vec::new();
        assert!(explode_ssr_conf(content, &mut nodes));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].proxy_type, ProxyType::ShadowsocksR);
        assert_eq!(nodes[0].group, "G");
    }

    #[test]
    fn test_explode_ssr_conf_libev_plain_goes_ss() {
        let content = r#"{
            "server": "s.com", "server_port": 8388, "password": "pw",
            "method": "aes-128-gcm", "protocol": "origin", "obfs": "plain",
            "local_address": "127.0.0.1", "local_port": 1080
        }"#;
        let mut nodes = Vec::new();
        assert!(explode_ssr_conf(content, &mut nodes));
        assert_eq!(nodes[0].proxy_type, ProxyType::Shadowsocks);
    }
}
