use serde_json::json;

use crate::models::{ExtraSettings, Proxy, ProxyType, SS_CIPHERS};
use crate::utils::base64::base64_encode;

/// Render the SSD subscription envelope: a base64 JSON document carrying
/// airport-level defaults and one entry per representable server. SSR
/// nodes are included only when they degrade to plain Shadowsocks.
pub fn proxy_to_ssd(nodes: &[Proxy], group: &str, ext: &ExtraSettings) -> String {
    let group = if group.is_empty() { "SSD" } else { group };

    let mut servers = Vec::new();
    let mut index = 0;
    for node in nodes {
        let mut remark = node.remark.clone();
        if ext.append_proxy_type {
            remark = format!("[{}] {}", node.proxy_type.as_str(), remark);
        }
        let method = node.method.as_deref().unwrap_or("");

        match node.proxy_type {
            ProxyType::Shadowsocks => {
                servers.push(json!({
                    "server": node.server,
                    "port": node.port,
                    "encryption": method,
                    "password": node.password.as_deref().unwrap_or(""),
                    "plugin": node.plugin.as_deref().unwrap_or(""),
                    "plugin_options": node.plugin_opts_str(),
                    "remarks": remark,
                    "id": index,
                }));
            }
            ProxyType::ShadowsocksR => {
                if !(SS_CIPHERS.contains(&method)
                    && node.protocol.as_deref() == Some("origin")
                    && node.obfs.as_deref() == Some("plain"))
                {
                    continue;
                }
                servers.push(json!({
                    "server": node.server,
                    "port": node.port,
                    "encryption": method,
                    "password": node.password.as_deref().unwrap_or(""),
                    "remarks": remark,
                    "id": index,
                }));
            }
            _ => continue,
        }
        index += 1;
    }

    let envelope = json!({
        "airport": group,
        "port": 1,
        "encryption": "aes-128-gcm",
        "password": "password",
        "servers": servers,
    });

    format!("ssd://{}", base64_encode(&envelope.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SSR_DEFAULT_GROUP, SS_DEFAULT_GROUP};
    use crate::parser::explodes::explode_ssd;

    #[test]
    fn test_ssd_roundtrip() {
        let nodes = vec![
            Proxy::ss_construct(
                SS_DEFAULT_GROUP,
                "A",
                "a.com",
                8388,
                "p1",
                "aes-128-gcm",
                "simple-obfs",
                "obfs=http;obfs-host=h.com",
                None,
                None,
            ),
            Proxy::ss_construct(
                SS_DEFAULT_GROUP,
                "B",
                "b.com",
                8389,
                "p2",
                "chacha20-ietf-poly1305",
                "",
                "",
                None,
                None,
            ),
        ];
        let output = proxy_to_ssd(&nodes, "Air", &ExtraSettings::default());
        assert!(output.starts_with("ssd://"));

        let mut parsed = Vec::new();
        assert!(explode_ssd(&output, &mut parsed));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].group, "Air");
        assert_eq!(parsed[0].server, "a.com");
        assert_eq!(parsed[0].port, 8388);
        assert_eq!(parsed[0].password.as_deref(), Some("p1"));
        assert_eq!(parsed[0].plugin.as_deref(), Some("simple-obfs"));
        assert_eq!(parsed[0].plugin_opts_str(), "obfs=http;obfs-host=h.com");
        assert_eq!(parsed[1].server, "b.com");
    }

    #[test]
    fn test_ssd_demotable_ssr_included() {
        let nodes = vec![
            Proxy::ssr_construct(
                SSR_DEFAULT_GROUP,
                "plain",
                "p.com",
                8443,
                "origin",
                "aes-128-gcm",
                "plain",
                "pw",
                "",
                "",
                None,
                None,
            ),
            Proxy::ssr_construct(
                SSR_DEFAULT_GROUP,
                "real",
                "r.com",
                8444,
                "auth_aes128_md5",
                "chacha20",
                "http_simple",
                "pw",
                "",
                "",
                None,
                None,
            ),
        ];
        let output = proxy_to_ssd(&nodes, "", &ExtraSettings::default());
        let mut parsed = Vec::new();
        assert!(explode_ssd(&output, &mut parsed));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].server, "p.com");
        assert_eq!(parsed[0].group, "SSD");
    }
}
