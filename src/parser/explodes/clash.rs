use serde_yaml::Value;

use crate::models::{
    normalize_ss_cipher, Proxy, SOCKS_DEFAULT_GROUP, SSR_DEFAULT_GROUP, SS_DEFAULT_GROUP,
    V2RAY_DEFAULT_GROUP,
};
use crate::parser::explodes::ssr::ssr_is_plain_ss;

fn yaml_str(entry: &Value, key: &str) -> String {
    match entry.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn yaml_bool(entry: &Value, key: &str) -> bool {
    match entry.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Parse a Clash configuration document. Accepts both the classic
/// `Proxy:` key and the newer `proxies:` key.
pub fn explode_clash(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let yaml: Value = match serde_yaml::from_str(content) {
        Ok(yaml) => yaml,
        Err(_) => return false,
    };
    let proxies = match yaml
        .get("Proxy")
        .or_else(|| yaml.get("proxies"))
        .and_then(Value::as_sequence)
    {
        Some(proxies) => proxies,
        None => return false,
    };

    let before = nodes.len();
    for entry in proxies {
        let kind = yaml_str(entry, "type");
        let name = yaml_str(entry, "name");
        let server = yaml_str(entry, "server");
        let port = match yaml_str(entry, "port").parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => continue,
        };
        if server.is_empty() {
            continue;
        }
        let remark = if name.is_empty() {
            format!("{}:{}", server, port)
        } else {
            name
        };

        let node = match kind.as_str() {
            "vmess" => {
                let net = {
                    let net = yaml_str(entry, "network");
                    if net.is_empty() {
                        "tcp".to_string()
                    } else {
                        net
                    }
                };
                let path = yaml_str(entry, "ws-path");
                let host = entry
                    .get("ws-headers")
                    .map(|headers| yaml_str(headers, "Host"))
                    .unwrap_or_default();
                Proxy::vmess_construct(
                    V2RAY_DEFAULT_GROUP,
                    &remark,
                    &server,
                    port,
                    "",
                    &yaml_str(entry, "uuid"),
                    yaml_str(entry, "alterId").parse().unwrap_or(0),
                    &net,
                    &yaml_str(entry, "cipher"),
                    &path,
                    &host,
                    yaml_bool(entry, "tls"),
                    None,
                    None,
                )
            }
            "ss" => {
                let cipher = normalize_ss_cipher(&yaml_str(entry, "cipher"));
                let mut plugin = String::new();
                let mut opts_mode = String::new();
                let mut opts_host = String::new();
                if entry.get("plugin").is_some() {
                    plugin = yaml_str(entry, "plugin");
                    if let Some(opts) = entry.get("plugin-opts") {
                        opts_mode = yaml_str(opts, "mode");
                        opts_host = yaml_str(opts, "host");
                    }
                    // clash spells simple-obfs as "obfs"
                    if plugin == "obfs" {
                        plugin = "simple-obfs".to_string();
                    }
                } else if entry.get("obfs").is_some() {
                    plugin = "simple-obfs".to_string();
                    opts_mode = yaml_str(entry, "obfs");
                    opts_host = yaml_str(entry, "obfs-host");
                }
                let plugin_opts = if plugin.is_empty() {
                    String::new()
                } else if opts_host.is_empty() {
                    format!("obfs={}", opts_mode)
                } else {
                    format!("obfs={};obfs-host={}", opts_mode, opts_host)
                };
                Proxy::ss_construct(
                    SS_DEFAULT_GROUP,
                    &remark,
                    &server,
                    port,
                    &yaml_str(entry, "password"),
                    &cipher,
                    &plugin,
                    &plugin_opts,
                    None,
                    None,
                )
            }
            "ssr" => {
                let method = yaml_str(entry, "cipher");
                let protocol = yaml_str(entry, "protocol");
                let obfs = yaml_str(entry, "obfs");
                if ssr_is_plain_ss(&method, &protocol, &obfs) {
                    Proxy::ss_construct(
                        SS_DEFAULT_GROUP,
                        &remark,
                        &server,
                        port,
                        &yaml_str(entry, "password"),
                        &method,
                        "",
                        "",
                        None,
                        None,
                    )
                } else {
                    Proxy::ssr_construct(
                        SSR_DEFAULT_GROUP,
                        &remark,
                        &server,
                        port,
                        &protocol,
                        &method,
                        &obfs,
                        &yaml_str(entry, "password"),
                        &yaml_str(entry, "obfsparam"),
                        &yaml_str(entry, "protocolparam"),
                        None,
                        None,
                    )
                }
            }
            "socks" => Proxy::socks_construct(
                SOCKS_DEFAULT_GROUP,
                &remark,
                &server,
                port,
                &yaml_str(entry, "username"),
                &yaml_str(entry, "password"),
                None,
                None,
            ),
            "http" => Proxy::http_construct(
                crate::models::HTTP_DEFAULT_GROUP,
                &remark,
                &server,
                port,
                &yaml_str(entry, "username"),
                &yaml_str(entry, "password"),
                yaml_bool(entry, "tls"),
            ),
            _ => continue,
        };
        nodes.push(node);
    }
    nodes.len() > before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;

    const CLASH_DOC: &str = r#"
Proxy:
  - name: "vm"
    type: vmess
    server: v.example.com
    port: 443
    uuid: uuid-1
    alterId: 4
    cipher: auto
    tls: true
    network: ws
    ws-path: /ws
    ws-headers:
      Host: cdn.example.com
  - name: "ss"
    type: ss
    server: s.example.com
    port: 8388
    cipher: AEAD_AES_128_GCM
    password: pw
    plugin: obfs
    plugin-opts:
      mode: http
      host: h.example.com
  - name: "sr"
    type: ssr
    server: r.example.com
    port: 8443
    cipher: chacha20
    password: pw
    protocol: auth_aes128_sha1
    protocolparam: "64"
    obfs: tls1.2_ticket_auth
    obfsparam: o.example.com
  - name: "sk"
    type: socks
    server: k.example.com
    port: 1080
    username: u
    password: p
  - name: "unsupported"
    type: trojan
    server: t.example.com
    port: 443
"#;

    #[test]
    fn test_explode_clash() {
        let mut nodes = Vec::new();
        assert!(explode_clash(CLASH_DOC, &mut nodes));
        assert_eq!(nodes.len(), 4);

        assert_eq!(nodes[0].proxy_type, ProxyType::VMess);
        assert_eq!(nodes[0].alter_id, 4);
        assert_eq!(nodes[0].host.as_deref(), Some("cdn.example.com"));
        assert_eq!(nodes[0].path.as_deref(), Some("/ws"));

        assert_eq!(nodes[1].proxy_type, ProxyType::Shadowsocks);
        assert_eq!(nodes[1].method.as_deref(), Some("aes-128-gcm"));
        assert_eq!(nodes[1].plugin.as_deref(), Some("simple-obfs"));
        assert_eq!(
            nodes[1].plugin_opts_str(),
            "obfs=http;obfs-host=h.example.com"
        );

        assert_eq!(nodes[2].proxy_type, ProxyType::ShadowsocksR);
        assert_eq!(nodes[3].proxy_type, ProxyType::Socks5);
    }

    #[test]
    fn test_explode_clash_new_field_name() {
        let doc = "proxies:\n  - name: n\n    type: ss\n    server: a.com\n    port: 8388\n    cipher: aes-128-gcm\n    password: p\n";
        let mut nodes = Vec::new();
        assert!(explode_clash(doc, &mut nodes));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_explode_clash_rejects_non_yaml() {
        let mut nodes = Vec::new();
        assert!(!explode_clash("c3M6Ly9iYXNlNjQ=", &mut nodes));
        assert!(!explode_clash("{\"version\": 1}", &mut nodes));
    }
}
