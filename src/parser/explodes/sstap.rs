use serde_json::Value;

use crate::models::Proxy;
use crate::parser::explodes::json_str;
use crate::parser::explodes::ssr::ssr_is_plain_ss;

/// Parse an SSTap export: `configs[]` entries where `type` "5" is SOCKS5
/// and "6" is SS or SSR depending on the cipher parameters.
pub fn explode_sstap(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return false,
    };
    let configs = match json["configs"].as_array() {
        Some(configs) => configs,
        None => return false,
    };

    let before = nodes.len();
    for config in configs {
        let group = json_str(config, "group");
        let server = json_str(config, "server");
        let port = match json_str(config, "server_port").parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => continue,
        };
        if server.is_empty() {
            continue;
        }
        let mut remark = json_str(config, "remarks");
        if remark.is_empty() {
            remark = format!("{}:{}", server, port);
        }
        let password = json_str(config, "password");

        let node = match json_str(config, "type").as_str() {
            "5" => Proxy::socks_construct(
                &group,
                &remark,
                &server,
                port,
                &json_str(config, "username"),
                &password,
                None,
                None,
            ),
            "6" => {
                let method = json_str(config, "method");
                let protocol = json_str(config, "protocol");
                let obfs = json_str(config, "obfs");
                if ssr_is_plain_ss(&method, &protocol, &obfs) {
                    Proxy::ss_construct(
                        &group, &remark, &server, port, &password, &method, "", "", None, None,
                    )
                } else {
                    Proxy::ssr_construct(
                        &group,
                        &remark,
                        &server,
                        port,
                        &protocol,
                        &method,
                        &obfs,
                        &password,
                        &json_str(config, "obfsparam"),
                        &json_str(config, "protocolparam"),
                        None,
                        None,
                    )
                }
            }
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

    #[test]
    fn test_explode_sstap() {
        let content = r#"{
            "idInUse": 1,
            "configs": [
                {"type": "5", "group": "G", "remarks": "S", "server": "s.com",
                 "server_port": 1080, "username": "u", "password": "p"},
                {"type": "6", "group": "G", "remarks": "R", "server": "r.com",
                 "server_port": 8388, "password": "pw", "method": "chacha20",
                 "protocol": "auth_aes128_md5", "obfs": "http_simple",
                 "protocolparam": "pp", "obfsparam": "op"},
                {"type": "6", "group": "G", "remarks": "Plain", "server": "q.com",
                 "server_port": 8389, "password": "pw", "method": "aes-128-gcm",
                 "protocol": "origin", "obfs": "plain"}
            ]
        }"#;
        let mut nodes = Vec::new();

        assert!(explode_sstap(content, &mut nodes));
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].proxy_type, ProxyType::Socks5);
        assert_eq!(nodes[1].proxy_type, ProxyType::ShadowsocksR);
        assert_eq!(nodes[2].proxy_type, ProxyType::Shadowsocks);
    }

    #[test]
    fn test_explode_sstap_rejects_other_json() {
        let mut nodes = Vec::new();
        assert!(!explode_sstap(r#"{"something": []}"#, &mut nodes));
    }
}
