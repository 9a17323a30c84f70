use serde_json::Value;

use crate::models::{
    Proxy, SOCKS_DEFAULT_GROUP, SSR_DEFAULT_GROUP, SS_DEFAULT_GROUP, V2RAY_DEFAULT_GROUP,
};
use crate::parser::explodes::json_str;
use crate::parser::explodes::ssr::ssr_is_plain_ss;
use crate::utils::base64::{base64_encode, url_safe_base64_decode};

/// Parse a `Netch://` link, a base64 JSON object with an explicit `Type`
/// discriminator.
pub fn explode_netch(link: &str, node: &mut Proxy) -> bool {
    if !link.starts_with("Netch://") {
        return false;
    }
    let decoded = url_safe_base64_decode(&link[8..]);
    let json: Value = match serde_json::from_str(&decoded) {
        Ok(json) => json,
        Err(_) => return false,
    };

    let kind = json_str(&json, "Type");
    let server = json_str(&json, "Hostname");
    let port = match json_str(&json, "Port").parse::<u16>() {
        Ok(p) if p > 0 => p,
        _ => return false,
    };
    if server.is_empty() {
        return false;
    }
    let mut remark = json_str(&json, "Remark");
    if remark.is_empty() {
        remark = format!("{}:{}", server, port);
    }
    let method = json_str(&json, "EncryptMethod");
    let password = json_str(&json, "Password");

    match kind.as_str() {
        "SS" => {
            *node = Proxy::ss_construct(
                SS_DEFAULT_GROUP,
                &remark,
                &server,
                port,
                &password,
                &method,
                &json_str(&json, "Plugin"),
                &json_str(&json, "PluginOption"),
                None,
                None,
            );
        }
        "SSR" => {
            let protocol = json_str(&json, "Protocol");
            let obfs = json_str(&json, "OBFS");
            if ssr_is_plain_ss(&method, &protocol, &obfs) {
                *node = Proxy::ss_construct(
                    SS_DEFAULT_GROUP,
                    &remark,
                    &server,
                    port,
                    &password,
                    &method,
                    &json_str(&json, "Plugin"),
                    &json_str(&json, "PluginOption"),
                    None,
                    None,
                );
            } else {
                *node = Proxy::ssr_construct(
                    SSR_DEFAULT_GROUP,
                    &remark,
                    &server,
                    port,
                    &protocol,
                    &method,
                    &obfs,
                    &password,
                    &json_str(&json, "OBFSParam"),
                    &json_str(&json, "ProtocolParam"),
                    None,
                    None,
                );
            }
        }
        "VMess" => {
            *node = Proxy::vmess_construct(
                V2RAY_DEFAULT_GROUP,
                &remark,
                &server,
                port,
                &json_str(&json, "FakeType"),
                &json_str(&json, "UserID"),
                json_str(&json, "AlterID").parse().unwrap_or(0),
                &json_str(&json, "TransferProtocol"),
                &method,
                &json_str(&json, "Path"),
                &json_str(&json, "Host"),
                json_str(&json, "TLSSecure") == "true",
                None,
                None,
            );
        }
        "Socks5" => {
            *node = Proxy::socks_construct(
                SOCKS_DEFAULT_GROUP,
                &remark,
                &server,
                port,
                &json_str(&json, "Username"),
                &password,
                None,
                None,
            );
        }
        _ => return false,
    }
    true
}

/// Parse a Netch GUI configuration: each element of `Server` is re-encoded
/// as a `Netch://` link and run through [`explode_netch`].
pub fn explode_netch_conf(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(_) => return false,
    };
    let servers = match json["Server"].as_array() {
        Some(servers) => servers,
        None => return false,
    };

    let before = nodes.len();
    for server in servers {
        let link = format!("Netch://{}", base64_encode(&server.to_string()));
        let mut node = Proxy::default();
        if explode_netch(&link, &mut node) {
            nodes.push(node);
        }
    }
    nodes.len() > before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;

    fn netch_link(body: &str) -> String {
        format!("Netch://{}", base64_encode(body))
    }

    #[test]
    fn test_explode_netch_ss() {
        let link = netch_link(
            r#"{"Type":"SS","Remark":"N","Hostname":"a.com","Port":8388,"EncryptMethod":"aes-128-gcm","Password":"pw"}"#,
        );
        let mut node = Proxy::default();
        assert!(explode_netch(&link, &mut node));
        assert_eq!(node.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(node.remark, "N");
    }

    #[test]
    fn test_explode_netch_ssr_demotion() {
        let link = netch_link(
            r#"{"Type":"SSR","Remark":"","Hostname":"a.com","Port":8388,"EncryptMethod":"aes-128-gcm","Password":"pw","Protocol":"origin","OBFS":"plain"}"#,
        );
        let mut node = Proxy::default();
        assert!(explode_netch(&link, &mut node));
        assert_eq!(node.proxy_type, ProxyType::Shadowsocks);
        assert_eq!(node.remark, "a.com:8388");
    }

    #[test]
    fn test_explode_netch_conf() {
        let content = r#"{
            "ModeFileNameType": 0,
            "Server": [
                {"Type":"Socks5","Remark":"S","Hostname":"h.com","Port":1080,"Username":"u","Password":"p"},
                {"Type":"VMess","Remark":"V","Hostname":"v.com","Port":443,"UserID":"uuid","AlterID":"0","TransferProtocol":"ws","EncryptMethod":"auto","Path":"/p","Host":"h","TLSSecure":"true","FakeType":"none"}
            ]
        }"#;
        let mut nodes = Vec::new();
        assert!(explode_netch_conf(content, &mut nodes));
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].proxy_type, ProxyType::Socks5);
        assert_eq!(nodes[1].proxy_type, ProxyType::VMess);
        assert!(nodes[1].tls_secure);
    }
}
