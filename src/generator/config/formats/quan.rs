use crate::generator::config::remark::process_remark;
use crate::models::{ExtraSettings, Proxy, ProxyType};
use crate::utils::base64::{base64_encode, url_safe_base64_encode};
use crate::utils::string::join;
use crate::utils::url::url_encode;

/// Render the Quantumult subscription: one link per node in the scheme
/// Quantumult imports, base64-wrapped unless `nodelist` asks for the raw
/// lines.
pub fn proxy_to_quan(nodes: &[Proxy], ext: &ExtraSettings) -> String {
    let mut links: Vec<String> = Vec::new();
    let mut remarks_list: Vec<String> = Vec::new();

    for node in nodes {
        let mut remark = node.remark.clone();
        if ext.append_proxy_type {
            remark = format!("[{}] {}", node.proxy_type.as_str(), remark);
        }
        process_remark(&mut remark, &remarks_list, false);

        let server = &node.server;
        let port = node.port;
        let password = node.password.as_deref().unwrap_or("");
        let method = node.method.as_deref().unwrap_or("");
        let group = &node.group;

        let link = match node.proxy_type {
            ProxyType::VMess => {
                let cipher = if method == "auto" {
                    "chacha20-ietf-poly1305"
                } else {
                    method
                };
                let mut line = format!(
                    "{} = vmess, {}, {}, {}, \"{}\", group={}",
                    remark,
                    server,
                    port,
                    cipher,
                    node.uuid.as_deref().unwrap_or(""),
                    group
                );
                let host = node.host.as_deref().unwrap_or("");
                if node.tls_secure {
                    line.push_str(&format!(", over-tls=true, tls-host={}", host));
                }
                if node.transport.as_deref() == Some("ws") {
                    line.push_str(&format!(
                        ", obfs=ws, obfs-path=\"{}\", obfs-header=\"Host: {}\"",
                        node.path.as_deref().unwrap_or("/"),
                        host
                    ));
                }
                format!("vmess://{}", url_safe_base64_encode(&line))
            }
            ProxyType::ShadowsocksR => format!(
                "ssr://{}",
                url_safe_base64_encode(&format!(
                    "{}:{}:{}:{}:{}:{}/?group={}&remarks={}&obfsparam={}&protoparam={}",
                    server,
                    port,
                    node.protocol.as_deref().unwrap_or(""),
                    method,
                    node.obfs.as_deref().unwrap_or(""),
                    url_safe_base64_encode(password),
                    url_safe_base64_encode(group),
                    url_safe_base64_encode(&remark),
                    url_safe_base64_encode(node.obfs_param.as_deref().unwrap_or("")),
                    url_safe_base64_encode(node.protocol_param.as_deref().unwrap_or(""))
                ))
            ),
            ProxyType::Shadowsocks => {
                let mut line = format!(
                    "ss://{}@{}:{}",
                    url_safe_base64_encode(&format!("{}:{}", method, password)),
                    server,
                    port
                );
                if node.plugin.is_some() && !node.plugin_opts.is_empty() {
                    line.push_str(&format!(
                        "/?plugin={}",
                        url_encode(&format!(
                            "{};{}",
                            node.plugin.as_deref().unwrap_or(""),
                            node.plugin_opts_str()
                        ))
                    ));
                    line.push_str(&format!("&group={}", url_safe_base64_encode(group)));
                } else {
                    line.push_str(&format!("/?group={}", url_safe_base64_encode(group)));
                }
                line.push_str(&format!("#{}", url_encode(&remark)));
                line
            }
            ProxyType::Socks5 | ProxyType::HTTP | ProxyType::HTTPS => {
                let kind = if node.proxy_type == ProxyType::Socks5 {
                    "socks"
                } else {
                    "http"
                };
                let username = node.username.as_deref().unwrap_or("");
                let mut line = format!(
                    "{} = {}, upstream-proxy-address={}, upstream-proxy-port={}, group={}",
                    remark, kind, server, port, group
                );
                if !username.is_empty() && !password.is_empty() {
                    line.push_str(&format!(
                        ", upstream-proxy-auth=true, upstream-proxy-username={}, upstream-proxy-password={}",
                        username, password
                    ));
                } else {
                    line.push_str(", upstream-proxy-auth=false");
                }
                if node.tls_secure {
                    line.push_str(", over-tls=true");
                }
                format!("{}://{}", kind, url_safe_base64_encode(&line))
            }
            _ => continue,
        };

        links.push(link);
        remarks_list.push(remark);
    }

    let body = join(&links, "\n");
    if ext.nodelist {
        body
    } else {
        base64_encode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SSR_DEFAULT_GROUP, V2RAY_DEFAULT_GROUP};
    use crate::parser::explodes::{explode_ssr, explode_vmess};
    use crate::utils::base64::url_safe_base64_decode;

    #[test]
    fn test_quan_vmess_line() {
        let node = Proxy::vmess_construct(
            V2RAY_DEFAULT_GROUP,
            "V",
            "v.com",
            443,
            "none",
            "uuid-1",
            0,
            "ws",
            "auto",
            "/ws",
            "h.com",
            true,
            None,
            None,
        );
        let ext = ExtraSettings {
            nodelist: true,
            ..Default::default()
        };
        let output = proxy_to_quan(&[node], &ext);
        assert!(output.starts_with("vmess://"));
        let decoded = url_safe_base64_decode(&output[8..]);
        assert!(decoded.starts_with("V = vmess, v.com, 443, chacha20-ietf-poly1305, \"uuid-1\""));
        assert!(decoded.contains("over-tls=true, tls-host=h.com"));
        assert!(decoded.contains("obfs=ws, obfs-path=\"/ws\""));
    }

    #[test]
    fn test_quan_ssr_link_roundtrip() {
        let node = Proxy::ssr_construct(
            SSR_DEFAULT_GROUP,
            "R",
            "r.com",
            8443,
            "auth_aes128_md5",
            "aes-256-cfb",
            "tls1.2_ticket_auth",
            "pw",
            "op",
            "pp",
            None,
            None,
        );
        let ext = ExtraSettings {
            nodelist: true,
            ..Default::default()
        };
        let output = proxy_to_quan(&[node.clone()], &ext);

        let mut parsed = Proxy::default();
        assert!(explode_ssr(&output, &mut parsed));
        assert_eq!(parsed.server, node.server);
        assert_eq!(parsed.port, node.port);
        assert_eq!(parsed.password, node.password);
        assert_eq!(parsed.obfs_param, node.obfs_param);
        assert_eq!(parsed.remark, "R");
    }

    #[test]
    fn test_quan_wrapped_in_base64_by_default(){
        let node = Proxy::vmess_construct(
            V2RAY_DEFAULT_GROUP, "V", "v.com", 443, "none", "u", 0, "tcp", "auto", "", "",
            false, None, None,
        );
        let output = proxy_to_quan(&[node], &ExtraSettings::default());
        let decoded = url_safe_base64_decode(&output);
        assert!(decoded.starts_with("vmess://"));
        let mut parsed = Proxy::default();
        assert!(explode_vmess(&decoded, &mut parsed));
        assert_eq!(parsed.remark, "V");
    }
}
