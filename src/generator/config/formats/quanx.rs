use crate::generator::config::remark::process_remark;
use crate::models::{ExtraSettings, Proxy, ProxyType};
use crate::utils::string::join;

/// Render the Quantumult X `server_local` list: one `key = value` line
/// per node in QuanX's documented syntax.
pub fn proxy_to_quanx(nodes: &[Proxy], ext: &ExtraSettings) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut remarks_list: Vec<String> = Vec::new();

    for node in nodes {
        let mut remark = node.remark.clone();
        if ext.append_proxy_type {
            remark = format!("[{}] {}", node.proxy_type.as_str(), remark);
        }
        process_remark(&mut remark, &remarks_list, false);

        let server = &node.server;
        let port = node.port;
        let method = node.method.as_deref().unwrap_or("");
        let password = node.password.as_deref().unwrap_or("");

        let mut line = match node.proxy_type {
            ProxyType::VMess => {
                let cipher = if method == "auto" {
                    "chacha20-ietf-poly1305"
                } else {
                    method
                };
                let mut line = format!(
                    "vmess = {}:{}, method={}, password={}",
                    server,
                    port,
                    cipher,
                    node.uuid.as_deref().unwrap_or("")
                );
                if node.alter_id != 0 {
                    line.push_str(", aead=false");
                }
                let host = node.host.as_deref().unwrap_or("");
                if node.transport.as_deref() == Some("ws") {
                    line.push_str(if node.tls_secure {
                        ", obfs=wss"
                    } else {
                        ", obfs=ws"
                    });
                    line.push_str(&format!(
                        ", obfs-host={}, obfs-uri={}",
                        host,
                        node.path.as_deref().unwrap_or("/")
                    ));
                } else if node.tls_secure {
                    line.push_str(&format!(", obfs=over-tls, obfs-host={}", host));
                }
                line
            }
            ProxyType::Shadowsocks => {
                let mut line = format!(
                    "shadowsocks = {}:{}, method={}, password={}",
                    server, port, method, password
                );
                if node.plugin.as_deref() == Some("simple-obfs") {
                    if !node.plugin_opts.is_empty() {
                        line.push_str(&format!(", {}", node.plugin_opts_str().replace(';', ", ")));
                    }
                } else if node.plugin.is_some() {
                    continue;
                }
                line
            }
            ProxyType::ShadowsocksR => {
                let mut line = format!(
                    "shadowsocks = {}:{}, method={}, password={}, ssr-protocol={}",
                    server,
                    port,
                    method,
                    password,
                    node.protocol.as_deref().unwrap_or("")
                );
                let protocol_param = node.protocol_param.as_deref().unwrap_or("");
                if !protocol_param.is_empty() {
                    line.push_str(&format!(", ssr-protocol-param={}", protocol_param));
                }
                line.push_str(&format!(", obfs={}", node.obfs.as_deref().unwrap_or("")));
                let obfs_param = node.obfs_param.as_deref().unwrap_or("");
                if !obfs_param.is_empty() {
                    line.push_str(&format!(", obfs-host={}", obfs_param));
                }
                line
            }
            ProxyType::HTTP | ProxyType::HTTPS => {
                let username = node.username.as_deref().unwrap_or("");
                let mut line = format!(
                    "http = {}:{}, username={}, password={}",
                    server,
                    port,
                    if username.is_empty() { "none" } else { username },
                    if password.is_empty() { "none" } else { password }
                );
                if node.tls_secure {
                    line.push_str(", over-tls=true");
                }
                line
            }
            _ => continue,
        };

        if let Some(udp) = node.udp.or(ext.udp) {
            line.push_str(&format!(", udp-relay={}", udp));
        }
        if let Some(tfo) = node.tfo.or(ext.tfo) {
            line.push_str(&format!(", fast-open={}", tfo));
        }
        line.push_str(&format!(", tag={}", remark));

        lines.push(line);
        remarks_list.push(remark);
    }

    join(&lines, "\n")
}
