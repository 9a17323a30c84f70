use log::error;

use crate::models::{ExtraSettings, Proxy, ProxyType, SSR_CIPHERS, SS_CIPHERS};
use crate::utils::base64::{base64_encode, url_safe_base64_encode};
use crate::utils::url::url_encode;

/// Which link schemes a plain-list export may contain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleLinkTypes {
    pub ss: bool,
    pub ssr: bool,
    pub vmess: bool,
}

impl SingleLinkTypes {
    pub fn ss() -> Self {
        SingleLinkTypes {
            ss: true,
            ..Default::default()
        }
    }

    pub fn ssr() -> Self {
        SingleLinkTypes {
            ssr: true,
            ..Default::default()
        }
    }

    pub fn vmess() -> Self {
        SingleLinkTypes {
            vmess: true,
            ..Default::default()
        }
    }
}

fn vmess_link(node: &Proxy, remark: &str) -> String {
    let json = serde_json::json!({
        "v": "2",
        "ps": remark,
        "add": node.server,
        "port": node.port.to_string(),
        "id": node.uuid.as_deref().unwrap_or(""),
        "aid": node.alter_id.to_string(),
        "net": node.transport.as_deref().unwrap_or("tcp"),
        "type": node.fake_type.as_deref().unwrap_or(""),
        "path": node.path.as_deref().unwrap_or(""),
        "host": node.host.as_deref().unwrap_or(""),
        "tls": if node.tls_secure { "tls" } else { "" },
    });
    match serde_json::to_string(&json) {
        Ok(body) => format!("vmess://{}", base64_encode(&body)),
        Err(e) => {
            error!("Failed to serialize VMess link: {}", e);
            String::new()
        }
    }
}

fn ss_link(node: &Proxy, remark: &str) -> String {
    let mut link = format!(
        "ss://{}@{}:{}",
        url_safe_base64_encode(&format!(
            "{}:{}",
            node.method.as_deref().unwrap_or(""),
            node.password.as_deref().unwrap_or("")
        )),
        node.server,
        node.port
    );
    if node.plugin.is_some() && !node.plugin_opts.is_empty() {
        link.push_str(&format!(
            "/?plugin={}",
            url_encode(&format!(
                "{};{}",
                node.plugin.as_deref().unwrap_or(""),
                node.plugin_opts_str()
            ))
        ));
    }
    link.push_str(&format!("#{}", url_encode(remark)));
    link
}

fn ssr_link(node: &Proxy, remark: &str, protocol: &str, obfs: &str) -> String {
    format!(
        "ssr://{}",
        url_safe_base64_encode(&format!(
            "{}:{}:{}:{}:{}:{}/?group={}&remarks={}&obfsparam={}&protoparam={}",
            node.server,
            node.port,
            protocol,
            node.method.as_deref().unwrap_or(""),
            obfs,
            url_safe_base64_encode(node.password.as_deref().unwrap_or("")),
            url_safe_base64_encode(&node.group),
            url_safe_base64_encode(remark),
            url_safe_base64_encode(node.obfs_param.as_deref().unwrap_or("")),
            url_safe_base64_encode(node.protocol_param.as_deref().unwrap_or(""))
        ))
    )
}

/// Render a plain link list for the `ss`, `ssr` and `v2ray` targets.
/// Nodes the requested schemes cannot express are dropped; SS/SSR convert
/// into each other when the cipher parameters allow it. The list is
/// base64-wrapped unless `nodelist` is set.
pub fn proxy_to_single(nodes: &[Proxy], types: SingleLinkTypes, ext: &ExtraSettings) -> String {
    let mut links: Vec<String> = Vec::new();

    for node in nodes {
        let mut remark = node.remark.clone();
        if ext.append_proxy_type {
            remark = format!("[{}] {}", node.proxy_type.as_str(), remark);
        }
        let method = node.method.as_deref().unwrap_or("");

        let link = match node.proxy_type {
            ProxyType::Shadowsocks => {
                if types.ss {
                    ss_link(node, &remark)
                } else if types.ssr && SSR_CIPHERS.contains(&method) && node.plugin.is_none() {
                    ssr_link(node, &remark, "origin", "plain")
                } else {
                    continue;
                }
            }
            ProxyType::ShadowsocksR => {
                let protocol = node.protocol.as_deref().unwrap_or("");
                let obfs = node.obfs.as_deref().unwrap_or("");
                if types.ssr {
                    ssr_link(node, &remark, protocol, obfs)
                } else if types.ss
                    && SS_CIPHERS.contains(&method)
                    && protocol == "origin"
                    && obfs == "plain"
                {
                    ss_link(node, &remark)
                } else {
                    continue;
                }
            }
            ProxyType::VMess => {
                if !types.vmess {
                    continue;
                }
                vmess_link(node, &remark)
            }
            _ => continue,
        };

        if !link.is_empty() {
            links.push(link);
        }
    }

    let body = links.join("\n");
    if ext.nodelist {
        body
    } else {
        base64_encode(&body)
    }
}
