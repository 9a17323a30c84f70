use log::error;

use crate::generator::config::group::group_generate;
use crate::generator::config::remark::process_remark;
use crate::generator::ruleconvert::ruleset_to_ini;
use crate::models::{ExtraSettings, Proxy, ProxyGroupConfigs, ProxyType, RulesetContent};
use crate::utils::base64::url_safe_base64_encode;
use crate::utils::ini_reader::IniReader;
use crate::utils::string::join;
use crate::utils::url::url_encode;

/// Render the Mellow dialect: `[Endpoint]` lines mirroring V2Ray outbound
/// semantics in a single-line encoding, `[EndpointGroup]` per extra group
/// and `[RoutingRule]` for the merged rulesets.
pub fn proxy_to_mellow(
    nodes: &[Proxy],
    base_conf: &str,
    rulesets: &[RulesetContent],
    extra_groups: &ProxyGroupConfigs,
    ext: &ExtraSettings,
) -> String {
    let mut ini = IniReader::new();
    ini.store_any_line = true;

    if !base_conf.trim().is_empty() && ini.parse(base_conf).is_err() {
        error!("Mellow base loader failed: base config is not a valid INI document");
        return String::new();
    }

    ini.set_current_section("Endpoint");

    let mut nodelist: Vec<Proxy> = Vec::new();
    let mut remarks_list: Vec<String> = Vec::new();

    for node in nodes {
        let mut remark = node.remark.clone();
        if ext.append_proxy_type {
            remark = format!("[{}] {}", node.proxy_type.as_str(), remark);
        }
        process_remark(&mut remark, &remarks_list, true);

        let server = &node.server;
        let port = node.port;
        let username = node.username.as_deref().unwrap_or("");
        let password = node.password.as_deref().unwrap_or("");

        let line = match node.proxy_type {
            ProxyType::Shadowsocks => {
                // plugins cannot be expressed in a v2ray ss outbound
                if node.plugin.is_some() {
                    continue;
                }
                format!(
                    "{}, ss, ss://{}@{}:{}",
                    remark,
                    url_safe_base64_encode(&format!(
                        "{}:{}",
                        node.method.as_deref().unwrap_or(""),
                        password
                    )),
                    server,
                    port
                )
            }
            ProxyType::VMess => {
                let transport = node.transport.as_deref().unwrap_or("tcp");
                let mut line = format!(
                    "{}, vmess1, vmess1://{}@{}:{}",
                    remark,
                    node.uuid.as_deref().unwrap_or(""),
                    server,
                    port
                );
                if let Some(path) = node.path.as_deref() {
                    if !path.is_empty() {
                        line.push_str(path);
                    }
                }
                line.push_str(&format!("?network={}", transport));
                if transport == "ws" {
                    line.push_str(&format!(
                        "&ws.host={}",
                        url_encode(node.host.as_deref().unwrap_or(""))
                    ));
                }
                line.push_str(&format!(
                    "&tls={}",
                    if node.tls_secure { "true" } else { "false" }
                ));
                if let Some(tfo) = node.tfo.or(ext.tfo) {
                    line.push_str(&format!("&sockopt.tcpfastopen={}", tfo));
                }
                line
            }
            ProxyType::Socks5 => format!(
                "{}, builtin, socks, address={}, port={}, user={}, pass={}",
                remark, server, port, username, password
            ),
            ProxyType::HTTP => format!(
                "{}, builtin, http, address={}, port={}, user={}, pass={}",
                remark, server, port, username, password
            ),
            _ => continue,
        };

        ini.set_unnamed(&line);
        remarks_list.push(remark.clone());
        let mut listed = node.clone();
        listed.remark = remark;
        nodelist.push(listed);
    }

    ini.set_current_section("EndpointGroup");
    for group in extra_groups {
        let mut filtered = Vec::new();
        for selector in &group.proxies {
            group_generate(selector, &nodelist, &mut filtered, false);
        }
        if filtered.is_empty() {
            if remarks_list.is_empty() {
                filtered.push("DIRECT".to_string());
            } else {
                filtered = remarks_list.clone();
            }
        }
        ini.set_unnamed(&format!(
            "{}, {}, latency, interval=300, timeout=6",
            group.name,
            join(&filtered, ":")
        ));
    }

    if ext.enable_rule_generator {
        ruleset_to_ini(&mut ini, "RoutingRule", rulesets, ext.overwrite_original_rules);
    }

    ini.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProxyGroupConfig, SS_DEFAULT_GROUP, V2RAY_DEFAULT_GROUP};

    const BASE: &str = "[Endpoint]\n\n[RoutingRule]\n";

    #[test]
    fn test_mellow_endpoints() {
        let nodes = vec![
            Proxy::ss_construct(
                SS_DEFAULT_GROUP,
                "S",
                "s.com",
                8388,
                "pw",
                "aes-128-gcm",
                "",
                "",
                None,
                None,
            ),
            Proxy::vmess_construct(
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
            ),
        ];
        let output = proxy_to_mellow(&nodes, BASE, &[], &Vec::new(), &ExtraSettings::default());

        assert!(output.contains("S, ss, ss://"));
        assert!(output.contains("V, vmess1, vmess1://uuid-1@v.com:443/ws?network=ws&ws.host=h.com&tls=true"));
    }

    #[test]
    fn test_mellow_ss_with_plugin_skipped() {
        let node = Proxy::ss_construct(
            SS_DEFAULT_GROUP,
            "P",
            "s.com",
            8388,
            "pw",
            "aes-128-gcm",
            "simple-obfs",
            "obfs=http",
            None,
            None,
        );
        let output = proxy_to_mellow(&[node], BASE, &[], &Vec::new(), &ExtraSettings::default());
        assert!(!output.contains("P, ss"));
    }

    #[test]
    fn test_mellow_group_line() {
        let nodes = vec![Proxy::socks_construct(
            "G", "S1", "k.com", 1080, "", "", None, None,
        )];
        let groups = vec![ProxyGroupConfig::from_spec("Auto`select`.*").unwrap()];
        let output = proxy_to_mellow(&nodes, BASE, &[], &groups, &ExtraSettings::default());
        assert!(output.contains("Auto, S1, latency, interval=300, timeout=6"));
    }
}
