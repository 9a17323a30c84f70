use log::error;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::generator::config::group::group_generate;
use crate::generator::ruleconvert::ruleset_to_clash;
use crate::models::{
    ExtraSettings, Proxy, ProxyGroupConfigs, ProxyGroupType, ProxyType, RulesetContent,
};

fn ystr(value: &str) -> YamlValue {
    YamlValue::String(value.to_string())
}

fn insert(map: &mut Mapping, key: &str, value: YamlValue) {
    map.insert(ystr(key), value);
}

/// Render the Clash (or ClashR, when `clash_r` is set) YAML dialect.
/// Returns an empty body when the base config cannot be parsed as YAML.
pub fn proxy_to_clash(
    nodes: &[Proxy],
    base_conf: &str,
    rulesets: &[RulesetContent],
    extra_groups: &ProxyGroupConfigs,
    clash_r: bool,
    ext: &ExtraSettings,
) -> String {
    let mut base: YamlValue = if ext.nodelist || base_conf.trim().is_empty() {
        YamlValue::Mapping(Mapping::new())
    } else {
        match serde_yaml::from_str(base_conf) {
            Ok(YamlValue::Null) => YamlValue::Mapping(Mapping::new()),
            Ok(yaml @ YamlValue::Mapping(_)) => yaml,
            _ => {
                error!("Clash base loader failed: base config is not a YAML mapping");
                return String::new();
            }
        }
    };

    let mut proxies: Vec<YamlValue> = Vec::new();
    let mut nodelist: Vec<Proxy> = Vec::new();

    for node in nodes {
        let mut remark = node.remark.clone();
        if ext.append_proxy_type {
            remark = format!("[{}] {}", node.proxy_type.as_str(), remark);
        }

        let mut proxy = Mapping::new();
        match node.proxy_type {
            ProxyType::Shadowsocks => {
                insert(&mut proxy, "type", ystr("ss"));
                insert(
                    &mut proxy,
                    "cipher",
                    ystr(node.method.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "password",
                    ystr(node.password.as_deref().unwrap_or("")),
                );
                if node.plugin.as_deref() == Some("simple-obfs") {
                    insert(&mut proxy, "plugin", ystr("obfs"));
                    let mut opts = Mapping::new();
                    insert(
                        &mut opts,
                        "mode",
                        ystr(node.plugin_opts.get("obfs").map(String::as_str).unwrap_or("")),
                    );
                    if let Some(host) = node.plugin_opts.get("obfs-host") {
                        insert(&mut opts, "host", ystr(host));
                    }
                    insert(&mut proxy, "plugin-opts", YamlValue::Mapping(opts));
                }
            }
            ProxyType::VMess => {
                let transport = node.transport.as_deref().unwrap_or("tcp");
                // Clash has no representation for these transports
                if matches!(transport, "kcp" | "h2" | "quic") {
                    continue;
                }
                insert(&mut proxy, "type", ystr("vmess"));
                insert(&mut proxy, "uuid", ystr(node.uuid.as_deref().unwrap_or("")));
                insert(
                    &mut proxy,
                    "alterId",
                    YamlValue::Number(node.alter_id.into()),
                );
                insert(
                    &mut proxy,
                    "cipher",
                    ystr(node.method.as_deref().unwrap_or("auto")),
                );
                insert(&mut proxy, "tls", YamlValue::Bool(node.tls_secure));
                if transport == "ws" {
                    insert(&mut proxy, "network", ystr("ws"));
                    insert(
                        &mut proxy,
                        "ws-path",
                        ystr(node.path.as_deref().unwrap_or("/")),
                    );
                    let mut headers = Mapping::new();
                    insert(
                        &mut headers,
                        "Host",
                        ystr(node.host.as_deref().unwrap_or("")),
                    );
                    insert(&mut proxy, "ws-headers", YamlValue::Mapping(headers));
                }
            }
            ProxyType::ShadowsocksR => {
                if !clash_r {
                    continue;
                }
                insert(&mut proxy, "type", ystr("ssr"));
                insert(
                    &mut proxy,
                    "cipher",
                    ystr(node.method.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "password",
                    ystr(node.password.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "protocol",
                    ystr(node.protocol.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "protocolparam",
                    ystr(node.protocol_param.as_deref().unwrap_or("")),
                );
                insert(&mut proxy, "obfs", ystr(node.obfs.as_deref().unwrap_or("")));
                insert(
                    &mut proxy,
                    "obfsparam",
                    ystr(node.obfs_param.as_deref().unwrap_or("")),
                );
            }
            ProxyType::Socks5 => {
                insert(&mut proxy, "type", ystr("socks"));
                insert(
                    &mut proxy,
                    "username",
                    ystr(node.username.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "password",
                    ystr(node.password.as_deref().unwrap_or("")),
                );
            }
            ProxyType::HTTP | ProxyType::HTTPS => {
                insert(&mut proxy, "type", ystr("http"));
                insert(
                    &mut proxy,
                    "username",
                    ystr(node.username.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "password",
                    ystr(node.password.as_deref().unwrap_or("")),
                );
                insert(
                    &mut proxy,
                    "tls",
                    YamlValue::Bool(node.proxy_type == ProxyType::HTTPS),
                );
            }
            ProxyType::Unknown => continue,
        }

        insert(&mut proxy, "name", ystr(&remark));
        insert(&mut proxy, "server", ystr(&node.server));
        insert(&mut proxy, "port", YamlValue::Number(node.port.into()));
        if let Some(udp) = node.udp.or(ext.udp) {
            insert(&mut proxy, "udp", YamlValue::Bool(udp));
        }

        proxies.push(YamlValue::Mapping(proxy));
        let mut listed = node.clone();
        listed.remark = remark;
        nodelist.push(listed);
    }

    if ext.nodelist {
        let mut output = Mapping::new();
        insert(&mut output, "Proxy", YamlValue::Sequence(proxies));
        return serde_yaml::to_string(&output).unwrap_or_default();
    }

    if let Some(mapping) = base.as_mapping_mut() {
        mapping.insert(ystr("Proxy"), YamlValue::Sequence(proxies));
    }

    // build the extra groups, replacing same-name groups from the base
    let mut groups: Vec<YamlValue> = base
        .get("Proxy Group")
        .and_then(YamlValue::as_sequence)
        .cloned()
        .unwrap_or_default();

    for group in extra_groups {
        let mut filtered = Vec::new();
        for selector in &group.proxies {
            group_generate(selector, &nodelist, &mut filtered, true);
        }
        if filtered.is_empty() {
            filtered.push("DIRECT".to_string());
        }

        let mut single = Mapping::new();
        insert(&mut single, "name", ystr(&group.name));
        insert(&mut single, "type", ystr(group.group_type.as_str()));
        if group.group_type != ProxyGroupType::Select {
            insert(&mut single, "url", ystr(&group.url));
            insert(&mut single, "interval", YamlValue::Number(group.interval.into()));
        }
        insert(
            &mut single,
            "proxies",
            YamlValue::Sequence(filtered.into_iter().map(|name| ystr(&name)).collect()),
        );
        let single = YamlValue::Mapping(single);

        let existing = groups
            .iter_mut()
            .find(|g| g.get("name").and_then(YamlValue::as_str) == Some(group.name.as_str()));
        match existing {
            Some(slot) => *slot = single,
            None => groups.push(single),
        }
    }

    if let Some(mapping) = base.as_mapping_mut() {
        mapping.insert(ystr("Proxy Group"), YamlValue::Sequence(groups));
    }

    if ext.enable_rule_generator {
        ruleset_to_clash(&mut base, rulesets, ext.overwrite_original_rules);
    }

    serde_yaml::to_string(&base).unwrap_or_default()
}
