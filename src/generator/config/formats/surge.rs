use log::error;

use crate::generator::config::group::group_generate;
use crate::generator::config::remark::process_remark;
use crate::generator::ruleconvert::ruleset_to_ini;
use crate::models::{
    ExtraSettings, Proxy, ProxyGroupConfigs, ProxyGroupType, ProxyType, RulesetContent,
};
use crate::utils::ini_reader::IniReader;
use crate::utils::string::join;

/// Module URL used on version-2 `custom` lines when no
/// `surge_ssr_path` is configured.
const SSENCRYPT_MODULE_URL: &str =
    "https://github.com/pobizhe/SSEncrypt/raw/master/SSEncrypt.module";

/// Sections copied through from the base config untouched.
const DIRECT_SAVE_SECTIONS: [&str; 8] = [
    "General",
    "Replica",
    "Rule",
    "MITM",
    "Script",
    "Host",
    "URL Rewrite",
    "Header Rewrite",
];

/// Render the Surge dialect for `surge_ver` 2, 3 or 4. The Surfboard
/// target reuses the version-2 path with its own base config.
pub fn proxy_to_surge(
    nodes: &[Proxy],
    base_conf: &str,
    rulesets: &[RulesetContent],
    extra_groups: &ProxyGroupConfigs,
    surge_ver: i32,
    ext: &ExtraSettings,
) -> String {
    let mut ini = IniReader::new();
    ini.store_any_line = true;
    for section in DIRECT_SAVE_SECTIONS {
        ini.add_direct_save_section(section);
    }

    if !base_conf.trim().is_empty() && ini.parse(base_conf).is_err() && !ext.nodelist {
        error!("Surge base loader failed: base config is not a valid INI document");
        return String::new();
    }

    ini.set_current_section("Proxy");
    ini.erase_section();
    ini.set("DIRECT", "direct");

    let mut nodelist: Vec<Proxy> = Vec::new();
    let mut remarks_list: Vec<String> = Vec::new();
    let mut node_lines: Vec<String> = Vec::new();

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
        let udp = node.udp.or(ext.udp);
        let tfo = node.tfo.or(ext.tfo);

        let mut proxy = match node.proxy_type {
            ProxyType::Shadowsocks => {
                let mut line = if surge_ver >= 3 {
                    format!(
                        "ss, {}, {}, encrypt-method={}, password={}",
                        server, port, method, password
                    )
                } else {
                    let module = if ext.surge_ssr_path.is_empty() {
                        SSENCRYPT_MODULE_URL
                    } else {
                        ext.surge_ssr_path.as_str()
                    };
                    format!(
                        "custom, {}, {}, {}, {}, {}",
                        server, port, method, password, module
                    )
                };
                match node.plugin.as_deref() {
                    None => {}
                    Some("simple-obfs") => {
                        if !node.plugin_opts.is_empty() {
                            line.push_str(&format!(
                                ", {}",
                                node.plugin_opts_str().replace(';', ", ")
                            ));
                        }
                    }
                    // other plugins have no Surge representation
                    Some(_) => continue,
                }
                line
            }
            ProxyType::Socks5 => {
                let mut line = format!("socks5, {}, {}", server, port);
                let username = node.username.as_deref().unwrap_or("");
                if !username.is_empty() || !password.is_empty() {
                    line.push_str(&format!(", {}, {}", username, password));
                }
                line
            }
            ProxyType::HTTP | ProxyType::HTTPS => {
                if surge_ver < 3 {
                    continue;
                }
                format!(
                    "{}, {}, {}, {}, {}",
                    if node.proxy_type == ProxyType::HTTPS {
                        "https"
                    } else {
                        "http"
                    },
                    server,
                    port,
                    node.username.as_deref().unwrap_or(""),
                    password
                )
            }
            ProxyType::VMess => {
                if surge_ver < 4 {
                    continue;
                }
                let transport = node.transport.as_deref().unwrap_or("tcp");
                if !matches!(transport, "tcp" | "ws") {
                    continue;
                }
                let mut line = format!(
                    "vmess, {}, {}, username={}",
                    server,
                    port,
                    node.uuid.as_deref().unwrap_or("")
                );
                if transport == "ws" {
                    line.push_str(&format!(
                        ", ws=true, ws-path={}",
                        node.path.as_deref().unwrap_or("/")
                    ));
                    let host = node.host.as_deref().unwrap_or("");
                    if !host.is_empty() {
                        line.push_str(&format!(", ws-headers=Host:{}", host));
                    }
                }
                if node.tls_secure {
                    line.push_str(", tls=true");
                }
                line
            }
            // SSR and unknown nodes have no Surge representation
            _ => continue,
        };

        if let Some(udp) = udp {
            proxy.push_str(&format!(", udp-relay={}", udp));
        }
        if let Some(tfo) = tfo {
            proxy.push_str(&format!(", tfo={}", tfo));
        }

        if ext.nodelist {
            node_lines.push(format!("{} = {}", remark, proxy));
        } else {
            ini.set(&remark, &proxy);
        }
        remarks_list.push(remark.clone());
        let mut listed = node.clone();
        listed.remark = remark;
        nodelist.push(listed);
    }

    if ext.nodelist {
        return join(&node_lines, "\n");
    }

    ini.set_current_section("Proxy Group");
    ini.erase_section();
    for group in extra_groups {
        let mut filtered = Vec::new();
        for selector in &group.proxies {
            group_generate(selector, &nodelist, &mut filtered, true);
        }
        if filtered.is_empty() {
            filtered.push("DIRECT".to_string());
        }

        let mut line = format!("{}, {}", group.group_type.as_str(), join(&filtered, ", "));
        if group.group_type != ProxyGroupType::Select {
            line.push_str(&format!(", url={}, interval={}", group.url, group.interval));
        }
        ini.set(&group.name, &line);
    }

    if ext.enable_rule_generator {
        ruleset_to_ini(&mut ini, "Rule", rulesets, ext.overwrite_original_rules);
    }

    ini.to_string()
}
