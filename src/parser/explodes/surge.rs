use std::collections::HashMap;
use std::sync::Mutex;

use log::warn;
use md5::{Digest, Md5};
use once_cell::sync::Lazy;

use crate::models::{
    Proxy, SOCKS_DEFAULT_GROUP, SSR_DEFAULT_GROUP, SS_DEFAULT_GROUP, V2RAY_DEFAULT_GROUP,
};
use crate::utils::http::{web_get_content_async, ProxyConfig};
use crate::utils::ini_reader::IniReader;

/// MD5 of the only external module accepted on Surge-2 `custom` lines,
/// the SSEncrypt Shadowsocks module.
const SSENCRYPT_MODULE_MD5: &str = "f7653207090ce3389115e9c88541afe0";

/// Module URL -> MD5 memo, kept for the lifetime of the process so one
/// module is fetched at most once.
static MODULE_MD5_CACHE: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

async fn module_md5(url: &str) -> String {
    if let Ok(cache) = MODULE_MD5_CACHE.lock() {
        if let Some(md5) = cache.get(url) {
            return md5.clone();
        }
    }

    let body = web_get_content_async(url, &ProxyConfig::default())
        .await
        .unwrap_or_default();
    let mut hasher = Md5::new();
    hasher.update(body.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    if let Ok(mut cache) = MODULE_MD5_CACHE.lock() {
        cache.insert(url.to_string(), digest.clone());
    }
    digest
}

/// Parse a Surge-style INI document. Handles Surge-2 `custom` lines
/// (gated on the SSEncrypt module MD5), Surge-3 `ss`/`socks5`, Surge-4
/// `vmess`, and the Quantumult `shadowsocks = host:port, ...` lines that
/// providers mix into the same section.
pub async fn explode_surge(content: &str, nodes: &mut Vec<Proxy>) -> bool {
    let mut ini = IniReader::new();
    ini.store_isolated_line = true;
    ini.set_isolated_items_section("Proxy");
    ini.include_section("Proxy");
    if ini.parse(content).is_err() {
        return false;
    }
    if !ini.section_exist("Proxy") {
        return false;
    }

    let before = nodes.len();
    for (name, value) in ini.get_items("Proxy") {
        let configs: Vec<String> = value.split(',').map(|s| s.trim().to_string()).collect();
        if configs.len() < 2 {
            continue;
        }

        match configs[0].as_str() {
            "custom" => {
                if configs.len() < 6 {
                    continue;
                }
                let mod_url = &configs[5];
                if module_md5(mod_url).await != SSENCRYPT_MODULE_MD5 {
                    warn!("Skipping node '{}' with unknown module '{}'", name, mod_url);
                    continue;
                }

                let server = &configs[1];
                let port = match configs[2].parse::<u16>() {
                    Ok(p) if p > 0 => p,
                    _ => continue,
                };
                let method = &configs[3];
                let password = &configs[4];
                let (plugin, plugin_opts) = collect_obfs_options(&configs[6..]);

                nodes.push(Proxy::ss_construct(
                    SS_DEFAULT_GROUP,
                    &name,
                    server,
                    port,
                    password,
                    method,
                    &plugin,
                    &plugin_opts,
                    None,
                    None,
                ));
            }
            "ss" => {
                if configs.len() < 3 {
                    continue;
                }
                let server = &configs[1];
                let port = match configs[2].parse::<u16>() {
                    Ok(p) if p > 0 => p,
                    _ => continue,
                };
                let mut method = String::new();
                let mut password = String::new();
                let mut obfs = String::new();
                let mut obfs_host = String::from("cloudfront.net");
                for item in &configs[3..] {
                    let (key, value) = match item.split_once('=') {
                        Some(pair) => pair,
                        None => continue,
                    };
                    match key.trim() {
                        "encrypt-method" => method = value.trim().to_string(),
                        "password" => password = value.trim().to_string(),
                        "obfs" => obfs = value.trim().to_string(),
                        "obfs-host" => obfs_host = value.trim().to_string(),
                        _ => {}
                    }
                }
                let (plugin, plugin_opts) = if obfs.is_empty() {
                    (String::new(), String::new())
                } else {
                    (
                        "simple-obfs".to_string(),
                        format!("obfs={};obfs-host={}", obfs, obfs_host),
                    )
                };

                nodes.push(Proxy::ss_construct(
                    SS_DEFAULT_GROUP,
                    &name,
                    server,
                    port,
                    &password,
                    &method,
                    &plugin,
                    &plugin_opts,
                    None,
                    None,
                ));
            }
            "socks5" => {
                if configs.len() < 3 {
                    continue;
                }
                let server = &configs[1];
                let port = match configs[2].parse::<u16>() {
                    Ok(p) if p > 0 => p,
                    _ => continue,
                };
                let (username, password) = if configs.len() >= 5 {
                    (configs[3].clone(), configs[4].clone())
                } else {
                    (String::new(), String::new())
                };

                nodes.push(Proxy::socks_construct(
                    SOCKS_DEFAULT_GROUP,
                    &name,
                    server,
                    port,
                    &username,
                    &password,
                    None,
                    None,
                ));
            }
            "vmess" => {
                if configs.len() < 3 {
                    continue;
                }
                let server = &configs[1];
                let port = match configs[2].parse::<u16>() {
                    Ok(p) if p > 0 => p,
                    _ => continue,
                };
                let mut id = String::new();
                let mut net = "tcp".to_string();
                let mut tls = false;
                let mut path = String::new();
                let mut host = String::new();
                for item in &configs[3..] {
                    let (key, value) = match item.split_once('=') {
                        Some(pair) => pair,
                        None => continue,
                    };
                    match key.trim() {
                        "username" => id = value.trim().to_string(),
                        "ws" => net = if value.trim() == "true" { "ws" } else { "tcp" }.to_string(),
                        "tls" => tls = value.trim() == "true",
                        "ws-path" => path = value.trim().to_string(),
                        "ws-headers" => {
                            for header in value.trim().split('|') {
                                if let Some((header_name, header_value)) =
                                    header.trim().split_once(':')
                                {
                                    if header_name.trim() == "Host" {
                                        host = header_value.trim().to_string();
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }

                nodes.push(Proxy::vmess_construct(
                    V2RAY_DEFAULT_GROUP,
                    &name,
                    server,
                    port,
                    "",
                    &id,
                    0,
                    &net,
                    "auto",
                    &path,
                    &host,
                    tls,
                    None,
                    None,
                ));
            }
            _ if name == "shadowsocks" => {
                // Quantumult line: host:port followed by key=value options
                let host_port = &configs[0];
                let colon = match host_port.rfind(':') {
                    Some(pos) => pos,
                    None => continue,
                };
                let server = host_port[..colon].to_string();
                let port = match host_port[colon + 1..].parse::<u16>() {
                    Ok(p) if p > 0 => p,
                    _ => continue,
                };

                let mut method = String::new();
                let mut password = String::new();
                let mut remark = String::new();
                let mut protocol = String::new();
                let mut protocol_param = String::new();
                let mut obfs = String::new();
                let mut obfs_host = String::from("cloudfront.net");
                for item in &configs[1..] {
                    let (key, value) = match item.split_once('=') {
                        Some(pair) => pair,
                        None => continue,
                    };
                    match key.trim() {
                        "method" => method = value.trim().to_string(),
                        "password" => password = value.trim().to_string(),
                        "tag" => remark = value.trim().to_string(),
                        "ssr-protocol" => protocol = value.trim().to_string(),
                        "ssr-protocol-param" => protocol_param = value.trim().to_string(),
                        "obfs" => obfs = value.trim().to_string(),
                        "obfs-host" => obfs_host = value.trim().to_string(),
                        _ => {}
                    }
                }
                if remark.is_empty() {
                    remark = format!("{}:{}", server, port);
                }

                if !protocol.is_empty() {
                    nodes.push(Proxy::ssr_construct(
                        SSR_DEFAULT_GROUP,
                        &remark,
                        &server,
                        port,
                        &protocol,
                        &method,
                        &obfs,
                        &password,
                        &obfs_host,
                        &protocol_param,
                        None,
                        None,
                    ));
                } else {
                    let (plugin, plugin_opts) = if obfs.is_empty() {
                        (String::new(), String::new())
                    } else {
                        (
                            "simple-obfs".to_string(),
                            format!("obfs={};obfs-host={}", obfs, obfs_host),
                        )
                    };
                    nodes.push(Proxy::ss_construct(
                        SS_DEFAULT_GROUP,
                        &remark,
                        &server,
                        port,
                        &password,
                        &method,
                        &plugin,
                        &plugin_opts,
                        None,
                        None,
                    ));
                }
            }
            _ => continue,
        }
    }
    nodes.len() > before
}

/// Folds `obfs=...`/`obfs-host=...` trailing options into a simple-obfs
/// plugin spec.
fn collect_obfs_options(items: &[String]) -> (String, String) {
    let mut obfs = String::new();
    let mut obfs_host = String::from("cloudfront.net");
    for item in items {
        let (key, value) = match item.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        match key.trim() {
            "obfs" => obfs = value.trim().to_string(),
            "obfs-host" => obfs_host = value.trim().to_string(),
            _ => {}
        }
    }
    if obfs.is_empty() {
        (String::new(), String::new())
    } else {
        (
            "simple-obfs".to_string(),
            format!("obfs={};obfs-host={}", obfs, obfs_host),
        )
    }
}
