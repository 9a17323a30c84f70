use log::{info, warn};

use crate::models::Proxy;
use crate::parser::explodes::{explode, explode_conf_content};
use crate::utils::file::{file_exists, file_get};
use crate::utils::http::{web_get_content_async, ProxyConfig};
use crate::utils::matcher::reg_find;
use crate::utils::network::is_link;
use crate::utils::system::get_system_proxy;
use crate::utils::url::{get_url_arg, url_decode};

/// Settings threaded through one source's parse run.
#[derive(Debug, Clone, Default)]
pub struct ParseSettings {
    /// Proxy for fetching the subscription itself.
    pub proxy: ProxyConfig,
    /// Group label override from the request.
    pub custom_group: String,
    /// Port override applied to every parsed node.
    pub custom_port: Option<u16>,
    /// Whether local-file sources may be read.
    pub authorized: bool,
}

/// Fetches one source and appends its nodes, tagged with `group_id`, to
/// `all_nodes`. A source is a subscription URL, a local file path, or a
/// single proxy link.
pub async fn add_nodes(
    link: &str,
    all_nodes: &mut Vec<Proxy>,
    group_id: i32,
    settings: &ParseSettings,
) -> Result<(), String> {
    let mut link = link.trim().replace('"', "");

    let mut custom_group = settings.custom_group.clone();
    if link.starts_with("tag:") {
        if let Some(comma) = link.find(',') {
            custom_group = link[4..comma].to_string();
            link = link[comma + 1..].to_string();
        }
    }

    let mut nodes: Vec<Proxy> = Vec::new();

    if is_link(&link) || link.starts_with("surge:///install-config") {
        if link.starts_with("surge:///install-config") {
            link = url_decode(&get_url_arg(&link, "url"));
        }
        info!("Fetching node data from url '{}'.", link);

        let mut body = web_get_content_async(&link, &settings.proxy)
            .await
            .unwrap_or_default();
        if body.is_empty() {
            // retry through the system proxy before giving up
            let system_proxy = get_system_proxy();
            if !system_proxy.is_empty() {
                warn!("Cannot download subscription directly, retrying with system proxy.");
                body = web_get_content_async(
                    &link,
                    &ProxyConfig {
                        proxy: Some(system_proxy),
                    },
                )
                .await
                .unwrap_or_default();
            }
        }
        if body.is_empty() {
            return Err(format!("Cannot download subscription data from '{}'", link));
        }

        if explode_conf_content(&body, &mut nodes).await == 0 {
            return Err(format!("Invalid subscription from '{}'", link));
        }
    } else if file_exists(&link).await {
        if !settings.authorized {
            return Err("Not authorized to read local files".to_string());
        }
        let content = file_get(&link).await.map_err(|e| e.to_string())?;
        if explode_conf_content(&content, &mut nodes).await == 0 {
            return Err(format!("Invalid configuration file '{}'", link));
        }
    } else {
        let mut node = Proxy::default();
        if !explode(&link, &mut node) {
            return Err("No valid link found".to_string());
        }
        nodes.push(node);
    }

    for node in &mut nodes {
        node.group_id = group_id;
        if !custom_group.is_empty() {
            node.group = custom_group.clone();
        }
        if let Some(port) = settings.custom_port {
            node.port = port;
        }
    }
    all_nodes.append(&mut nodes);
    Ok(())
}

/// Drops nodes failing the include/exclude remark filter and assigns dense
/// ids to the survivors, preserving input order.
pub fn filter_nodes(nodes: &mut Vec<Proxy>, include_remarks: &[String], exclude_remarks: &[String]) {
    nodes.retain(|node| {
        if should_ignore(node, include_remarks, exclude_remarks) {
            info!(
                "Node {} - {} has been ignored and will not be added.",
                node.group, node.remark
            );
            false
        } else {
            true
        }
    });
    for (index, node) in nodes.iter_mut().enumerate() {
        node.id = index as u32;
    }
}

/// A node is dropped when an exclude pattern matches its remark, or when
/// include patterns exist and none of them match.
fn should_ignore(node: &Proxy, include_remarks: &[String], exclude_remarks: &[String]) -> bool {
    let excluded = exclude_remarks
        .iter()
        .any(|pattern| reg_find(&node.remark, pattern));
    let included = include_remarks.is_empty()
        || include_remarks
            .iter()
            .any(|pattern| reg_find(&node.remark, pattern));
    excluded || !included
}
