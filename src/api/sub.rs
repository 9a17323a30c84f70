//! The per-request orchestrator: validates the query, fetches and parses
//! every source, filters and renames the nodes, and hands them to the
//! target dialect's emitter.

use log::{info, warn};
use serde::Deserialize;

use crate::generator::config::formats::{
    proxy_to_clash, proxy_to_mellow, proxy_to_quan, proxy_to_quanx, proxy_to_single, proxy_to_ssd,
    proxy_to_surge, SingleLinkTypes,
};
use crate::models::{ExtraSettings, Proxy, ProxyGroupConfig, RulesetContent};
use crate::parser::subparser::{add_nodes, filter_nodes, ParseSettings};
use crate::settings::{read_conf, refresh_rulesets, Settings};
use crate::upload::gist::upload_gist;
use crate::utils::base64::url_safe_base64_decode;
use crate::utils::file::{file_exists, file_get};
use crate::utils::http::{parse_proxy, web_get_content_async};
use crate::utils::network::is_link;
use crate::utils::node_manip::preprocess_nodes;

/// Query surface of `/sub`. Unknown parameters are ignored by the
/// deserializer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubQuery {
    pub target: Option<String>,
    pub url: Option<String>,
    pub group: Option<String>,
    pub upload: Option<String>,
    pub upload_path: Option<String>,
    pub ver: Option<String>,
    pub append_type: Option<String>,
    pub tfo: Option<String>,
    pub udp: Option<String>,
    pub list: Option<String>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub emoji: Option<String>,
    pub groups: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubResponse {
    pub status_code: u16,
    pub content_type: String,
    pub body: String,
}

impl SubResponse {
    fn plain(body: &str) -> Self {
        SubResponse {
            status_code: 200,
            content_type: "text/plain;charset=utf-8".to_string(),
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Clash { clash_r: bool },
    Surge(i32),
    Surfboard,
    Mellow,
    Ss,
    Ssr,
    V2ray,
    Quan,
    Quanx,
    Ssd,
}

impl Target {
    fn from_query(target: &str, ver: Option<&str>) -> Option<Target> {
        match target {
            "clash" => Some(Target::Clash { clash_r: false }),
            "clashr" => Some(Target::Clash { clash_r: true }),
            "surge" => {
                let ver = ver.and_then(|v| v.parse().ok()).unwrap_or(3);
                Some(Target::Surge(ver))
            }
            "surfboard" => Some(Target::Surfboard),
            "mellow" => Some(Target::Mellow),
            "ss" => Some(Target::Ss),
            "ssr" => Some(Target::Ssr),
            "v2ray" => Some(Target::V2ray),
            "quan" => Some(Target::Quan),
            "quanx" => Some(Target::Quanx),
            "ssd" => Some(Target::Ssd),
            _ => None,
        }
    }

    /// Base64-wrapped dialects are served without a charset, matching the
    /// upstream route table.
    fn content_type(self) -> &'static str {
        match self {
            Target::Ss | Target::Ssr | Target::V2ray | Target::Quan | Target::Ssd => "text/plain",
            _ => "text/plain;charset=utf-8",
        }
    }

    fn upload_name(self) -> String {
        match self {
            Target::Clash { clash_r: false } => "clash".to_string(),
            Target::Clash { clash_r: true } => "clashr".to_string(),
            Target::Surge(ver) => format!("surge{}", ver),
            Target::Surfboard => "surfboard".to_string(),
            Target::Mellow => "mellow".to_string(),
            Target::Ss => "ss".to_string(),
            Target::Ssr => "ssr".to_string(),
            Target::V2ray => "v2ray".to_string(),
            Target::Quan => "quan".to_string(),
            Target::Quanx => "quanx".to_string(),
            Target::Ssd => "ssd".to_string(),
        }
    }
}

fn query_flag(value: &Option<String>) -> Option<bool> {
    value.as_deref().map(|v| v == "true")
}

/// Reads a dialect base config from a local file, or over HTTP with the
/// system proxy.
async fn load_base_config(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if file_exists(path).await {
        return file_get(path).await.unwrap_or_default();
    }
    if is_link(path) {
        return web_get_content_async(path, &parse_proxy("SYSTEM"))
            .await
            .unwrap_or_default();
    }
    String::new()
}

/// Convert a subscription request to the target dialect. `raw_query` is
/// the original query string, kept verbatim for the managed-config
/// preamble.
pub async fn sub_process(raw_query: &str, query: SubQuery) -> SubResponse {
    // outside API mode the preferences are re-read for every request
    if !Settings::current().api_mode || Settings::current().cfw_child_process {
        read_conf().await;
    }
    let settings = Settings::current();

    let target = match query
        .target
        .as_deref()
        .and_then(|t| Target::from_query(t, query.ver.as_deref()))
    {
        Some(target) => target,
        None => return SubResponse::plain("Invalid request!"),
    };

    let url = match query.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => settings.default_url.clone(),
    };
    if url.is_empty() {
        return SubResponse::plain("Invalid request!");
    }

    if settings.update_ruleset_on_request || settings.cfw_child_process {
        refresh_rulesets().await;
    }
    let settings = Settings::current();

    // fetch and parse every source, tagging nodes with their source index
    let parse_settings = ParseSettings {
        proxy: parse_proxy(&settings.proxy_subscription),
        custom_group: query.group.clone().unwrap_or_default(),
        custom_port: settings.custom_port,
        authorized: !settings.api_mode,
    };
    let fetches = url.split('|').enumerate().map(|(group_id, source)| {
        let parse_settings = &parse_settings;
        async move {
            let mut batch: Vec<Proxy> = Vec::new();
            let result = add_nodes(source, &mut batch, group_id as i32, parse_settings).await;
            (source, batch, result)
        }
    });
    // sources fetch concurrently; the merge keeps the url parameter order
    let mut nodes: Vec<Proxy> = Vec::new();
    for (source, mut batch, result) in futures::future::join_all(fetches).await {
        if let Err(e) = result {
            warn!("Failed to add nodes from '{}': {}", source, e);
        }
        nodes.append(&mut batch);
    }

    let include_remarks = match query.include.as_deref().filter(|p| !p.is_empty()) {
        Some(pattern) => vec![pattern.to_string()],
        None => settings.include_remarks.clone(),
    };
    let exclude_remarks = match query.exclude.as_deref().filter(|p| !p.is_empty()) {
        Some(pattern) => vec![pattern.to_string()],
        None => settings.exclude_remarks.clone(),
    };
    filter_nodes(&mut nodes, &include_remarks, &exclude_remarks);
    if nodes.is_empty() {
        return SubResponse::plain("No nodes were found!");
    }

    let mut ext = ExtraSettings {
        enable_rule_generator: settings.ruleset_enabled,
        overwrite_original_rules: settings.overwrite_original_rules,
        rename_array: settings.renames.clone(),
        emoji_array: settings.emojis.clone(),
        add_emoji: settings.add_emoji,
        remove_emoji: settings.remove_old_emoji,
        append_proxy_type: settings.append_proxy_type,
        nodelist: query_flag(&query.list).unwrap_or(false),
        surge_ssr_path: settings.surge_ssr_path.clone(),
        managed_config_prefix: settings.managed_config_prefix.clone(),
        udp: query_flag(&query.udp),
        tfo: query_flag(&query.tfo),
    };
    if query.emoji.as_deref() == Some("true") {
        ext.add_emoji = true;
        ext.remove_emoji = true;
    }
    if let Some(append) = query_flag(&query.append_type) {
        ext.append_proxy_type = append;
    }

    preprocess_nodes(&mut nodes, &ext);

    // operator groups from preferences plus request-supplied extras
    let mut extra_groups = settings.custom_proxy_groups.clone();
    if let Some(encoded) = query.groups.as_deref().filter(|g| !g.is_empty()) {
        for spec in url_safe_base64_decode(encoded).lines() {
            if let Some(group) = ProxyGroupConfig::from_spec(spec.trim()) {
                extra_groups.push(group);
            }
        }
    }

    let rulesets: &[RulesetContent] = &settings.rulesets_content;

    info!("Generate target: {}", target.upload_name());
    let mut body = match target {
        Target::Clash { clash_r } => {
            let base = load_base_config(&settings.clash_rule_base).await;
            proxy_to_clash(&nodes, &base, rulesets, &extra_groups, clash_r, &ext)
        }
        Target::Surge(ver) => {
            let base = load_base_config(&settings.surge_rule_base).await;
            proxy_to_surge(&nodes, &base, rulesets, &extra_groups, ver, &ext)
        }
        Target::Surfboard => {
            let base = load_base_config(&settings.surfboard_rule_base).await;
            proxy_to_surge(&nodes, &base, rulesets, &extra_groups, 2, &ext)
        }
        Target::Mellow => {
            let base = load_base_config(&settings.mellow_rule_base).await;
            proxy_to_mellow(&nodes, &base, rulesets, &extra_groups, &ext)
        }
        Target::Ss => proxy_to_single(&nodes, SingleLinkTypes::ss(), &ext),
        Target::Ssr => proxy_to_single(&nodes, SingleLinkTypes::ssr(), &ext),
        Target::V2ray => proxy_to_single(&nodes, SingleLinkTypes::vmess(), &ext),
        Target::Quan => proxy_to_quan(&nodes, &ext),
        Target::Quanx => proxy_to_quanx(&nodes, &ext),
        Target::Ssd => proxy_to_ssd(&nodes, query.group.as_deref().unwrap_or(""), &ext),
    };

    // Surge and Surfboard clients re-download their config from here
    if matches!(target, Target::Surge(_) | Target::Surfboard)
        && settings.write_managed_config
        && !settings.managed_config_prefix.is_empty()
        && !ext.nodelist
    {
        body = format!(
            "#!MANAGED-CONFIG {}/sub?{}\n\n{}",
            settings.managed_config_prefix, raw_query, body
        );
    }

    if query_flag(&query.upload).unwrap_or(false) {
        let name = target.upload_name();
        let path = query
            .upload_path
            .clone()
            .unwrap_or_else(|| name.clone());
        let content = body.clone();
        // fire and forget; an upload failure never affects the response
        actix_web::rt::spawn(async move {
            upload_gist(&name, path, content).await;
        });
    }

    SubResponse {
        status_code: 200,
        content_type: target.content_type().to_string(),
        body,
    }
}
