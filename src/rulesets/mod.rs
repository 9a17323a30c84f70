//! Ruleset aggregator: resolves each configured `(group, source)` pair
//! into its rule body.

use log::{info, warn};

use crate::models::{RulesetConfig, RulesetContent};
use crate::utils::file::{file_exists, file_get};
use crate::utils::http::{parse_proxy, web_get_content_async, ProxyConfig};

/// Fetches every configured ruleset. Inline `[]` rules are recorded
/// verbatim, local files are read, URLs are fetched directly first and
/// retried through the configured ruleset proxy when the direct fetch
/// comes back empty. Entries with an empty body are dropped.
pub async fn fetch_rulesets(
    configs: &[RulesetConfig],
    proxy_setting: &str,
) -> Vec<RulesetContent> {
    let mut contents = Vec::new();

    for config in configs {
        if config.url.starts_with("[]") {
            info!("Adding rule '{},{}'.", &config.url[2..], config.group);
            contents.push(RulesetContent::new(&config.group, "", &config.url));
            continue;
        }

        info!(
            "Updating ruleset url '{}' with group '{}'.",
            config.url, config.group
        );

        let body = if file_exists(&config.url).await {
            file_get(&config.url).await.unwrap_or_default()
        } else {
            let mut body = web_get_content_async(&config.url, &ProxyConfig::default())
                .await
                .unwrap_or_default();
            if body.is_empty() {
                body = web_get_content_async(&config.url, &parse_proxy(proxy_setting))
                    .await
                    .unwrap_or_default();
            }
            body
        };

        if body.is_empty() {
            warn!(
                "No data was fetched from ruleset '{}'. Skipping...",
                config.url
            );
            continue;
        }
        contents.push(RulesetContent::new(&config.group, &config.url, &body));
    }

    contents
}
