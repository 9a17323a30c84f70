use crate::models::regex_match_config::RegexMatchConfigs;

/// Per-request flags handed to the emitters. Tri-state options stay `None`
/// when neither the request nor the preferences set them.
#[derive(Debug, Clone, Default)]
pub struct ExtraSettings {
    pub enable_rule_generator: bool,
    pub overwrite_original_rules: bool,
    pub rename_array: RegexMatchConfigs,
    pub emoji_array: RegexMatchConfigs,
    pub add_emoji: bool,
    pub remove_emoji: bool,
    pub append_proxy_type: bool,
    pub nodelist: bool,
    pub surge_ssr_path: String,
    pub managed_config_prefix: String,
    pub udp: Option<bool>,
    pub tfo: Option<bool>,
}
