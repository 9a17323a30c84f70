pub mod builder;
pub mod extra_settings;
pub mod proxy;
pub mod proxy_group_config;
pub mod regex_match_config;
pub mod ruleset;

pub use extra_settings::ExtraSettings;
pub use proxy::{
    normalize_ss_cipher, parse_plugin_opts, Proxy, ProxyType, HTTP_DEFAULT_GROUP,
    SOCKS_DEFAULT_GROUP, SSR_CIPHERS, SSR_DEFAULT_GROUP, SS_CIPHERS, SS_DEFAULT_GROUP,
    V2RAY_DEFAULT_GROUP,
};
pub use proxy_group_config::{ProxyGroupConfig, ProxyGroupConfigs, ProxyGroupType};
pub use regex_match_config::{
    parse_emoji_rules, parse_rename_rules, RegexMatchConfig, RegexMatchConfigs,
};
pub use ruleset::{RulesetConfig, RulesetConfigs, RulesetContent};
