//! Preferences (`pref.ini`) loading and the global configuration
//! snapshot.
//!
//! Readers call [`Settings::current`] and get an `Arc` snapshot that stays
//! consistent for the whole request. Writers (`read_conf`,
//! `refresh_rulesets`) serialize on a single configuring mutex and swap
//! the snapshot whole, so a request never observes a half-rebuilt
//! configuration.

use std::sync::{Arc, LazyLock, RwLock};

use log::{info, warn};
use tokio::sync::Mutex;

use crate::models::{
    parse_emoji_rules, parse_rename_rules, ProxyGroupConfig, ProxyGroupConfigs, RegexMatchConfigs,
    RulesetConfig, RulesetConfigs, RulesetContent,
};
use crate::rulesets::fetch_rulesets;
use crate::utils::file::{file_exists, file_get};
use crate::utils::ini_reader::IniReader;

static SETTINGS: LazyLock<RwLock<Arc<Settings>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Settings::default())));

/// Serializes preferences reload and ruleset refresh.
static CONFIGURING: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Global preferences plus the fetched ruleset cache.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pref_path: String,

    // [common]
    pub api_mode: bool,
    pub default_url: String,
    pub exclude_remarks: Vec<String>,
    pub include_remarks: Vec<String>,
    pub clash_rule_base: String,
    pub surge_rule_base: String,
    pub surfboard_rule_base: String,
    pub mellow_rule_base: String,
    pub append_proxy_type: bool,
    pub proxy_ruleset: String,
    pub proxy_subscription: String,
    pub renames: RegexMatchConfigs,

    // [surge_external_proxy]
    pub surge_ssr_path: String,

    // [managed_config]
    pub write_managed_config: bool,
    pub managed_config_prefix: String,

    // [emojis]
    pub add_emoji: bool,
    pub remove_old_emoji: bool,
    pub emojis: RegexMatchConfigs,

    // [ruleset]
    pub ruleset_enabled: bool,
    pub overwrite_original_rules: bool,
    pub update_ruleset_on_request: bool,
    pub custom_rulesets: RulesetConfigs,
    /// Fetched bodies for `custom_rulesets`, rebuilt by
    /// [`refresh_rulesets`].
    pub rulesets_content: Vec<RulesetContent>,

    // [clash_proxy_group]
    pub custom_proxy_groups: ProxyGroupConfigs,

    // [server]
    pub listen_address: String,
    pub listen_port: u32,

    // [advanced]
    pub print_debug_info: bool,
    pub max_pending_conns: u32,
    pub max_concur_threads: u32,
    pub custom_port: Option<u16>,

    /// Set by the `--cfw` flag: reload preferences and refresh rulesets
    /// on every request.
    pub cfw_child_process: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pref_path: "pref.ini".to_string(),
            api_mode: true,
            default_url: String::new(),
            exclude_remarks: Vec::new(),
            include_remarks: Vec::new(),
            clash_rule_base: String::new(),
            surge_rule_base: String::new(),
            surfboard_rule_base: String::new(),
            mellow_rule_base: String::new(),
            append_proxy_type: true,
            proxy_ruleset: String::new(),
            proxy_subscription: String::new(),
            renames: Vec::new(),
            surge_ssr_path: String::new(),
            write_managed_config: false,
            managed_config_prefix: String::new(),
            add_emoji: false,
            remove_old_emoji: false,
            emojis: Vec::new(),
            ruleset_enabled: false,
            overwrite_original_rules: true,
            update_ruleset_on_request: false,
            custom_rulesets: Vec::new(),
            rulesets_content: Vec::new(),
            custom_proxy_groups: Vec::new(),
            listen_address: "127.0.0.1".to_string(),
            listen_port: 25500,
            print_debug_info: false,
            max_pending_conns: 10,
            max_concur_threads: 4,
            custom_port: None,
            cfw_child_process: false,
        }
    }
}

impl Settings {
    /// Returns the current configuration snapshot.
    pub fn current() -> Arc<Settings> {
        SETTINGS
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Atomically installs a new snapshot.
    pub fn replace(settings: Settings) {
        if let Ok(mut guard) = SETTINGS.write() {
            *guard = Arc::new(settings);
        }
    }

    /// Parses a `pref.ini` document. Unknown items are ignored; missing
    /// items keep their defaults.
    pub fn load_from_str(content: &str) -> Settings {
        let mut settings = Settings::default();
        let mut ini = IniReader::new();
        if ini.parse(content).is_err() {
            warn!("Preferences file is empty or malformed, using defaults");
            return settings;
        }

        if ini.enter_section("common").is_ok() {
            if ini.item_exist("api_mode") {
                settings.api_mode = ini.get_bool("api_mode");
            }
            if ini.item_exist("default_url") {
                settings.default_url = ini.get("default_url");
            }
            settings.exclude_remarks = ini.get_all("exclude_remarks");
            settings.include_remarks = ini.get_all("include_remarks");
            if ini.item_exist("clash_rule_base") {
                settings.clash_rule_base = ini.get("clash_rule_base");
            }
            if ini.item_exist("surge_rule_base") {
                settings.surge_rule_base = ini.get("surge_rule_base");
            }
            if ini.item_exist("surfboard_rule_base") {
                settings.surfboard_rule_base = ini.get("surfboard_rule_base");
            }
            if ini.item_exist("mellow_rule_base") {
                settings.mellow_rule_base = ini.get("mellow_rule_base");
            }
            if ini.item_exist("append_proxy_type") {
                settings.append_proxy_type = ini.get_bool("append_proxy_type");
            }
            if ini.item_exist("proxy_ruleset") {
                settings.proxy_ruleset = ini.get("proxy_ruleset");
            }
            if ini.item_exist("proxy_subscription") {
                settings.proxy_subscription = ini.get("proxy_subscription");
            }
            settings.renames = parse_rename_rules(&ini.get_all("rename_node"));
        }

        if ini.enter_section("surge_external_proxy").is_ok() {
            settings.surge_ssr_path = ini.get("surge_ssr_path");
        }

        if ini.enter_section("managed_config").is_ok() {
            settings.write_managed_config = ini.get_bool("write_managed_config");
            settings.managed_config_prefix = ini.get("managed_config_prefix");
        }

        if ini.enter_section("emojis").is_ok() {
            settings.add_emoji = ini.get_bool("add_emoji");
            settings.remove_old_emoji = ini.get_bool("remove_old_emoji");
            settings.emojis = parse_emoji_rules(&ini.get_all("rule"));
        }

        if ini.enter_section("ruleset").is_ok() && ini.get_bool("enabled") {
            settings.ruleset_enabled = true;
            if ini.item_exist("overwrite_original_rules") {
                settings.overwrite_original_rules = ini.get_bool("overwrite_original_rules");
            }
            settings.update_ruleset_on_request = ini.get_bool("update_ruleset_on_request");
            settings.custom_rulesets = ini
                .get_all("surge_ruleset")
                .iter()
                .filter_map(|line| RulesetConfig::from_line(line))
                .collect();
        } else {
            settings.overwrite_original_rules = false;
            settings.update_ruleset_on_request = false;
        }

        if ini.enter_section("clash_proxy_group").is_ok() {
            settings.custom_proxy_groups = ini
                .get_all("custom_proxy_group")
                .iter()
                .filter_map(|spec| ProxyGroupConfig::from_spec(spec))
                .collect();
        }

        if ini.enter_section("server").is_ok() {
            if ini.item_exist("listen") {
                settings.listen_address = ini.get("listen");
            }
            if ini.item_exist("port") {
                settings.listen_port = ini.get_int("port") as u32;
            }
        }

        if ini.enter_section("advanced").is_ok() {
            settings.print_debug_info = ini.get_bool("print_debug_info");
            if ini.item_exist("max_pending_connections") {
                settings.max_pending_conns = ini.get_int("max_pending_connections") as u32;
            }
            if ini.item_exist("max_concurrent_threads") {
                settings.max_concur_threads = ini.get_int("max_concurrent_threads") as u32;
            }
            if ini.item_exist("custom_port") {
                settings.custom_port = ini.get("custom_port").parse().ok();
            }
        }

        settings
    }
}

/// Reloads preferences from disk, keeping the current ruleset cache and
/// runtime flags. Serialized with [`refresh_rulesets`].
pub async fn read_conf() {
    let _guard = CONFIGURING.lock().await;
    let previous = Settings::current();

    info!("Reading preference settings from '{}'.", previous.pref_path);
    let content = if file_exists(&previous.pref_path).await {
        file_get(&previous.pref_path).await.unwrap_or_default()
    } else {
        warn!("Preferences file '{}' not found.", previous.pref_path);
        String::new()
    };

    let mut settings = Settings::load_from_str(&content);
    settings.pref_path = previous.pref_path.clone();
    settings.cfw_child_process = previous.cfw_child_process;
    settings.rulesets_content = previous.rulesets_content.clone();
    Settings::replace(settings);
    info!("Read preference settings completed.");
}

/// Re-fetches every configured ruleset and swaps the cache. Serialized
/// with [`read_conf`]; readers keep their snapshot and never block each
/// other.
pub async fn refresh_rulesets() {
    let _guard = CONFIGURING.lock().await;
    let snapshot = Settings::current();

    let contents = fetch_rulesets(&snapshot.custom_rulesets, &snapshot.proxy_ruleset).await;
    let mut settings = (*snapshot).clone();
    settings.rulesets_content = contents;
    Settings::replace(settings);
}

/// Loads preferences at startup and primes the ruleset cache unless
/// rulesets are refreshed per request anyway.
pub async fn init_settings(pref_path: &str, cfw_child_process: bool) {
    {
        let mut settings = Settings::default();
        if !pref_path.is_empty() {
            settings.pref_path = pref_path.to_string();
        }
        settings.cfw_child_process = cfw_child_process;
        Settings::replace(settings);
    }
    read_conf().await;

    // the --cfw flag survives reloads
    if cfw_child_process {
        let mut settings = (*Settings::current()).clone();
        settings.cfw_child_process = true;
        Settings::replace(settings);
    }

    let settings = Settings::current();
    if !settings.update_ruleset_on_request && !settings.cfw_child_process {
        refresh_rulesets().await;
    }
}
