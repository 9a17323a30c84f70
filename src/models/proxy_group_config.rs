/// Kind of an extra proxy group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyGroupType {
    Select,
    UrlTest,
    Fallback,
    LoadBalance,
}

impl ProxyGroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyGroupType::Select => "select",
            ProxyGroupType::UrlTest => "url-test",
            ProxyGroupType::Fallback => "fallback",
            ProxyGroupType::LoadBalance => "load-balance",
        }
    }
}

/// An operator-supplied proxy group: name, kind, node selectors, and for
/// latency-probing kinds a test URL plus interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyGroupConfig {
    pub name: String,
    pub group_type: ProxyGroupType,
    /// Selectors: `[]literal` includes a proxy by exact name, anything else
    /// is a regex tested against node remarks.
    pub proxies: Vec<String>,
    pub url: String,
    pub interval: u32,
}

pub type ProxyGroupConfigs = Vec<ProxyGroupConfig>;

impl ProxyGroupConfig {
    /// Parses a backtick-delimited group spec:
    /// `name`kind`selector`...` and for url-test / fallback /
    /// load-balance the trailing two fields are `test-url`interval`.
    /// Returns `None` for malformed specs.
    pub fn from_spec(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split('`').collect();
        if parts.len() < 3 {
            return None;
        }

        let group_type = match parts[1] {
            "select" => ProxyGroupType::Select,
            "url-test" => ProxyGroupType::UrlTest,
            "fallback" => ProxyGroupType::Fallback,
            "load-balance" => ProxyGroupType::LoadBalance,
            _ => return None,
        };

        let mut url = String::new();
        let mut interval = 0u32;
        let selector_end = if group_type == ProxyGroupType::Select {
            parts.len()
        } else {
            if parts.len() < 5 {
                return None;
            }
            url = parts[parts.len() - 2].to_string();
            interval = match parts[parts.len() - 1].parse() {
                Ok(secs) if secs > 0 => secs,
                _ => return None,
            };
            parts.len() - 2
        };

        Some(ProxyGroupConfig {
            name: parts[0].to_string(),
            group_type,
            proxies: parts[2..selector_end].iter().map(|s| s.to_string()).collect(),
            url,
            interval,
        })
    }
}
