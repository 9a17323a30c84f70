//! Canonical proxy node model.
//!
//! Every parser produces [`Proxy`] records and every emitter consumes
//! them; the record is format-independent and constructed only through the
//! functions in [`crate::models::builder`].

use linked_hash_map::LinkedHashMap;

/// Protocols the pipeline can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Unknown,
    Shadowsocks,
    ShadowsocksR,
    VMess,
    Socks5,
    HTTP,
    HTTPS,
}

impl ProxyType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "SS",
            ProxyType::ShadowsocksR => "SSR",
            ProxyType::VMess => "VMess",
            ProxyType::Socks5 => "SOCKS5",
            ProxyType::HTTP => "HTTP",
            ProxyType::HTTPS => "HTTPS",
            ProxyType::Unknown => "Unknown",
        }
    }
}

/// A single proxy endpoint in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    pub proxy_type: ProxyType,
    /// Dense sequence number, assigned after filtering.
    pub id: u32,
    /// Index of the source URL this node came from.
    pub group_id: i32,
    pub group: String,
    pub remark: String,
    pub server: String,
    pub port: u16,

    pub username: Option<String>,
    pub password: Option<String>,
    pub method: Option<String>,
    pub plugin: Option<String>,
    pub plugin_opts: LinkedHashMap<String, String>,

    pub protocol: Option<String>,
    pub protocol_param: Option<String>,
    pub obfs: Option<String>,
    pub obfs_param: Option<String>,

    pub uuid: Option<String>,
    pub alter_id: u16,
    pub transport: Option<String>,
    pub fake_type: Option<String>,
    pub tls_secure: bool,
    pub host: Option<String>,
    pub path: Option<String>,

    pub udp: Option<bool>,
    pub tfo: Option<bool>,
}

impl Default for Proxy {
    fn default() -> Self {
        Proxy {
            proxy_type: ProxyType::Unknown,
            id: 0,
            group_id: 0,
            group: String::new(),
            remark: String::new(),
            server: String::new(),
            port: 0,
            username: None,
            password: None,
            method: None,
            plugin: None,
            plugin_opts: LinkedHashMap::new(),
            protocol: None,
            protocol_param: None,
            obfs: None,
            obfs_param: None,
            uuid: None,
            alter_id: 0,
            transport: None,
            fake_type: None,
            tls_secure: false,
            host: None,
            path: None,
            udp: None,
            tfo: None,
        }
    }
}

impl Proxy {
    /// Serializes plugin options back to the `key=value;key=value` wire
    /// form, preserving insertion order.
    pub fn plugin_opts_str(&self) -> String {
        self.plugin_opts
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Parses a `key=value;key=value` plugin option string into an
/// order-preserving map. Entries without `=` are kept as bare flags.
pub fn parse_plugin_opts(opts: &str) -> LinkedHashMap<String, String> {
    let mut map = LinkedHashMap::new();
    for part in opts.split(';') {
        if part.is_empty() {
            continue;
        }
        match part.find('=') {
            Some(eq) => map.insert(part[..eq].to_string(), part[eq + 1..].to_string()),
            None => map.insert(part.to_string(), String::new()),
        };
    }
    map
}

/// Shadowsocks stream and AEAD cipher names.
pub const SS_CIPHERS: [&str; 19] = [
    "rc4-md5",
    "aes-128-gcm",
    "aes-192-gcm",
    "aes-256-gcm",
    "aes-128-cfb",
    "aes-192-cfb",
    "aes-256-cfb",
    "aes-128-ctr",
    "aes-192-ctr",
    "aes-256-ctr",
    "camellia-128-cfb",
    "camellia-192-cfb",
    "camellia-256-cfb",
    "bf-cfb",
    "chacha20-ietf-poly1305",
    "xchacha20-ietf-poly1305",
    "salsa20",
    "chacha20",
    "chacha20-ietf",
];

/// Ciphers representable in SSR links.
pub const SSR_CIPHERS: [&str; 19] = SS_CIPHERS;

/// Normalizes legacy go-shadowsocks2 cipher spellings
/// (`AEAD_CHACHA20_POLY1305` and friends) to the canonical names.
pub fn normalize_ss_cipher(cipher: &str) -> String {
    if cipher == "AEAD_CHACHA20_POLY1305" {
        return "chacha20-ietf-poly1305".to_string();
    }
    if cipher.contains("AEAD") {
        return cipher.replace("AEAD_", "").replace('_', "-").to_lowercase();
    }
    cipher.to_string()
}

pub const SS_DEFAULT_GROUP: &str = "SSProvider";
pub const SSR_DEFAULT_GROUP: &str = "SSRCloud";
pub const V2RAY_DEFAULT_GROUP: &str = "V2RayProvider";
pub const SOCKS_DEFAULT_GROUP: &str = "SocksProvider";
pub const HTTP_DEFAULT_GROUP: &str = "HTTPProvider";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ss_cipher() {
        assert_eq!(
            normalize_ss_cipher("AEAD_CHACHA20_POLY1305"),
            "chacha20-ietf-poly1305"
        );
        assert_eq!(normalize_ss_cipher("AEAD_AES_128_GCM"), "aes-128-gcm");
        assert_eq!(normalize_ss_cipher("aes-256-gcm"), "aes-256-gcm");
    }

    #[test]
    fn test_plugin_opts_roundtrip() {
        let opts = parse_plugin_opts("obfs=http;obfs-host=cloudfront.net");
        assert_eq!(opts.get("obfs").map(String::as_str), Some("http"));
        let node = Proxy {
            plugin_opts: opts,
            ..Default::default()
        };
        assert_eq!(node.plugin_opts_str(), "obfs=http;obfs-host=cloudfront.net");
    }

    #[test]
    fn test_plugin_opts_bare_flag() {
        let opts = parse_plugin_opts("tls;host=example.com");
        assert_eq!(opts.get("tls").map(String::as_str), Some(""));
        let node = Proxy {
            plugin_opts: opts,
            ..Default::default()
        };
        assert_eq!(node.plugin_opts_str(), "tls;host=example.com");
    }
}
