//! Per-scheme link decoders and multi-node container decoders, plus the
//! auto-detection ladder that picks the right one for an arbitrary body.

pub mod clash;
pub mod netch;
pub mod socks;
pub mod ss;
pub mod ssr;
pub mod sstap;
pub mod surge;
pub mod vmess;

pub use clash::explode_clash;
pub use netch::{explode_netch, explode_netch_conf};
pub use socks::explode_socks;
pub use ss::{explode_ss, explode_ss_android, explode_ss_conf, explode_ssd};
pub use ssr::{explode_ssr, explode_ssr_conf};
pub use sstap::explode_sstap;
pub use surge::explode_surge;
pub use vmess::{explode_vmess, explode_vmess_conf};

use serde_json::Value;

use crate::models::Proxy;
use crate::utils::base64::url_safe_base64_decode;

/// Reads a JSON member as a string, tolerating numeric and boolean
/// encodings (GUI exports disagree on whether ports are strings).
pub(crate) fn json_str(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn json_str_or(value: &Value, key: &str, default: &str) -> String {
    let result = json_str(value, key);
    if result.is_empty() {
        default.to_string()
    } else {
        result
    }
}

/// Parse a single proxy link, dispatching on its scheme prefix. Returns
/// `false` (and leaves `node` untouched) for unrecognized or malformed
/// links.
pub fn explode(link: &str, node: &mut Proxy) -> bool {
    if link.starts_with("ssr://") {
        explode_ssr(link, node)
    } else if link.starts_with("vmess://") || link.starts_with("vmess1://") {
        explode_vmess(link, node)
    } else if link.starts_with("ss://") {
        explode_ss(link, node)
    } else if link.starts_with("socks://")
        || link.starts_with("https://t.me/socks")
        || link.starts_with("tg://socks")
    {
        explode_socks(link, node)
    } else if link.starts_with("Netch://") {
        explode_netch(link, node)
    } else {
        false
    }
}

/// Parse a whole subscription body, auto-detecting the container format.
/// Candidates are tried in a fixed order and a candidate that fails to
/// claim the document simply passes it to the next; the final fallback
/// treats the body as a (possibly base64-wrapped) line-delimited link
/// list. Returns the number of nodes appended.
pub async fn explode_conf_content(content: &str, nodes: &mut Vec<Proxy>) -> usize {
    let before = nodes.len();
    let trimmed = content.trim_start();

    if trimmed.starts_with("ssd://") {
        explode_ssd(trimmed, nodes);
    } else if explode_clash(content, nodes) {
        // YAML wins over INI when a document carries both shapes
    } else if explode_surge(content, nodes).await {
    } else if content.contains("\"version\"") {
        explode_ss_conf(content, nodes);
    } else if content.contains("\"serverSubscribes\"") {
        explode_ssr_conf(content, nodes);
    } else if content.contains("\"uiItem\"") || content.contains("vnext") {
        explode_vmess_conf(content, nodes);
    } else if content.contains("\"proxy_apps\"") {
        explode_ss_android(content, nodes);
    } else if content.contains("\"idInUse\"") {
        explode_sstap(content, nodes);
    } else if content.contains("\"local_address\"") && content.contains("\"local_port\"") {
        explode_ssr_conf(content, nodes);
    } else if content.contains("\"ModeFileNameType\"") {
        explode_netch_conf(content, nodes);
    } else {
        explode_sub(content, nodes);
    }

    nodes.len() - before
}

/// Parse a base64-wrapped or plain line-delimited list of single links.
/// Splits on LF, falling back to CR and then spaces.
pub fn explode_sub(sub: &str, nodes: &mut Vec<Proxy>) {
    let decoded = url_safe_base64_decode(sub.trim());
    let delimiter = if decoded.contains('\n') {
        '\n'
    } else if decoded.contains('\r') {
        '\r'
    } else {
        ' '
    };

    for line in decoded.split(delimiter) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut node = Proxy::default();
        if explode(line, &mut node) {
            nodes.push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_explode_dispatch() {
        let mut node = Proxy::default();
        assert!(explode(
            "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388#n",
            &mut node
        ));
        assert_eq!(node.proxy_type, ProxyType::Shadowsocks);
        assert!(!explode("unknown://link", &mut node));
    }

    #[test]
    fn test_explode_sub_base64_list() {
        let links = "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388#a\nss://YWVzLTEyOC1nY206cGFzcw==@2.2.2.2:8388#b\nbroken-line\n";
        let mut nodes = Vec::new();
        explode_sub(&base64_encode(links), &mut nodes);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].remark, "a");
        assert_eq!(nodes[1].remark, "b");
    }

    #[test]
    fn test_explode_sub_plain_list() {
        let links = "ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388#a\r";
        let mut nodes = Vec::new();
        explode_sub(links, &mut nodes);
        assert_eq!(nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_auto_detect_clash_over_json() {
        let doc = "Proxy:\n  - name: n\n    type: ss\n    server: a.com\n    port: 8388\n    cipher: aes-128-gcm\n    password: p\n";
        let mut nodes = Vec::new();
        assert_eq!(explode_conf_content(doc, &mut nodes).await, 1);
    }

    #[tokio::test]
    async fn test_auto_detect_windows_ss() {
        let doc = r#"{"version":"4.1.6","configs":[{"server":"a.com","server_port":8388,"password":"p","method":"aes-256-gcm","remarks":"W"}]}"#;
        let mut nodes = Vec::new();
        assert_eq!(explode_conf_content(doc, &mut nodes).await, 1);
        assert_eq!(nodes[0].remark, "W");
    }

    #[tokio::test]
    async fn test_auto_detect_fallback_line_list() {
        let body = base64_encode("ss://YWVzLTEyOC1nY206cGFzcw==@1.1.1.1:8388#x");
        let mut nodes = Vec::new();
        assert_eq!(explode_conf_content(&body, &mut nodes).await, 1);
    }

    #[tokio::test]
    async fn test_auto_detect_ssd() {
        let envelope = r#"{"airport":"A","port":443,"encryption":"aes-128-gcm","password":"p","servers":[{"server":"s.com"}]}"#;
        let link = format!("ssd://{}", base64_encode(envelope));
        let mut nodes = Vec::new();
        assert_eq!(explode_conf_content(&link, &mut nodes).await, 1);
        assert_eq!(nodes[0].group, "A");
    }
}
