use crate::models::{Proxy, SOCKS_DEFAULT_GROUP};
use crate::utils::base64::url_safe_base64_decode;
use crate::utils::url::{get_url_arg, url_decode};

/// Parse a SOCKS link: the v2rayN `socks://base64(host:port)#remark`
/// shape or the Telegram `https://t.me/socks` / `tg://socks` shape with
/// `server`, `port`, `user`, `pass` query args.
pub fn explode_socks(link: &str, node: &mut Proxy) -> bool {
    let mut remark = String::new();
    let mut server = String::new();
    let mut port_str = String::new();
    let mut username = String::new();
    let mut password = String::new();

    if link.starts_with("socks://") {
        let mut body = link[8..].to_string();
        if let Some(hash) = body.find('#') {
            remark = url_decode(&body[hash + 1..]);
            body.truncate(hash);
        }
        let decoded = url_safe_base64_decode(&body);
        let colon = match decoded.rfind(':') {
            Some(pos) => pos,
            None => return false,
        };
        server = decoded[..colon].to_string();
        port_str = decoded[colon + 1..].to_string();
    } else if link.starts_with("https://t.me/socks") || link.starts_with("tg://socks") {
        server = get_url_arg(link, "server");
        port_str = get_url_arg(link, "port");
        username = get_url_arg(link, "user");
        password = get_url_arg(link, "pass");
    }

    let port = match port_str.parse::<u16>() {
        Ok(p) if p > 0 => p,
        _ => return false,
    };
    if server.is_empty() {
        return false;
    }
    if remark.is_empty() {
        remark = format!("{}:{}", server, port);
    }

    *node = Proxy::socks_construct(
        SOCKS_DEFAULT_GROUP,
        &remark,
        &server,
        port,
        &username,
        &password,
        None,
        None,
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProxyType;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_explode_socks_v2rayn() {
        let link = format!("socks://{}#sk", base64_encode("example.com:1080"));
        let mut node = Proxy::default();
        assert!(explode_socks(&link, &mut node));
        assert_eq!(node.proxy_type, ProxyType::Socks5);
        assert_eq!(node.server, "example.com");
        assert_eq!(node.port, 1080);
        assert_eq!(node.remark, "sk");
    }

    #[test]
    fn test_explode_socks_telegram() {
        let link = "https://t.me/socks?server=1.2.3.4&port=443&user=u&pass=p";
        let mut node = Proxy::default();
        assert!(explode_socks(link, &mut node));
        assert_eq!(node.server, "1.2.3.4");
        assert_eq!(node.port, 443);
        assert_eq!(node.username.as_deref(), Some("u"));
        assert_eq!(node.password.as_deref(), Some("p"));
        assert_eq!(node.remark, "1.2.3.4:443");
    }

    #[test]
    fn test_explode_socks_rejects_missing_port() {
        let mut node = Proxy::default();
        assert!(!explode_socks("tg://socks?server=1.2.3.4", &mut node));
    }
}
