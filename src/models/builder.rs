//! Constructors for [`Proxy`] records. Parsers go through these so that
//! per-protocol defaults live in one place.

use crate::models::proxy::{normalize_ss_cipher, parse_plugin_opts, Proxy, ProxyType};
use crate::utils::network::{is_ipv4, is_ipv6};

impl Proxy {
    pub fn common_construct(
        proxy_type: ProxyType,
        group: &str,
        remark: &str,
        server: &str,
        port: u16,
        udp: Option<bool>,
        tfo: Option<bool>,
    ) -> Self {
        Proxy {
            proxy_type,
            group: group.to_owned(),
            remark: remark.to_owned(),
            server: server.to_owned(),
            port,
            udp,
            tfo,
            ..Default::default()
        }
    }

    pub fn ss_construct(
        group: &str,
        remark: &str,
        server: &str,
        port: u16,
        password: &str,
        method: &str,
        plugin: &str,
        plugin_opts: &str,
        udp: Option<bool>,
        tfo: Option<bool>,
    ) -> Self {
        let mut node = Proxy::common_construct(
            ProxyType::Shadowsocks,
            group,
            remark,
            server,
            port,
            udp,
            tfo,
        );
        node.password = Some(password.to_owned());
        node.method = Some(normalize_ss_cipher(method));
        if !plugin.is_empty() {
            // obfs-local is the historical name of simple-obfs
            node.plugin = Some(if plugin == "obfs-local" {
                "simple-obfs".to_owned()
            } else {
                plugin.to_owned()
            });
            node.plugin_opts = parse_plugin_opts(plugin_opts);
        }
        node
    }

    pub fn ssr_construct(
        group: &str,
        remark: &str,
        server: &str,
        port: u16,
        protocol: &str,
        method: &str,
        obfs: &str,
        password: &str,
        obfs_param: &str,
        protocol_param: &str,
        udp: Option<bool>,
        tfo: Option<bool>,
    ) -> Self {
        let mut node = Proxy::common_construct(
            ProxyType::ShadowsocksR,
            group,
            remark,
            server,
            port,
            udp,
            tfo,
        );
        node.password = Some(password.to_owned());
        node.method = Some(method.to_owned());
        node.protocol = Some(protocol.to_owned());
        node.protocol_param = Some(protocol_param.to_owned());
        node.obfs = Some(obfs.to_owned());
        node.obfs_param = Some(obfs_param.to_owned());
        node
    }

    pub fn vmess_construct(
        group: &str,
        remark: &str,
        server: &str,
        port: u16,
        fake_type: &str,
        uuid: &str,
        alter_id: u16,
        transport: &str,
        cipher: &str,
        path: &str,
        host: &str,
        tls_secure: bool,
        udp: Option<bool>,
        tfo: Option<bool>,
    ) -> Self {
        let mut node =
            Proxy::common_construct(ProxyType::VMess, group, remark, server, port, udp, tfo);
        node.uuid = Some(if uuid.is_empty() {
            "00000000-0000-0000-0000-000000000000".to_owned()
        } else {
            uuid.to_owned()
        });
        node.alter_id = alter_id;
        node.method = Some(if cipher.is_empty() { "auto" } else { cipher }.to_owned());
        node.transport = Some(if transport.is_empty() { "tcp" } else { transport }.to_owned());
        node.fake_type = Some(fake_type.to_owned());
        node.tls_secure = tls_secure;
        // ws requires a host header; fall back to the server name unless it
        // is an IP literal
        node.host = Some(
            if host.is_empty() && !is_ipv4(server) && !is_ipv6(server) {
                server.to_owned()
            } else {
                host.trim().to_owned()
            },
        );
        node.path = Some(if path.is_empty() { "/" } else { path.trim() }.to_owned());
        node
    }

    pub fn socks_construct(
        group: &str,
        remark: &str,
        server: &str,
        port: u16,
        username: &str,
        password: &str,
        udp: Option<bool>,
        tfo: Option<bool>,
    ) -> Self {
        let mut node =
            Proxy::common_construct(ProxyType::Socks5, group, remark, server, port, udp, tfo);
        node.username = Some(username.to_owned());
        node.password = Some(password.to_owned());
        node
    }

    pub fn http_construct(
        group: &str,
        remark: &str,
        server: &str,
        port: u16,
        username: &str,
        password: &str,
        tls_secure: bool,
    ) -> Self {
        let mut node = Proxy::common_construct(
            if tls_secure {
                ProxyType::HTTPS
            } else {
                ProxyType::HTTP
            },
            group,
            remark,
            server,
            port,
            None,
            None,
        );
        node.username = Some(username.to_owned());
        node.password = Some(password.to_owned());
        node.tls_secure = tls_secure;
        node
    }
}
