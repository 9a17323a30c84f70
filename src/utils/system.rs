use std::env;

/// Resolves the system proxy from the environment. The first non-empty of
/// `ALL_PROXY`, `HTTPS_PROXY`, `HTTP_PROXY` (upper- or lowercase) wins.
pub fn get_system_proxy() -> String {
    for key in [
        "ALL_PROXY",
        "all_proxy",
        "HTTPS_PROXY",
        "https_proxy",
        "HTTP_PROXY",
        "http_proxy",
    ] {
        if let Ok(value) = env::var(key) {
            if !value.is_empty() {
                return value;
            }
        }
    }
    String::new()
}
