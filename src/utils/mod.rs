pub mod base64;
pub mod file;
pub mod http;
pub mod ini_reader;
pub mod matcher;
pub mod network;
pub mod node_manip;
pub mod string;
pub mod system;
pub mod url;

pub use file::{file_exists, file_get};
pub use http::{parse_proxy, web_get_async, web_get_content_async, ProxyConfig};
pub use matcher::{reg_find, reg_replace};
pub use string::{join, remove_emoji};
pub use url::{get_url_arg, url_decode, url_encode};
