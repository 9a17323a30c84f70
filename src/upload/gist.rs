//! Gist upload side-channel. Credentials live in `gistconf.ini` next to
//! the preferences; a failed upload is logged and never affects the
//! response being served.

use log::{error, info, warn};
use serde_json::json;

use crate::utils::file::{file_exists, file_get};
use crate::utils::http::{web_patch_async, web_post_async};
use crate::utils::ini_reader::IniReader;

const GIST_CONFIG: &str = "gistconf.ini";
const GIST_API: &str = "https://api.github.com/gists";

/// Uploads `content` as file `path` to the configured Gist. Creates a new
/// Gist when no id is configured yet, otherwise patches the existing one.
pub async fn upload_gist(name: &str, path: String, content: String) {
    if !file_exists(GIST_CONFIG).await {
        warn!("Gist config '{}' not found, skipping upload.", GIST_CONFIG);
        return;
    }
    let config = match file_get(GIST_CONFIG).await {
        Ok(config) => config,
        Err(e) => {
            error!("Cannot read '{}': {}", GIST_CONFIG, e);
            return;
        }
    };

    let mut ini = IniReader::new();
    let (token, id) = if ini.parse(&config).is_ok() && ini.enter_section("common").is_ok() {
        (ini.get("token"), ini.get("id"))
    } else {
        (String::new(), String::new())
    };
    if token.is_empty() {
        warn!("No Gist token configured, skipping upload.");
        return;
    }

    let mut files = serde_json::Map::new();
    files.insert(path.clone(), json!({ "content": content }));
    let payload = json!({
        "description": format!("subforge {}", name),
        "public": false,
        "files": files
    })
    .to_string();
    let headers = [
        ("Authorization", format!("token {}", token)),
        ("Accept", "application/vnd.github.v3+json".to_string()),
    ];

    let result = if id.is_empty() {
        web_post_async(GIST_API, payload, &headers).await
    } else {
        web_patch_async(&format!("{}/{}", GIST_API, id), payload, &headers).await
    };

    match result {
        Ok(response) if (200..300).contains(&response.status) => {
            info!("Uploaded '{}' to Gist.", path);
        }
        Ok(response) => {
            error!("Gist upload failed with status {}.", response.status);
        }
        Err(e) => {
            error!("Gist upload failed: {}", e);
        }
    }
}
