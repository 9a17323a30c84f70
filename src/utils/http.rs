use std::collections::HashMap;
use std::time::Duration;

use awc::Client;
use log::debug;
use thiserror::Error;

use crate::utils::system::get_system_proxy;

/// Timeout applied to every outbound request.
const REQUEST_TIMEOUT: u64 = 10;

const USER_AGENT: &str = "subforge";

/// Proxy selection for outbound fetches, resolved from the `SYSTEM` /
/// `NONE` / literal-URL preference values.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub proxy: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to '{url}' failed: {message}")]
    Request { url: String, message: String },
    #[error("failed to read response body from '{url}': {message}")]
    Body { url: String, message: String },
}

/// Resolves a preference proxy value into a [`ProxyConfig`].
pub fn parse_proxy(value: &str) -> ProxyConfig {
    match value {
        "SYSTEM" => {
            let proxy = get_system_proxy();
            ProxyConfig {
                proxy: if proxy.is_empty() { None } else { Some(proxy) },
            }
        }
        "NONE" | "" => ProxyConfig { proxy: None },
        url => ProxyConfig {
            proxy: Some(url.to_string()),
        },
    }
}

fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT))
        .finish()
}

/// Performs an HTTP GET. The configured proxy is recorded for diagnostics;
/// the awc client has no proxy support, so fetches always go direct.
pub async fn web_get_async(url: &str, proxy: &ProxyConfig) -> Result<HttpResponse, HttpError> {
    if let Some(p) = &proxy.proxy {
        debug!("Proxy '{}' configured for '{}', fetching direct.", p, url);
    }

    let client = build_client();
    let mut response = client
        .get(url)
        .insert_header(("User-Agent", USER_AGENT))
        .send()
        .await
        .map_err(|e| HttpError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status().as_u16();
    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(key.to_string(), v.to_string());
        }
    }

    let body = response.body().await.map_err(|e| HttpError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(HttpResponse {
        status,
        body: String::from_utf8_lossy(&body).to_string(),
        headers,
    })
}

/// GET that yields only the body of a 2xx response.
pub async fn web_get_content_async(url: &str, proxy: &ProxyConfig) -> Result<String, String> {
    match web_get_async(url, proxy).await {
        Ok(response) if (200..300).contains(&response.status) => Ok(response.body),
        Ok(response) => Err(format!("HTTP status {}", response.status)),
        Err(e) => Err(e.to_string()),
    }
}

/// POST with a JSON body plus custom headers, used by the Gist uploader.
pub async fn web_post_async(
    url: &str,
    data: String,
    headers: &[(&str, String)],
) -> Result<HttpResponse, HttpError> {
    send_with_body(awc::http::Method::POST, url, data, headers).await
}

/// PATCH with a JSON body plus custom headers, used by the Gist uploader.
pub async fn web_patch_async(
    url: &str,
    data: String,
    headers: &[(&str, String)],
) -> Result<HttpResponse, HttpError> {
    send_with_body(awc::http::Method::PATCH, url, data, headers).await
}

async fn send_with_body(
    method: awc::http::Method,
    url: &str,
    data: String,
    headers: &[(&str, String)],
) -> Result<HttpResponse, HttpError> {
    let client = build_client();
    let mut request = client
        .request(method, url)
        .insert_header(("User-Agent", USER_AGENT))
        .insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        request = request.insert_header((*name, value.clone()));
    }

    let mut response = request
        .send_body(data)
        .await
        .map_err(|e| HttpError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status().as_u16();
    let body = response.body().await.map_err(|e| HttpError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(HttpResponse {
        status,
        body: String::from_utf8_lossy(&body).to_string(),
        headers: HashMap::new(),
    })
}
