//! Actix route registration and the thin handlers mapping HTTP onto the
//! orchestrator.

use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::api::{sub_process, SubQuery, SubResponse};
use crate::settings::{read_conf, refresh_rulesets, Settings};
use crate::utils::file::file_get;
use crate::utils::http::{web_get_async, ProxyConfig};
use crate::utils::url::url_decode;

/// Targets served through the per-dialect shortcut routes.
const SHORTCUT_TARGETS: [&str; 11] = [
    "clash", "clashr", "surge", "surfboard", "mellow", "ss", "ssr", "v2ray", "quan", "quanx",
    "ssd",
];

impl SubResponse {
    fn into_http_response(self) -> HttpResponse {
        let mut builder = match self.status_code {
            200 => HttpResponse::Ok(),
            400 => HttpResponse::BadRequest(),
            _ => HttpResponse::InternalServerError(),
        };
        builder
            .append_header(("Access-Control-Allow-Origin", "*"))
            .content_type(self.content_type)
            .body(self.body)
    }
}

fn plain_response(body: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .content_type("text/plain;charset=utf-8")
        .body(body.into())
}

async fn sub_handler(req: HttpRequest, query: web::Query<SubQuery>) -> HttpResponse {
    sub_process(req.query_string(), query.into_inner())
        .await
        .into_http_response()
}

/// `/clash`, `/surge`, ... are `/sub` with the target filled in.
async fn shortcut_handler(
    req: HttpRequest,
    path: web::Path<(String,)>,
    query: web::Query<SubQuery>,
) -> HttpResponse {
    let target = path.into_inner().0;
    if !SHORTCUT_TARGETS.contains(&target.as_str()) {
        return HttpResponse::NotFound()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .finish();
    }

    let mut query = query.into_inner();
    query.target = Some(target.clone());
    let raw_query = format!("{}&target={}", req.query_string(), target);
    sub_process(&raw_query, query).await.into_http_response()
}

async fn refresh_rules_handler() -> HttpResponse {
    refresh_rulesets().await;
    plain_response("done")
}

async fn read_conf_handler() -> HttpResponse {
    read_conf().await;
    plain_response("done")
}

#[derive(serde::Deserialize)]
struct GetQuery {
    url: Option<String>,
}

/// Proxy fetch of an arbitrary URL; available only outside API mode.
async fn get_handler(query: web::Query<GetQuery>) -> HttpResponse {
    if Settings::current().api_mode {
        return HttpResponse::NotFound()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .finish();
    }
    let url = url_decode(query.url.as_deref().unwrap_or(""));
    match web_get_async(&url, &ProxyConfig::default()).await {
        Ok(response) => plain_response(response.body),
        Err(_) => plain_response(""),
    }
}

#[derive(serde::Deserialize)]
struct GetLocalQuery {
    path: Option<String>,
}

/// Local file read; available only outside API mode.
async fn get_local_handler(query: web::Query<GetLocalQuery>) -> HttpResponse {
    if Settings::current().api_mode {
        return HttpResponse::NotFound()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .finish();
    }
    let path = url_decode(query.path.as_deref().unwrap_or(""));
    plain_response(file_get(&path).await.unwrap_or_default())
}

/// Answers CORS preflight for every path; anything else unmatched is 404.
async fn fallback_handler(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::Ok()
            .append_header(("Access-Control-Allow-Origin", "*"))
            .append_header(("Access-Control-Allow-Headers", "*"))
            .finish();
    }
    HttpResponse::NotFound()
        .append_header(("Access-Control-Allow-Origin", "*"))
        .finish()
}

/// Registers every endpoint.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(|| async { plain_response("subforge is running!") }))
        .route("/sub", web::get().to(sub_handler))
        .route("/refreshrules", web::get().to(refresh_rules_handler))
        .route("/readconf", web::get().to(read_conf_handler))
        .route("/get", web::get().to(get_handler))
        .route("/getlocal", web::get().to(get_local_handler))
        .route("/{target}", web::get().to(shortcut_handler))
        .default_service(web::route().to(fallback_handler));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_sub_requires_target() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get().uri("/sub?url=ss://x").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert_eq!(body, "Invalid request!");
    }

    #[actix_web::test]
    async fn test_shortcut_route_fills_target() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get()
            .uri("/ss?url=ss%3A%2F%2FYWVzLTEyOC1nY206cGFzcw%3D%3D%401.1.1.1%3A8388%23n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let headers = resp.headers();
        assert_eq!(
            headers.get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        let body = test::read_body(resp).await;
        assert!(!body.is_empty());
        assert_ne!(body, "Invalid request!");
    }

    #[actix_web::test]
    async fn test_unknown_shortcut_is_404() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get().uri("/loon").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_options_preflight() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::with_uri("/sub")
            .method(Method::OPTIONS)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Headers").unwrap(),
            "*"
        );
    }

    #[actix_web::test]
    async fn test_get_disabled_in_api_mode() {
        // default settings have api_mode enabled
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get()
            .uri("/get?url=https%3A%2F%2Fexample.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_refresh_rules_returns_done() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get().uri("/refreshrules").to_request();
        let resp = test::call_service(&app, req).await;
        let body = test::read_body(resp).await;
        assert_eq!(body, "done");
    }
}
