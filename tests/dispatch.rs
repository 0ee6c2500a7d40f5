//! End-to-end request handling against builds on disk.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get as get_route;
use tower::ServiceExt;

use prpl_server::http::{PushHandle, PushPolicy, X_REQUEST_ID};
use prpl_server::PrplServer;

mod common;

use common::{body_string, fake_classifier, get, links, LEGACY_UA, MODERN_UA};

fn server(site: &common::Site) -> PrplServer {
    PrplServer::builder(site.config())
        .project(common::modern_and_legacy_project())
        .classifier(fake_classifier())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_app_route_serves_modern_build() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server.router().oneshot(get("/home", MODERN_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=0");
    assert!(response.headers().contains_key(X_REQUEST_ID));
    assert_eq!(
        links(response.headers()),
        [
            "</static/modern/bower_components/webcomponentsjs/webcomponents-loader.js>; rel=preload; as=script",
            "</static/modern/src/shell.html>; rel=preload; as=document",
            "</static/modern/src/shared.js>; rel=preload; as=script",
            "</static/modern/lib.js>; rel=preload; as=script",
            "</static/modern/src/home.html>; rel=preload; as=document",
            "</static/modern/src/home.js>; rel=preload; as=script",
        ]
    );

    let body = body_string(response).await;
    assert!(body.contains(r#"<base href="/static/modern/">"#));
    assert!(body.contains("modern"));
}

#[tokio::test]
async fn test_app_route_serves_legacy_build() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server.router().oneshot(get("/home", LEGACY_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        links(response.headers()),
        [
            "</static/legacy/bower_components/webcomponentsjs/webcomponents-loader.js>; rel=preload; as=script",
            "</static/legacy/src/shell.html>; rel=preload; as=document",
            "</static/legacy/src/home.html>; rel=preload; as=document",
        ]
    );

    let body = body_string(response).await;
    assert!(body.contains(r#"<base href="/static/legacy/">"#));
}

#[tokio::test]
async fn test_unknown_route_has_no_links() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server
        .router()
        .oneshot(get("/some/deep/link", MODERN_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(links(response.headers()).is_empty());
    assert!(body_string(response).await.contains("/static/modern/"));
}

#[tokio::test]
async fn test_versioned_entrypoint_uses_manifest_links() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server
        .router()
        .oneshot(get("/static/modern/index.html", MODERN_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=0");
    assert_eq!(
        links(response.headers()),
        ["</static/modern/app.js>; rel=preload; as=script"]
    );
}

#[tokio::test]
async fn test_static_asset_is_immutable() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server
        .router()
        .oneshot(get("/static/modern/app.js", MODERN_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    assert_eq!(
        links(response.headers()),
        ["</static/modern/lib.js>; rel=preload; as=script"]
    );
    assert!(response.headers().get("service-worker-allowed").is_none());
    assert_eq!(body_string(response).await, "console.log('modern');");
}

#[tokio::test]
async fn test_service_worker_scope_and_caching() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server
        .router()
        .oneshot(get("/static/modern/service-worker.js", MODERN_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["service-worker-allowed"], "/");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "private, max-age=0");
}

#[tokio::test]
async fn test_missing_static_asset_is_not_found() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let response = server
        .router()
        .oneshot(get("/static/modern/missing.js", MODERN_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_range_request() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let request = Request::builder()
        .uri("/static/modern/app.js")
        .header(header::USER_AGENT, MODERN_UA)
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_string(response).await, "cons");
}

#[tokio::test]
async fn test_unsupported_browser() {
    let site = common::modern_and_legacy();
    let mut project = common::modern_and_legacy_project();
    project.builds.retain(|b| b.name == "modern");
    let server = PrplServer::builder(site.config())
        .project(project)
        .classifier(fake_classifier())
        .build()
        .unwrap();

    let response = server.router().oneshot(get("/home", LEGACY_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "This browser is not supported");

    let response = server
        .router()
        .oneshot(get("/static/modern/app.js", LEGACY_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = server.router().oneshot(get("/home", MODERN_UA)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_handler_override() {
    let site = common::modern_and_legacy();
    let server = PrplServer::builder(site.config())
        .project(common::modern_and_legacy_project())
        .classifier(fake_classifier())
        .static_handler("manifest.json", get_route(|| async { r#"{"name":"tenant"}"# }))
        .build()
        .unwrap();

    for build in ["modern", "legacy"] {
        let response = server
            .router()
            .oneshot(get(&format!("/static/{}/manifest.json", build), MODERN_UA))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"name":"tenant"}"#);
    }
}

#[tokio::test]
async fn test_push_when_transport_supports_it() {
    let site = common::modern_and_legacy();
    let policy: PushPolicy = Arc::new(|request: &Request<Body>| request.uri().path() != "/nopush");
    let server = PrplServer::builder(site.config())
        .project(common::modern_and_legacy_project())
        .classifier(fake_classifier())
        .should_push(policy)
        .build()
        .unwrap();

    let pusher = Arc::new(common::RecordingPusher::default());
    let mut request = get("/static/modern/app.js", MODERN_UA);
    request
        .extensions_mut()
        .insert(PushHandle::new(pusher.clone()));

    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(links(response.headers()).len(), 1);
    assert_eq!(*pusher.pushed.lock().unwrap(), ["/static/modern/lib.js"]);
}

#[tokio::test]
async fn test_no_push_without_transport() {
    let site = common::modern_and_legacy();
    let mut config = site.config();
    config.push.enabled = true;
    let server = PrplServer::builder(config)
        .project(common::modern_and_legacy_project())
        .classifier(fake_classifier())
        .build()
        .unwrap();

    let response = server.router().oneshot(get("/home", MODERN_UA)).await.unwrap();
    assert_eq!(links(response.headers()).len(), 6);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let site = common::modern_and_legacy();
    let server = server(&site);

    let mut request = get("/home", MODERN_UA);
    request
        .headers_mut()
        .insert(X_REQUEST_ID, "req-123".parse().unwrap());
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "req-123");
}

#[tokio::test]
async fn test_directory_redirect_stays_under_version() {
    let site = common::modern_and_legacy();
    site.write("modern/src/index.html", "<html>nested</html>");
    let server = server(&site);

    for (path, location) in [
        ("/static/modern", "/static/modern/"),
        ("/static/modern/src", "/static/modern/src/"),
    ] {
        let response = server.router().oneshot(get(path, MODERN_UA)).await.unwrap();
        assert!(response.status().is_redirection(), "{}", path);
        assert_eq!(response.headers()[header::LOCATION], location);
    }
}

#[tokio::test]
async fn test_encoded_path_finds_preload_links() {
    let site = common::modern_and_legacy();
    site.write(
        "modern/push-manifest.json",
        r#"{ "a b.js": { "c.js": { "type": "script" } } }"#,
    )
    .write("modern/a b.js", "var spaced;");
    let server = server(&site);

    let response = server
        .router()
        .oneshot(get("/static/modern/a%20b.js", MODERN_UA))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        links(response.headers()),
        ["</static/modern/c.js>; rel=preload; as=script"]
    );
    assert_eq!(body_string(response).await, "var spaced;");
}
