//! Failure injection: unreachable and misbehaving backends.

use stencil::config::{parse_config, StencilConfig};
use stencil::lifecycle::{bootstrap, StartupError};
use stencil::sources::SourceError;

mod common;

fn consul_config(url: &str) -> StencilConfig {
    parse_config(&format!(
        r#"
        environment = "prod"

        [consul]
        url = "{}"
        timeout_secs = 2

        [[data_sources]]
        kind = "consul"

        [[template_sources]]
        kind = "consul"
        "#,
        url
    ))
    .unwrap()
}

#[tokio::test]
async fn unreachable_backend_fails_startup() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let err = bootstrap(&consul_config(&format!("http://127.0.0.1:{}", port)))
        .await
        .unwrap_err();
    match err {
        StartupError::ListTemplates(failure) => {
            assert_eq!(failure.source_name, "consul");
            assert!(matches!(failure.error, SourceError::Unreachable { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_document_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.xml");
    std::fs::write(&path, "<settings><unclosed></settings>").unwrap();

    let config = parse_config(&format!(
        "[[data_sources]]\nkind = \"xml_file\"\npath = \"{}\"\nvar = \"settings\"\n",
        path.display()
    ))
    .unwrap();

    let err = bootstrap(&config).await.unwrap_err();
    match err {
        StartupError::Aggregate(failure) => {
            assert!(matches!(failure.error, SourceError::Parse { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn consul_sources_feed_the_snapshot() {
    let consul = common::MockConsul::start().await;
    consul.put_folder("stencil/globals/all", &[("region", "eu"), ("tier", "gold")]);
    consul.put_folder("stencil/templates/prod", &[("app.conf", "listen {{ port }}")]);
    consul.put_folder("stencil/values/prod/app.conf", &[("port", "8080")]);

    let server = common::start_server(consul_config(&consul.url())).await;

    let (status, body) = common::parse_response(&common::get(server.addr, "/v1/config").await);
    assert_eq!(status, 200);
    assert_eq!(
        body,
        r#"{"global":{"region":"eu","tier":"gold"},"per_template":{"app.conf":{"port":"8080"}}}"#
    );

    let (status, body) = common::parse_response(&common::get(server.addr, "/v1/template/app.conf").await);
    assert_eq!(status, 200);
    assert_eq!(body, r#"{"name":"app.conf","content":"listen {{ port }}"}"#);

    server.stop().await;
}

#[tokio::test]
async fn backend_error_is_contained_to_one_connection() {
    let consul = common::MockConsul::start().await;
    consul.put_folder("stencil/templates/prod", &[("app.conf", "body")]);

    let server = common::start_server(consul_config(&consul.url())).await;
    let (status, _) = common::parse_response(&common::get(server.addr, "/v1/templates").await);
    assert_eq!(status, 200);

    // The backend starts failing after startup.
    consul.set("/v1/kv/stencil/templates/prod/", 500, "boom");
    let (status, body) = common::parse_response(&common::get(server.addr, "/v1/templates").await);
    assert_eq!(status, 500);
    assert!(body.starts_with(r#"{"error":"#));
    assert!(body.contains("500"));

    // Other endpoints and later requests are unaffected.
    let (status, _) = common::parse_response(&common::get(server.addr, "/ping").await);
    assert_eq!(status, 200);
    let (status, _) = common::parse_response(&common::get(server.addr, "/v1/config").await);
    assert_eq!(status, 200);

    consul.put_folder("stencil/templates/prod", &[("app.conf", "body")]);
    let (status, body) = common::parse_response(&common::get(server.addr, "/v1/templates").await);
    assert_eq!(status, 200);
    assert_eq!(body, r#"["app.conf"]"#);

    server.stop().await;
}

#[tokio::test]
async fn template_removed_after_startup_is_not_found() {
    let consul = common::MockConsul::start().await;
    consul.put_folder("stencil/templates/prod", &[("app.conf", "body")]);

    let server = common::start_server(consul_config(&consul.url())).await;
    consul.set("/v1/kv/stencil/templates/prod/app.conf", 404, "");

    let (status, body) = common::parse_response(&common::get(server.addr, "/v1/template/app.conf").await);
    assert_eq!(status, 404);
    assert_eq!(body, r#"{"error":"not found"}"#);

    server.stop().await;
}
