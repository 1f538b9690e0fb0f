// tests/server_lifecycle.rs

use std::path::PathBuf;

use assetpipe::errors::AssetpipeError;
use assetpipe::server::{LiveReloadServer, ReloadHandle, ServerConfig};
use assetpipe_test_utils::{TestProject, init_tracing, with_timeout};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn config(base_dir: PathBuf, port: u16) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        base_dir,
        notify: false,
    }
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn serves_built_pages_then_shuts_down() {
    init_tracing();
    let project = TestProject::new();
    project.write("dist/index.html", "<html><body><h1>home</h1></body></html>");

    let server = LiveReloadServer::start(
        config(project.path("dist"), 0),
        ReloadHandle::new("dist", true),
    )
    .await
    .unwrap();
    let addr = server.local_addr();
    assert_ne!(addr.port(), 0);

    let response = with_timeout(get(addr, "/")).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("<h1>home</h1>"));
    assert!(response.contains("/__livereload.js"));

    let response = with_timeout(get(addr, "/missing.html")).await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");

    with_timeout(server.shutdown()).await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn port_in_use_is_a_server_error() {
    init_tracing();
    let project = TestProject::new();
    let first = LiveReloadServer::start(
        config(project.path("dist"), 0),
        ReloadHandle::new("dist", true),
    )
    .await
    .unwrap();

    let err = LiveReloadServer::start(
        config(project.path("dist"), first.local_addr().port()),
        ReloadHandle::new("dist", true),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AssetpipeError::Server(_)), "{err:?}");

    first.shutdown().await.unwrap();
}
