//! End-to-end tests of the cert-chain endpoint, the liveness root, and
//! startup from an on-disk config.

use std::io::Write as _;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use amppkg::certs::CertStore;
use amppkg::{load_config, HttpServer, Packager};

async fn start_packager_from_toml() -> (SocketAddr, CertStore) {
    let cert = rcgen::generate_simple_self_signed(vec!["example.com".to_string()]).unwrap();
    let cert_pem = cert.cert.pem();
    let key_pem = cert.key_pair.serialize_pem();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");
    std::fs::write(&cert_path, &cert_pem).unwrap();
    std::fs::write(&key_path, &key_pem).unwrap();

    let mut config_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
LocalOnly = true
PackagerBase = "https://pkg.example"
CertFile = {cert_path:?}
KeyFile = {key_path:?}
GoogleAPIKey = "k"

[[URLSet]]
  [URLSet.Fetch]
  Scheme = ["https"]
  Domain = "amp.example"
  [URLSet.Sign]
  Domain = "example.com"
"#
    )
    .unwrap();

    let config = load_config(config_file.path()).unwrap();
    assert_eq!(config.packager_base, "https://pkg.example/");
    assert_eq!(config.port, 8080);

    let packager = Packager::new(&config, &cert_pem, &key_pem).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(HttpServer::new(packager).run(listener));

    (addr, CertStore::from_pem(&cert_pem).unwrap())
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn cert_endpoint_serves_the_chain_message() {
    let (addr, store) = start_packager_from_toml().await;

    let response = client()
        .get(format!("http://{addr}/amppkg/cert/{}", store.name()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/tls-cert-chain"
    );
    assert_eq!(
        response.headers().get("etag").unwrap().to_str().unwrap(),
        format!("\"{}\"", store.name())
    );
    assert_eq!(response.bytes().await.unwrap(), store.message());
}

#[tokio::test]
async fn wrong_cert_name_is_404() {
    let (addr, _) = start_packager_from_toml().await;

    let response = client()
        .get(format!("http://{addr}/amppkg/cert/wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn conditional_request_is_304() {
    let (addr, store) = start_packager_from_toml().await;

    let response = client()
        .get(format!("http://{addr}/amppkg/cert/{}", store.name()))
        .header("if-none-match", format!("\"{}\"", store.name()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 304);
}

#[tokio::test]
async fn range_request_is_206() {
    let (addr, store) = start_packager_from_toml().await;

    let response = client()
        .get(format!("http://{addr}/amppkg/cert/{}", store.name()))
        .header("range", "bytes=0-9")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 206);
    assert_eq!(response.bytes().await.unwrap(), &store.message()[..10]);
}

#[tokio::test]
async fn root_is_a_liveness_surface() {
    let (addr, _) = start_packager_from_toml().await;

    let response = client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hello world");

    let response = client()
        .get(format!("http://{addr}/anything-else"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn mismatched_key_fails_startup() {
    let cert = rcgen::generate_simple_self_signed(vec!["example.com".to_string()]).unwrap();
    let other = rcgen::generate_simple_self_signed(vec!["example.com".to_string()]).unwrap();

    let config = amppkg::Config {
        packager_base: "https://pkg.example/".to_string(),
        cert_file: "cert.pem".to_string(),
        key_file: "key.pem".to_string(),
        google_api_key: "k".to_string(),
        url_set: vec![amppkg::config::UrlSetConfig {
            sign: amppkg::config::UrlPatternConfig {
                domain: "example.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    };

    let result = Packager::new(&config, &cert.cert.pem(), &other.key_pair.serialize_pem());
    assert!(result.is_err());
}

#[tokio::test]
async fn uncovered_sign_domain_fails_startup() {
    let cert = rcgen::generate_simple_self_signed(vec!["example.com".to_string()]).unwrap();

    let config = amppkg::Config {
        packager_base: "https://pkg.example/".to_string(),
        cert_file: "cert.pem".to_string(),
        key_file: "key.pem".to_string(),
        google_api_key: "k".to_string(),
        url_set: vec![amppkg::config::UrlSetConfig {
            sign: amppkg::config::UrlPatternConfig {
                domain: "uncovered.example".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    };

    let result = Packager::new(&config, &cert.cert.pem(), &cert.key_pair.serialize_pem());
    assert!(result.is_err());
}
