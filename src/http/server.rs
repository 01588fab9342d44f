//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request timeout)
//! - Run the packaging pipeline: match → fetch → validate → sanitize →
//!   build → serialize
//! - Serve the cert-chain endpoint and the liveness root

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::http::header::{self, HeaderMap};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use p256::ecdsa::SigningKey;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::certs::{publisher, CertStore};
use crate::config::Config;
use crate::fetch::{read_body, validate_fetch, Fetcher};
use crate::headers::sanitize;
use crate::http::error::RequestError;
use crate::policy::Policy;
use crate::sxg::{Exchange, ExchangeSigner, MI_RECORD_SIZE, SIGNED_EXCHANGE_CONTENT_TYPE};

/// Path prefix the cert-chain endpoint is served under. No leading
/// slash: the cert URL is resolved relative to PackagerBase.
pub const CERT_URL_PREFIX: &str = "amppkg/cert";

/// Where clients may check for signature revocation. Fixed to the AMP
/// null-validity endpoint.
const VALIDITY_URL: &str = "https://cdn.ampproject.org/null-validity";

/// Signatures are back-dated to tolerate client clock skew.
const SIGNATURE_BACKDATE: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetime past now; with the back-date this stays under the 604800 s
/// protocol ceiling.
const SIGNATURE_LIFETIME: Duration = Duration::from_secs(6 * 24 * 60 * 60);

/// Ceiling on handling one request, dominating the 60 s upstream budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Immutable per-process packaging state, shared by every request.
pub struct Packager {
    policy: Policy,
    fetcher: Fetcher,
    certs: CertStore,
    key: SigningKey,
    base_url: Url,
    validity_url: Url,
}

impl Packager {
    /// Materialize startup state from a validated config and the PEM
    /// contents of the cert chain and private key. Runs the cert/key
    /// binding checks; any failure here is fatal.
    pub fn new(config: &Config, cert_pem: &str, key_pem: &str) -> anyhow::Result<Self> {
        use anyhow::Context as _;

        let certs = CertStore::from_pem(cert_pem).context("parsing certificate chain")?;
        let key = crate::certs::load_signing_key(key_pem).context("parsing private key")?;
        certs
            .verify_key_binding(&key)
            .context("checking key against leaf certificate")?;
        for (i, set) in config.url_set.iter().enumerate() {
            certs
                .verify_covers_domain(&set.sign.domain)
                .with_context(|| format!("checking certificate against URLSet.{i}.Sign"))?;
        }

        let policy = Policy::from_config(&config.url_set).context("compiling URL sets")?;
        let base_url = Url::parse(&config.packager_base).context("parsing PackagerBase")?;
        let validity_url = Url::parse(VALIDITY_URL).expect("fixed validity URL parses");
        let fetcher = Fetcher::new().context("building upstream client")?;

        Ok(Packager {
            policy,
            fetcher,
            certs,
            key,
            base_url,
            validity_url,
        })
    }

    /// Public URL of the cert-chain message, resolved under PackagerBase.
    fn cert_url(&self) -> Result<Url, RequestError> {
        self.base_url
            .join(&format!("{}/{}", CERT_URL_PREFIX, self.certs.name()))
            .map_err(|e| RequestError::internal(format!("error building cert URL: {e}")))
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    packager: Arc<Packager>,
}

/// HTTP server for the packager.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around the given packager state.
    pub fn new(packager: Packager) -> Self {
        let state = AppState {
            packager: Arc::new(packager),
        };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(hello))
            .route("/priv-amppkg/doc", get(package_doc).post(package_doc))
            .route(&format!("/{CERT_URL_PREFIX}/{{name}}"), get(serve_cert))
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness surface; only the exact root path answers.
async fn hello() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "hello world")
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// `fetch`/`sign` form values, from the query string or a form-encoded
/// body.
#[derive(Debug, Deserialize)]
struct DocParams {
    fetch: Option<String>,
    sign: Option<String>,
}

/// The packaging pipeline behind `/priv-amppkg/doc`.
async fn package_doc(
    State(state): State<AppState>,
    params: Result<Form<DocParams>, FormRejection>,
) -> Result<Response, RequestError> {
    let Form(params) =
        params.map_err(|e| RequestError::bad_request(format!("error reading form: {e}")))?;
    let packager = &state.packager;

    let fetch_url = parse_query_url(params.fetch.as_deref(), "fetch")?;
    let sign_url = parse_query_url(params.sign.as_deref(), "sign")?;

    let url_set = packager
        .policy
        .select(&fetch_url, &sign_url)
        .ok_or_else(|| RequestError::bad_request("fetch/sign URLs do not match config"))?;
    let error_on_stateful_headers = url_set.fetch.error_on_stateful_headers;

    let (request_headers, response) = packager.fetcher.fetch(&fetch_url).await?;
    let status = response.status();
    let mut response_headers = response.headers().clone();
    validate_fetch(&request_headers, status, &response_headers)?;

    // Headers must be settled before the body lands in the exchange.
    sanitize(&mut response_headers, error_on_stateful_headers)?;
    let body = read_body(response).await?;

    let mut exchange = Exchange::new(sign_url, status, response_headers, &body, MI_RECORD_SIZE);
    let now = SystemTime::now();
    let signer = ExchangeSigner {
        date: now - SIGNATURE_BACKDATE,
        expires: now + SIGNATURE_LIFETIME,
        cert_sha256: packager.certs.leaf_sha256(),
        cert_url: packager.cert_url()?,
        validity_url: packager.validity_url.clone(),
        key: &packager.key,
    };
    exchange
        .add_signature_header(&signer)
        .map_err(|e| RequestError::internal(format!("error signing exchange: {e}")))?;

    Ok((
        [(header::CONTENT_TYPE, SIGNED_EXCHANGE_CONTENT_TYPE)],
        exchange.serialize(),
    )
        .into_response())
}

/// Parse a required form value as an absolute URL.
fn parse_query_url(raw: Option<&str>, name: &str) -> Result<Url, RequestError> {
    let raw = raw.unwrap_or("");
    if raw.is_empty() {
        return Err(RequestError::bad_request(format!("{name} URL is unspecified")));
    }
    Url::parse(raw)
        .map_err(|e| RequestError::bad_request(format!("error parsing {name} url: {e}")))
}

/// The cert-chain endpoint.
async fn serve_cert(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request_headers: HeaderMap,
) -> Response {
    publisher::respond(&state.packager.certs, &name, &request_headers)
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
