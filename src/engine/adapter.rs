//! Connection adapter.
//!
//! # Responsibilities
//! - Pick plain TCP or TLS from the URL scheme
//! - Establish the TCP connection within the configured timeout
//! - Complete the HTTP/1.1 handshake and spawn the connection driver
//! - Build the outbound request with fixed and caller-supplied headers

use std::sync::{Arc, OnceLock};

use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::Request;
use hyper_util::rt::TokioIo;
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig as TlsConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use url::Url;

use crate::config::{user_agent, ClientConfig};
use crate::error::{ExecutionError, ExecutionResult};
use crate::request::RequestMethod;

/// Unified outbound body type: an empty body for GET/DELETE, a bounded
/// channel-fed stream for uploads.
pub(crate) type OutboundBody = BoxBody<Bytes, std::io::Error>;

/// An open, configured HTTP/1.1 connection.
///
/// The driver task polls the transport; dropping this aborts it, so the
/// socket is released on every exit path.
pub(crate) struct EstablishedConnection {
    pub(crate) sender: http1::SendRequest<OutboundBody>,
    driver: tokio::task::JoinHandle<()>,
}

impl Drop for EstablishedConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Open a connection for `url`, TLS or plain according to the scheme.
pub(crate) async fn open(
    config: &ClientConfig,
    url: &Url,
) -> ExecutionResult<EstablishedConnection> {
    let host = url
        .host_str()
        .ok_or_else(|| ExecutionError::Target(format!("no host in {url}")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ExecutionError::Target(format!("no port for {url}")))?;

    let tcp = match config.connect_timeout() {
        Some(limit) => tokio::time::timeout(limit, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ExecutionError::ConnectTimeout(limit))?
            .map_err(ExecutionError::Connect)?,
        None => TcpStream::connect((host, port))
            .await
            .map_err(ExecutionError::Connect)?,
    };

    match url.scheme() {
        "http" => handshake(TokioIo::new(tcp)).await,
        "https" => {
            let name = ServerName::try_from(host.to_string())
                .map_err(|e| ExecutionError::Target(format!("invalid TLS server name: {e}")))?;
            let tls = tls_connector()
                .connect(name, tcp)
                .await
                .map_err(ExecutionError::Tls)?;
            handshake(TokioIo::new(tls)).await
        }
        other => Err(ExecutionError::Target(format!(
            "unsupported scheme: {other}"
        ))),
    }
}

async fn handshake<T>(io: TokioIo<T>) -> ExecutionResult<EstablishedConnection>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake::<_, OutboundBody>(io).await?;
    let driver = tokio::spawn(async move {
        if let Err(error) = conn.await {
            tracing::debug!(error = %error, "connection driver terminated");
        }
    });
    Ok(EstablishedConnection { sender, driver })
}

fn tls_connector() -> &'static TlsConnector {
    static CONNECTOR: OnceLock<TlsConnector> = OnceLock::new();
    CONNECTOR.get_or_init(|| {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = TlsConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    })
}

/// Build the outbound request: origin-form target, fixed headers, optional
/// body metadata, then every caller header appended in order.
pub(crate) fn build_request(
    config: &ClientConfig,
    url: &Url,
    method: RequestMethod,
    caller_headers: &[(String, String)],
    content_type: Option<&(String, String)>,
    content_length: Option<u64>,
    body: OutboundBody,
) -> ExecutionResult<Request<OutboundBody>> {
    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let mut request = Request::builder()
        .method(as_hyper_method(method))
        .uri(target)
        .body(body)
        .map_err(|e| ExecutionError::Target(e.to_string()))?;

    let host_value = match url.port() {
        Some(port) => format!("{}:{port}", url.host_str().unwrap_or_default()),
        None => url.host_str().unwrap_or_default().to_string(),
    };

    let headers = request.headers_mut();
    headers.insert(header::HOST, header_value(&host_value)?);
    headers.insert(
        header::USER_AGENT,
        header_value(
            config
                .user_agent
                .as_deref()
                .unwrap_or_else(|| user_agent::default_user_agent()),
        )?,
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));

    if let Some((name, value)) = content_type {
        headers.insert(header_name(name)?, header_value(value)?);
    }
    if let Some(len) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    for (name, value) in caller_headers {
        headers.append(header_name(name)?, header_value(value)?);
    }

    Ok(request)
}

fn as_hyper_method(method: RequestMethod) -> hyper::Method {
    match method {
        RequestMethod::Get => hyper::Method::GET,
        RequestMethod::Post => hyper::Method::POST,
        RequestMethod::Put => hyper::Method::PUT,
        RequestMethod::Delete => hyper::Method::DELETE,
    }
}

fn header_name(name: &str) -> ExecutionResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ExecutionError::Header(name.to_string()))
}

fn header_value(value: &str) -> ExecutionResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ExecutionError::Header(value.to_string()))
}
