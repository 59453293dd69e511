// File: ./src/client/http.rs
//! Shared HTTPS client used by the Google and Reddit collaborators.
use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL '{0}'")]
    InvalidUri(String),
    #[error("could not build request: {0}")]
    Request(#[from] http::Error),
    #[error("request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("could not read response body: {0}")]
    Body(#[from] hyper::Error),
    #[error("No valid system certificates found.")]
    NoCertificates,
}

/// A response already read into memory.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: HttpsClient,
    user_agent: String,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            return Err(HttpError::NoCertificates);
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        // http is allowed so tests can point the clients at a local mock server.
        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Self {
            inner: Client::builder(TokioExecutor::new()).build(https_connector),
            user_agent: user_agent.to_string(),
        })
    }

    /// Sends a request and reads the whole body, whatever the status.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        authorization: Option<&str>,
        body: Option<(&str, String)>,
    ) -> Result<HttpResponse, HttpError> {
        let uri: Uri = url
            .parse()
            .map_err(|_| HttpError::InvalidUri(url.to_string()))?;

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(uri)
            .header(USER_AGENT, &self.user_agent);
        if let Some(auth) = authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let request = match body {
            Some((content_type, payload)) => {
                builder.header(CONTENT_TYPE, content_type).body(payload)?
            }
            None => builder.body(String::new())?,
        };

        log::debug!("{} {}", method, url);
        let response = self.inner.request(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = String::from_utf8_lossy(&bytes).into_owned();
        log::debug!("{} {} -> {}", method, url, status);
        Ok(HttpResponse { status, body })
    }

    pub async fn get(&self, url: &str, authorization: &str) -> Result<HttpResponse, HttpError> {
        self.send(Method::GET, url, Some(authorization), None).await
    }

    pub async fn delete(&self, url: &str, authorization: &str) -> Result<HttpResponse, HttpError> {
        self.send(Method::DELETE, url, Some(authorization), None)
            .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        authorization: &str,
        json: String,
    ) -> Result<HttpResponse, HttpError> {
        self.send(method, url, Some(authorization), Some(("application/json", json)))
            .await
    }

    pub async fn post_form(
        &self,
        url: &str,
        authorization: &str,
        fields: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        self.send(
            Method::POST,
            url,
            Some(authorization),
            Some(("application/x-www-form-urlencoded", encode_form(fields))),
        )
        .await
    }
}

/// `application/x-www-form-urlencoded` body (also usable as a query string).
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
