use crate::config::Scheme;
use crate::constants::{DEFAULT_CAMERA, DEFAULT_TIMEOUT, OK_CODES, PTZ_CGI};
use crate::error::{Result, VapixError};
use crate::protocol::{Query, error_text};
use chrono::Utc;
use digest_auth::{AuthContext, WwwAuthenticateHeader};
use reqwest::header::{AUTHORIZATION, HeaderMap, WWW_AUTHENTICATE};
use reqwest::{Response, StatusCode};
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::{Instrument, Span, debug, trace, warn};
use url::Url;

/// Reply to a successful command: status is 200 or 204.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: u16,
    pub body: String,
}

impl CommandResponse {
    pub fn is_no_content(&self) -> bool {
        self.status == StatusCode::NO_CONTENT.as_u16()
    }

    pub fn text(&self) -> &str {
        &self.body
    }
}

/// Client for one VAPIX camera.
///
/// Holds only immutable connection parameters plus a monotonically
/// increasing request timestamp, so a single value can be shared between
/// tasks behind an `Arc`. No I/O happens until the first command.
pub struct VapixCam {
    pub(crate) scheme: Scheme,
    pub(crate) host: String,
    pub(crate) port: Option<u16>,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) camera: u32,
    pub(crate) timeout: Duration,
    pub(crate) span: Span,

    client: OnceLock<reqwest::Client>,
    last_timestamp: AtomicI64,
}

impl VapixCam {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let host = host.into();
        let span = tracing::info_span!("vapix", host = %host);

        Self {
            scheme: Scheme::Http,
            host,
            port: None,
            username: username.into(),
            password: password.into(),
            camera: DEFAULT_CAMERA,
            timeout: DEFAULT_TIMEOUT,
            span,
            client: OnceLock::new(),
            last_timestamp: AtomicI64::new(0),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Select the video channel sent as `camera=` with every PTZ command.
    pub fn with_camera(mut self, camera: u32) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = OnceLock::new();
        self
    }

    /// Span every request from this client is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn camera(&self) -> u32 {
        self.camera
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn host_for_url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    pub(crate) fn base_url(&self) -> Result<Url> {
        let url = format!(
            "{}://{}:{}/",
            self.scheme.as_ref(),
            self.host_for_url(),
            self.port()
        );
        Ok(Url::parse(&url)?)
    }

    pub fn build_url(&self, endpoint: &str, query: &Query) -> Result<Url> {
        let mut url = self.base_url()?.join(endpoint)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    /// Unix seconds, bumped so that no two requests from this client share a
    /// timestamp.
    pub(crate) fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp();
        let previous = self
            .last_timestamp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    /// Merge the base parameters (`camera`, `html`, `timestamp`) into a PTZ
    /// command query. Base parameters win on key collisions.
    pub fn command_query(&self, mut query: Query) -> Query {
        query.set("camera", self.camera);
        query.set("html", "no");
        query.set("timestamp", self.next_timestamp());
        query
    }

    /// Send a PTZ command to `ptz.cgi`.
    pub async fn send_command(&self, query: Query) -> Result<CommandResponse> {
        let query = self.command_query(query);
        let response = self.request(PTZ_CGI, &query).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(CommandResponse { status, body })
    }

    /// GET any CGI endpoint and return its body as text.
    pub async fn cgi_get(&self, endpoint: &str, query: &Query) -> Result<String> {
        let response = self.request(endpoint, query).await?;
        response.text().await.map_err(|e| self.transport_error(e))
    }

    /// GET any CGI endpoint and return the raw body, e.g. an image.
    pub async fn cgi_get_bytes(&self, endpoint: &str, query: &Query) -> Result<Vec<u8>> {
        let response = self.request(endpoint, query).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(bytes.to_vec())
    }

    pub(crate) async fn request(&self, endpoint: &str, query: &Query) -> Result<Response> {
        async {
            let url = self.build_url(endpoint, query)?;
            debug!(endpoint, keys = ?query.keys().collect::<Vec<_>>(), "sending request");

            let response = self.execute(url).await?;
            self.check_status(endpoint, response).await
        }
        .instrument(self.span.clone())
        .await
    }

    fn http_client(&self) -> Result<&reqwest::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                VapixError::ConnectionError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(self.client.get_or_init(|| client))
    }

    async fn execute(&self, url: Url) -> Result<Response> {
        let client = self.http_client()?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut prompt) = digest_challenge(response.headers()) else {
            return Err(VapixError::AuthenticationError(format!(
                "{} refused the request without a usable Digest challenge",
                self.host
            )));
        };
        trace!(realm = %prompt.realm, "received digest challenge");

        // The prompt is parsed fresh for every request, so nc is always 1.
        let uri = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let context = AuthContext::new(self.username.as_str(), self.password.as_str(), uri);
        let authorization = prompt
            .respond(&context)
            .map_err(|e| {
                VapixError::AuthenticationError(format!("Cannot answer digest challenge: {}", e))
            })?
            .to_header_string();

        let response = client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let message = error_text(&response.text().await.unwrap_or_default());
            warn!(user = %self.username, "credentials rejected");
            return Err(VapixError::AuthenticationError(if message.is_empty() {
                format!("credentials for {} rejected", self.username)
            } else {
                message
            }));
        }

        Ok(response)
    }

    async fn check_status(&self, endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status().as_u16();
        if OK_CODES.contains(&status) {
            return Ok(response);
        }

        let message = error_text(&response.text().await.unwrap_or_default());
        warn!(endpoint, status, %message, "device rejected request");

        Err(VapixError::ProtocolError { status, message })
    }

    fn transport_error(&self, e: reqwest::Error) -> VapixError {
        if e.is_timeout() {
            VapixError::Timeout(self.timeout)
        } else if e.is_connect() {
            VapixError::ConnectionError(format!("{}: {}", self.host, e))
        } else {
            VapixError::HttpError(e)
        }
    }
}

/// First Digest challenge among the `WWW-Authenticate` headers that
/// `digest_auth` can answer.
fn digest_challenge(headers: &HeaderMap) -> Option<WwwAuthenticateHeader> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| digest_auth::parse(value).ok())
}

impl fmt::Debug for VapixCam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapixCam")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("camera", &self.camera)
            .field("timeout", &self.timeout)
            .finish()
    }
}
