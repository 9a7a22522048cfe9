//! In-process fake VAPIX camera for integration tests.
//!
//! Every request without valid Digest credentials gets a fresh challenge.
//! Nonces are single-use, so a client that caches them fails verification.

#![allow(dead_code)]

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::Response;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vapix_rs::VapixCam;
use vapix_rs::constants::PTZ_CGI;
use digest_auth::{AuthContext, AuthorizationHeader};

pub const USER: &str = "root";
pub const PASSWORD: &str = "pass";
pub const REALM: &str = "AXIS_ACCC8E012345";

const UNAUTHORIZED_BODY: &str = "<HTML><HEAD><TITLE>401 Unauthorized</TITLE></HEAD>\n<BODY><H1>401 Unauthorized</H1>\nYour client does not have permission to get URL</BODY></HTML>";

/// One request as seen by the fake camera.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorized: bool,
    pub nonce: Option<String>,
    pub nc: Option<u32>,
}

impl Recorded {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.query.iter().map(|(k, _)| k.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
struct Rule {
    path: String,
    when: Option<(String, String)>,
    status: StatusCode,
    body: Vec<u8>,
}

impl Rule {
    fn matches(&self, path: &str, query: &[(String, String)]) -> bool {
        self.path == path
            && self
                .when
                .as_ref()
                .is_none_or(|(key, value)| query.iter().any(|(k, v)| k == key && v == value))
    }
}

struct CameraState {
    password: String,
    challenge_scheme_digest: AtomicBool,
    algorithm: Mutex<&'static str>,
    delay: Mutex<Option<Duration>>,
    rules: Mutex<Vec<Rule>>,
    requests: Mutex<Vec<Recorded>>,
    issued: Mutex<HashMap<String, String>>,
    used: Mutex<HashSet<String>>,
    challenges: AtomicUsize,
}

struct Credentials {
    nonce: String,
    nc: u32,
}

impl CameraState {
    /// Check an `Authorization` header against the challenge issued for its
    /// nonce by answering that challenge again with the client's cnonce.
    fn verify(&self, authorization: &str, request_uri: &str) -> Option<Credentials> {
        let header = AuthorizationHeader::parse(authorization).ok()?;
        if header.uri != request_uri || header.username != USER || header.realm != REALM {
            return None;
        }

        let challenge = self.issued.lock().unwrap().get(&header.nonce).cloned()?;
        if !self.used.lock().unwrap().insert(header.nonce.clone()) {
            return None;
        }

        let mut prompt = digest_auth::parse(&challenge).ok()?;
        let mut context = AuthContext::new(USER, self.password.as_str(), request_uri);
        if let Some(cnonce) = &header.cnonce {
            context.set_custom_cnonce(cnonce.as_str());
        }
        let expected = prompt.respond(&context).ok()?;

        (header.response == expected.response && header.nc == expected.nc).then_some(
            Credentials {
                nonce: header.nonce,
                nc: header.nc,
            },
        )
    }

    fn challenge(&self) -> Response {
        let header_value = if self.challenge_scheme_digest.load(Ordering::SeqCst) {
            let n = self.challenges.fetch_add(1, Ordering::SeqCst);
            let nonce = format!("{:08x}5f2e9b7c", n);
            let value = format!(
                "Digest realm=\"{}\", nonce=\"{}\", algorithm={}, qop=\"auth\"",
                REALM,
                nonce,
                self.algorithm.lock().unwrap()
            );
            self.issued.lock().unwrap().insert(nonce, value.clone());
            value
        } else {
            format!("Basic realm=\"{}\"", REALM)
        };

        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(header::WWW_AUTHENTICATE, header_value)
            .body(Body::from(UNAUTHORIZED_BODY))
            .unwrap()
    }

    fn reply_for(&self, path: &str, query: &[(String, String)]) -> Response {
        let rule = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|rule| rule.matches(path, query))
            .cloned();

        let (status, body) = match rule {
            Some(rule) => (rule.status, rule.body),
            None if path == PTZ_CGI => (StatusCode::NO_CONTENT, Vec::new()),
            None => (StatusCode::OK, b"OK".to_vec()),
        };

        Response::builder()
            .status(status)
            .body(Body::from(body))
            .unwrap()
    }
}

async fn handle(State(state): State<Arc<CameraState>>, uri: Uri, headers: HeaderMap) -> Response {
    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let path = uri.path().to_string();
    let query: Vec<(String, String)> =
        url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
    let request_uri = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let credentials = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| state.verify(value, &request_uri));

    state.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        query: query.clone(),
        authorized: credentials.is_some(),
        nonce: credentials.as_ref().map(|c| c.nonce.clone()),
        nc: credentials.as_ref().map(|c| c.nc.clone()),
    });

    match credentials {
        Some(_) => state.reply_for(&path, &query),
        None => state.challenge(),
    }
}

async fn spawn_router(router: Router) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .expect("server failed");
    });
    Ok((addr, handle))
}

pub struct FakeCamera {
    pub addr: SocketAddr,
    state: Arc<CameraState>,
    task: JoinHandle<()>,
}

impl FakeCamera {
    pub async fn start() -> Result<Self> {
        let _ = tracing_subscriber::fmt::try_init();

        let state = Arc::new(CameraState {
            password: PASSWORD.to_string(),
            challenge_scheme_digest: AtomicBool::new(true),
            algorithm: Mutex::new("MD5"),
            delay: Mutex::new(None),
            rules: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            issued: Mutex::new(HashMap::new()),
            used: Mutex::new(HashSet::new()),
            challenges: AtomicUsize::new(0),
        });
        let router = Router::new().fallback(handle).with_state(state.clone());
        let (addr, task) = spawn_router(router).await?;
        Ok(Self { addr, state, task })
    }

    /// Client for this camera with the right credentials.
    pub fn client(&self) -> VapixCam {
        self.client_with_password(PASSWORD)
    }

    pub fn client_with_password(&self, password: &str) -> VapixCam {
        VapixCam::new("127.0.0.1", USER, password).with_port(self.addr.port())
    }

    /// Answer every authorized request to `path` with `status` and `body`.
    pub fn reply(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.push_rule(path, None, status, body.into());
    }

    /// Like `reply`, restricted to requests carrying `key=value`.
    pub fn reply_when(&self, path: &str, key: &str, value: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.push_rule(
            path,
            Some((key.to_string(), value.to_string())),
            status,
            body.into(),
        );
    }

    fn push_rule(&self, path: &str, when: Option<(String, String)>, status: u16, body: Vec<u8>) {
        self.state.rules.lock().unwrap().push(Rule {
            path: path.to_string(),
            when,
            status: StatusCode::from_u16(status).unwrap(),
            body,
        });
    }

    /// Hold every reply for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    /// Digest algorithm named in new challenges, e.g. `SHA-256`.
    pub fn set_algorithm(&self, algorithm: &'static str) {
        *self.state.algorithm.lock().unwrap() = algorithm;
    }

    /// Refuse requests with a Basic challenge instead of Digest.
    pub fn basic_only(&self) {
        self.state
            .challenge_scheme_digest
            .store(false, Ordering::SeqCst);
    }

    /// Every request received, unauthenticated probes included.
    pub fn all_requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Requests that passed Digest verification.
    pub fn requests(&self) -> Vec<Recorded> {
        self.all_requests()
            .into_iter()
            .filter(|r| r.authorized)
            .collect()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no authorized request recorded")
    }

    pub fn challenges_issued(&self) -> usize {
        self.state.challenges.load(Ordering::SeqCst)
    }
}

impl Drop for FakeCamera {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> Result<SocketAddr> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}
