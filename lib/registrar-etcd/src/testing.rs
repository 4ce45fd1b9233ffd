//! Minimal etcd v2 stand-in served over hyper for client tests

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: String,
}

#[derive(Default)]
struct State {
    keys: HashSet<String>,
    requests: Vec<RecordedRequest>,
}

pub struct FakeEtcd {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl FakeEtcd {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));

        let server_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = server_state.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(req, state.clone()));
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().unwrap().keys.contains(key)
    }
}

/// An endpoint nothing listens on
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn handle(
    req: Request<Incoming>,
    state: Arc<Mutex<State>>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let body = req.into_body().collect().await?.to_bytes();

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let key = path.strip_prefix("/v2/keys").map(str::to_string);
    let (status, body) = match (method, key) {
        (Method::GET, None) if path == "/version" => (
            StatusCode::OK,
            r#"{"etcdserver":"2.3.8","etcdcluster":"2.3.0"}"#.to_string(),
        ),
        (Method::PUT, Some(key)) => {
            state.keys.insert(key.clone());
            (StatusCode::CREATED, format!(r#"{{"action":"set","node":{{"key":"{}"}}}}"#, key))
        }
        (Method::DELETE, Some(key)) => {
            if state.keys.remove(&key) {
                (StatusCode::OK, format!(r#"{{"action":"delete","node":{{"key":"{}"}}}}"#, key))
            } else {
                (
                    StatusCode::NOT_FOUND,
                    format!(
                        r#"{{"errorCode":100,"message":"Key not found","cause":"{}","index":1}}"#,
                        key
                    ),
                )
            }
        }
        _ => (StatusCode::NOT_FOUND, "404 page not found".to_string()),
    };

    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap())
}
