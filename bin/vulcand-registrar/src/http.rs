//! Health and metrics endpoints

use crate::metrics::RegistrarMetrics;
use anyhow::Result;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{body::Bytes, server::conn::http1, service::service_fn, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use registrar_core::RegistryAdapter;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Accept connections forever, serving `/healthz` and `/metrics`
pub async fn serve(
    listener: TcpListener,
    adapter: Arc<dyn RegistryAdapter>,
    metrics: RegistrarMetrics,
) -> Result<()> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);

        let adapter = adapter.clone();
        let metrics = metrics.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let adapter = adapter.clone();
                let metrics = metrics.clone();
                async move { Ok::<_, hyper::Error>(handle_request(req, adapter, metrics).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving HTTP connection from {}: {}", peer_addr, e);
            }
        });
    }
}

pub async fn handle_request<B>(
    req: Request<B>,
    adapter: Arc<dyn RegistryAdapter>,
    metrics: RegistrarMetrics,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("{} {}", method, path);

    match (method, path.as_str()) {
        (Method::GET, "/healthz") => match adapter.probe().await {
            Ok(()) => text_response(StatusCode::OK, "OK\n".to_string()),
            Err(e) => {
                warn!("Store probe failed: {}", e);
                metrics.probe_failures_total.inc();
                text_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("Service Unavailable: {}\n", e),
                )
            }
        },
        (Method::GET, "/metrics") => match metrics.gather() {
            Ok(text) => {
                let mut response = text_response(StatusCode::OK, text);
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
            Err(e) => text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {}\n", e),
            ),
        },
        _ => text_response(StatusCode::NOT_FOUND, format!("Not Found: {}\n", path)),
    }
}

fn text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use registrar_core::{MemoryStore, VulcandAdapter};

    fn request(path: &str) -> Request<()> {
        Request::builder().uri(path).body(()).unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz_tracks_store() {
        let adapter = Arc::new(VulcandAdapter::new(MemoryStore::new(), "/vulcand", ""));
        let metrics = RegistrarMetrics::new().unwrap();

        let response = handle_request(request("/healthz"), adapter.clone(), metrics.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);

        adapter.store().set_available(false);
        let response = handle_request(request("/healthz"), adapter.clone(), metrics.clone()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(metrics.probe_failures_total.get(), 1.0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let adapter = Arc::new(VulcandAdapter::new(MemoryStore::new(), "/vulcand", ""));
        let metrics = RegistrarMetrics::new().unwrap();
        metrics.record_event("register", "ignored");

        let response = handle_request(request("/metrics"), adapter, metrics).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("registrar_events_total"));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let adapter = Arc::new(VulcandAdapter::new(MemoryStore::new(), "/vulcand", ""));
        let response =
            handle_request(request("/nope"), adapter, RegistrarMetrics::new().unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
