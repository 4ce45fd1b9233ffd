//! Service lifecycle events read from the discovery layer
//!
//! Events arrive as JSON lines:
//!
//! ```text
//! {"action":"register","service":{"id":"i1","name":"web","ip":"10.0.0.5","port":8080,"attrs":{"deploy":"1"},"ttl":30}}
//! ```

use crate::metrics::RegistrarMetrics;
use anyhow::Result;
use registrar_core::{Registration, RegistryAdapter, Service};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Register,
    Deregister,
    Refresh,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Register => "register",
            Action::Deregister => "deregister",
            Action::Refresh => "refresh",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceEvent {
    pub action: Action,
    pub service: Service,
}

/// What happened to an event once dispatched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Registered,
    Ignored,
    Deregistered,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Registered => "registered",
            Outcome::Ignored => "ignored",
            Outcome::Deregistered => "deregistered",
            Outcome::Failed => "failed",
        }
    }
}

impl From<Registration> for Outcome {
    fn from(registration: Registration) -> Self {
        match registration {
            Registration::Registered => Outcome::Registered,
            Registration::Ignored => Outcome::Ignored,
        }
    }
}

/// Parse one raw input line; blank lines yield `None`
pub fn parse_event(line: &[u8]) -> serde_json::Result<Option<ServiceEvent>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(line).map(Some)
}

/// Apply one event to the adapter and record its outcome
pub async fn dispatch(
    adapter: &dyn RegistryAdapter,
    event: &ServiceEvent,
    metrics: &RegistrarMetrics,
) -> Outcome {
    let service = &event.service;
    let result = match event.action {
        Action::Register => adapter.register(service).await.map(Outcome::from),
        Action::Refresh => adapter.refresh(service).await.map(Outcome::from),
        Action::Deregister => adapter.deregister(service).await.map(|()| Outcome::Deregistered),
    };

    let outcome = match result {
        Ok(Outcome::Ignored) => {
            debug!("Ignored {} of {}/{}", event.action.as_str(), service.name, service.id);
            Outcome::Ignored
        }
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                "Failed to {} {}/{}: {}",
                event.action.as_str(),
                service.name,
                service.id,
                e
            );
            Outcome::Failed
        }
    };

    metrics.record_event(event.action.as_str(), outcome.as_str());
    outcome
}

/// Read events until EOF, dispatching each on its own task.
///
/// Returns the number of events dispatched once all of them have finished.
pub async fn run_events<R>(
    mut reader: R,
    adapter: Arc<dyn RegistryAdapter>,
    metrics: RegistrarMetrics,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut tasks = JoinSet::new();
    let mut dispatched = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        let event = match parse_event(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping malformed event: {}", e);
                continue;
            }
        };

        dispatched += 1;
        let adapter = adapter.clone();
        let metrics = metrics.clone();
        tasks.spawn(async move { dispatch(adapter.as_ref(), &event, &metrics).await });
    }

    info!("Event stream closed, waiting for {} in-flight events", tasks.len());
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Event task failed: {}", e);
        }
    }

    Ok(dispatched)
}
