//! Off-thread aggregation with request/response correlation.
//!
//! Every request gets a fresh id and its own reply channel; a reply whose id
//! differs from the request's is rejected rather than handed to the caller.

use crate::aggregate::{collab_graph, lang_series, type_totals};
use crate::dataset::DatasetCache;
use crate::error::{ContribError, Result};
use crate::model::{CollabGraph, LangSeries, TypeTotal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateRequest {
    Langs { repo: Option<String> },
    Types { repo: Option<String> },
    Graph,
    Uncovered,
    Reload,
}

#[derive(Debug, Clone)]
pub enum AggregateResponse {
    Langs(LangSeries),
    Types(Vec<TypeTotal>),
    Graph(CollabGraph),
    Uncovered(Vec<String>),
    Reloaded,
}

struct Envelope {
    id: u64,
    request: AggregateRequest,
    reply: oneshot::Sender<Reply>,
}

/// A computed answer tagged with the id of the request it was computed for.
pub struct Reply {
    pub id: u64,
    pub result: Result<AggregateResponse>,
}

impl Reply {
    /// The result, if this reply answers request `request_id`. Each request
    /// has its own reply channel; the id check guards against a dispatcher
    /// that routes a job's answer to the wrong requester.
    pub fn answer(self, request_id: u64) -> Result<AggregateResponse> {
        if self.id != request_id {
            return Err(ContribError::Other(format!(
                "aggregation reply {} does not answer request {request_id}",
                self.id
            )));
        }
        self.result
    }
}

pub struct AggregationService {
    tx: mpsc::Sender<Envelope>,
    next_id: AtomicU64,
}

impl AggregationService {
    /// Starts the dispatch loop on the current tokio runtime.
    pub fn spawn(cache: Arc<DatasetCache>, username: impl Into<String>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Envelope>(64);
        let username: Arc<str> = Arc::from(username.into());

        tokio::spawn(async move {
            while let Some(Envelope { id, request, reply }) = rx.recv().await {
                let cache = cache.clone();
                let username = username.clone();
                tokio::task::spawn_blocking(move || {
                    let result = compute(&cache, &username, request);
                    if reply.send(Reply { id, result }).is_err() {
                        tracing::debug!(id, "aggregation requester went away");
                    }
                });
            }
        });

        Self {
            tx,
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn request(&self, request: AggregateRequest) -> Result<AggregateResponse> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                id,
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ContribError::Other("aggregation service stopped".to_string()))?;

        let reply = reply_rx
            .await
            .map_err(|_| ContribError::Other(format!("aggregation request {id} was dropped")))?;
        reply.answer(id)
    }

    pub async fn langs(&self, repo: Option<String>) -> Result<LangSeries> {
        match self.request(AggregateRequest::Langs { repo }).await? {
            AggregateResponse::Langs(series) => Ok(series),
            other => Err(unexpected("langs", &other)),
        }
    }

    pub async fn types(&self, repo: Option<String>) -> Result<Vec<TypeTotal>> {
        match self.request(AggregateRequest::Types { repo }).await? {
            AggregateResponse::Types(totals) => Ok(totals),
            other => Err(unexpected("types", &other)),
        }
    }

    pub async fn graph(&self) -> Result<CollabGraph> {
        match self.request(AggregateRequest::Graph).await? {
            AggregateResponse::Graph(graph) => Ok(graph),
            other => Err(unexpected("graph", &other)),
        }
    }

    pub async fn uncovered(&self) -> Result<Vec<String>> {
        match self.request(AggregateRequest::Uncovered).await? {
            AggregateResponse::Uncovered(paths) => Ok(paths),
            other => Err(unexpected("uncovered", &other)),
        }
    }

    pub async fn reload(&self) -> Result<()> {
        self.request(AggregateRequest::Reload).await.map(|_| ())
    }
}

fn unexpected(expected: &str, got: &AggregateResponse) -> ContribError {
    ContribError::Other(format!("expected {expected} response, got {got:?}"))
}

fn compute(
    cache: &DatasetCache,
    username: &str,
    request: AggregateRequest,
) -> Result<AggregateResponse> {
    match request {
        AggregateRequest::Langs { repo } => {
            let series = match repo {
                Some(repo) => lang_series(&cache.repo_views(&repo)?),
                None => lang_series(&cache.commit_views()?),
            };
            Ok(AggregateResponse::Langs(series))
        }
        AggregateRequest::Types { repo } => {
            let totals = match repo {
                Some(repo) => type_totals(&cache.repo_views(&repo)?),
                None => type_totals(&cache.commit_views()?),
            };
            Ok(AggregateResponse::Types(totals))
        }
        AggregateRequest::Graph => {
            let dataset = cache.dataset()?;
            Ok(AggregateResponse::Graph(collab_graph(username, &dataset.issues)))
        }
        AggregateRequest::Uncovered => {
            cache.commit_views()?;
            Ok(AggregateResponse::Uncovered(cache.classifier().uncovered()))
        }
        AggregateRequest::Reload => {
            cache.reload()?;
            Ok(AggregateResponse::Reloaded)
        }
    }
}
