use std::future::Future;
use std::sync::Arc;

use url::Url;

use crate::crawler::StoreCrawler;
use crate::model::{StoreRecord, StoreTarget};
use crate::partition::partition;
use crate::pool::WorkerPool;
use crate::session::SessionProvider;

/// Lifecycle of one batch worker. `Failed` is terminal apart from `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Pending,
    SessionAcquired,
    Crawling,
    ResultsAppended,
    SessionReleased,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub batch: usize,
    /// Last state reached before `Done`.
    pub state: WorkerState,
    pub records: Vec<StoreRecord>,
}

pub struct Orchestrator {
    provider: Arc<dyn SessionProvider>,
    base_url: Url,
    threads: usize,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn SessionProvider>, base_url: Url, threads: usize) -> Self {
        Self {
            provider,
            base_url,
            threads,
        }
    }

    pub async fn run_to_completion(&self, targets: Vec<StoreTarget>) -> Vec<StoreRecord> {
        self.run(targets, std::future::pending()).await
    }

    /// Crawls every target with one worker per batch and concatenates the
    /// per-batch records. Resolving `shutdown` stops the wait and returns the
    /// records of the batches joined so far.
    pub async fn run<S>(&self, targets: Vec<StoreTarget>, shutdown: S) -> Vec<StoreRecord>
    where
        S: Future<Output = ()>,
    {
        let total = targets.len();
        let batches = match partition(targets, self.threads) {
            Ok(batches) => batches,
            Err(err) => {
                tracing::error!(%err, "cannot partition store targets");
                return Vec::new();
            }
        };
        tracing::info!(
            stores = total,
            batches = batches.len(),
            threads = self.threads,
            "starting crawl"
        );

        let mut pool = WorkerPool::new(self.threads);
        for (index, batch) in batches.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let base_url = self.base_url.clone();
            pool.spawn(run_batch(index, batch, provider, base_url));
        }

        let mut records = Vec::with_capacity(total);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                joined = pool.join_next() => match joined {
                    Some(Ok(outcome)) => {
                        tracing::info!(
                            batch = outcome.batch,
                            state = ?outcome.state,
                            count = outcome.records.len(),
                            "batch joined"
                        );
                        records.extend(outcome.records);
                    }
                    Some(Err(err)) => {
                        tracing::error!(?err, "batch worker panicked or was cancelled");
                    }
                    None => break,
                },
                () = &mut shutdown => {
                    tracing::warn!(
                        pending = pool.len(),
                        collected = records.len(),
                        "interrupted; returning partial results"
                    );
                    break;
                }
            }
        }

        records
    }
}

/// Runs one batch on its own session. A session lost mid-batch fails the
/// whole batch and discards its records.
pub async fn run_batch(
    batch: usize,
    targets: Vec<StoreTarget>,
    provider: Arc<dyn SessionProvider>,
    base_url: Url,
) -> BatchOutcome {
    let mut state = WorkerState::Pending;
    tracing::info!(batch, stores = targets.len(), "batch started");

    let session = match provider.acquire().await {
        Ok(session) => session,
        Err(err) => {
            state = transition(batch, state, WorkerState::Failed);
            tracing::error!(batch, ?err, "could not acquire browser session; batch skipped");
            transition(batch, state, WorkerState::Done);
            return BatchOutcome {
                batch,
                state,
                records: Vec::new(),
            };
        }
    };
    state = transition(batch, state, WorkerState::SessionAcquired);
    tracing::info!(batch, "browser session acquired");

    let mut crawler = StoreCrawler::new(session, base_url.clone());
    state = transition(batch, state, WorkerState::Crawling);
    let mut records = Vec::with_capacity(targets.len());
    for mut target in targets {
        if let Err(err) = crawler.crawl(&mut target).await {
            state = transition(batch, state, WorkerState::Failed);
            tracing::error!(
                batch,
                sid = %target.site_id,
                %err,
                discarded = records.len(),
                "browser session lost; batch failed"
            );
            transition(batch, state, WorkerState::Done);
            return BatchOutcome {
                batch,
                state,
                records: Vec::new(),
            };
        }
        records.push(target.to_record(&base_url));
    }
    state = transition(batch, state, WorkerState::ResultsAppended);

    if let Err(err) = crawler.into_session().close().await {
        tracing::warn!(batch, ?err, "browser session did not close cleanly");
    }
    state = transition(batch, state, WorkerState::SessionReleased);
    tracing::info!(batch, "browser session released");

    tracing::info!(batch, count = records.len(), "batch finished");
    transition(batch, state, WorkerState::Done);

    BatchOutcome {
        batch,
        state,
        records,
    }
}

fn transition(batch: usize, from: WorkerState, to: WorkerState) -> WorkerState {
    tracing::debug!(batch, ?from, ?to, "worker state");
    to
}
