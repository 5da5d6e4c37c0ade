//! Sequential batch generation with per-item failure isolation.

use async_trait::async_trait;
use derive_getters::Getters;
use shotlist_core::{BatchProgress, GroupId};
use shotlist_interface::PromptJob;
use shotlist_retry::QueueConfig;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A unit of batch work, addressed by the group it produces a result for.
pub trait WorkItem {
    /// Group the item belongs to.
    fn group_id(&self) -> GroupId;
}

impl WorkItem for GroupId {
    fn group_id(&self) -> GroupId {
        *self
    }
}

impl WorkItem for PromptJob {
    fn group_id(&self) -> GroupId {
        PromptJob::group_id(self)
    }
}

/// Receives notifications while a batch run is active.
///
/// Every method has a no-op default so observers implement only what
/// they need.
#[async_trait]
pub trait QueueObserver<T: Send + Sync>: Send + Sync {
    /// An item is about to be generated.
    async fn item_started(&self, _group_id: GroupId) {}

    /// An item produced a result.
    async fn item_succeeded(&self, _group_id: GroupId, _result: &T) {}

    /// An item failed; the run continues.
    async fn item_failed(&self, _group_id: GroupId, _error: &str) {}

    /// Progress changed. `None` means the run is over.
    async fn progress(&self, _progress: Option<BatchProgress>) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

#[async_trait]
impl<T: Send + Sync> QueueObserver<T> for SilentObserver {}

/// What a batch run produced.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct BatchOutcome<T> {
    /// Results keyed by group id
    results: BTreeMap<GroupId, T>,
    /// Failed groups with their error messages, in run order
    failures: Vec<(GroupId, String)>,
    /// Number of items attempted
    attempted: usize,
}

impl<T> BatchOutcome<T> {
    /// Ids of the groups that failed.
    pub fn failed_groups(&self) -> Vec<GroupId> {
        self.failures.iter().map(|(id, _)| *id).collect()
    }

    /// Consume the outcome, keeping only the results.
    pub fn into_results(self) -> BTreeMap<GroupId, T> {
        self.results
    }
}

/// Drives generation over a work list one item at a time.
///
/// Items never run concurrently. A fixed pause follows every item,
/// success or failure.
///
/// # Examples
///
/// ```
/// use shotlist_pipeline::{GenerationQueue, SilentObserver};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = GenerationQueue::new(Duration::ZERO);
/// let outcome = queue
///     .run(vec![1u32, 2, 3], |id| async move {
///         if id == 2 { Err("boom") } else { Ok(id * 10) }
///     }, &SilentObserver)
///     .await;
///
/// assert_eq!(*outcome.attempted(), 3);
/// assert_eq!(outcome.failed_groups(), vec![2]);
/// assert_eq!(outcome.results().get(&3), Some(&30));
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GenerationQueue {
    item_pause: Duration,
}

impl Default for GenerationQueue {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl GenerationQueue {
    /// Create a queue with the given inter-item pause.
    pub fn new(item_pause: Duration) -> Self {
        Self { item_pause }
    }

    /// Build a queue from the `[queue]` configuration section.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.item_pause())
    }

    /// Run `operation` over every item in order.
    ///
    /// Failures are logged, reported to the observer and skipped. Progress
    /// is published before the first item, after every item, and cleared
    /// once the list is exhausted.
    #[instrument(skip_all, fields(total = items.len()))]
    pub async fn run<W, T, E, F, Fut, O>(
        &self,
        items: Vec<W>,
        mut operation: F,
        observer: &O,
    ) -> BatchOutcome<T>
    where
        O: QueueObserver<T> + ?Sized,
        W: WorkItem,
        T: Send + Sync,
        E: Display,
        F: FnMut(W) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut progress = BatchProgress::new(items.len());
        let mut results = BTreeMap::new();
        let mut failures = Vec::new();
        let mut attempted = 0;

        info!(total = items.len(), "Starting batch run");
        observer.progress(Some(progress)).await;

        for item in items {
            let group_id = item.group_id();
            debug!(group_id, "Generating item");
            observer.item_started(group_id).await;

            match operation(item).await {
                Ok(result) => {
                    observer.item_succeeded(group_id, &result).await;
                    results.insert(group_id, result);
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(group_id, error = %message, "Item failed, continuing with next");
                    observer.item_failed(group_id, &message).await;
                    failures.push((group_id, message));
                }
            }

            attempted += 1;
            progress.advance();
            debug!(current = progress.current(), total = progress.total(), "Progress");
            observer.progress(Some(progress)).await;

            tokio::time::sleep(self.item_pause).await;
        }

        observer.progress(None).await;
        info!(attempted, failed = failures.len(), "Batch run finished");

        BatchOutcome {
            results,
            failures,
            attempted,
        }
    }
}
