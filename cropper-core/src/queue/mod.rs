// ============================================================================
// cropper-core/src/queue/mod.rs
// ============================================================================
//
// JOB QUEUE ENGINE: Persistent crop queue with a single background consumer
//
// Jobs are rows in the `Queue` table. Enqueueing inserts a Pending row (or
// returns the open row for the same path) and starts the consumer if it is
// idle. The consumer claims the oldest Pending row, marks it Active, crops the
// file on a blocking thread and records Complete or Abort, until nothing is
// Pending.
//
// At most one consumer runs at a time. The flag guarding it is released in
// the same store lane operation that observes an empty queue, so an enqueue
// either lands before that check (and is consumed by the running loop) or
// after the release (and starts a new loop).

mod item;
mod path_mapping;
pub(crate) mod repository;
mod state;

pub use item::{EnqueueRequest, QueueItem};
pub use path_mapping::{PathMapping, PathMappings};
pub use state::QueueState;

use crate::crop::CropExecutor;
use crate::error::CoreResult;
use crate::registry::{Category, Vocabulary};
use crate::store::Store;
use repository::NewItem;

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Persistent crop queue. Cheap to clone; clones share one queue.
pub struct QueueEngine<E: CropExecutor> {
    inner: Arc<EngineInner<E>>,
}

struct EngineInner<E: CropExecutor> {
    store: Store,
    vocabulary: Vocabulary,
    mappings: PathMappings,
    executor: Arc<E>,
    consuming: Arc<watch::Sender<bool>>,
}

impl<E: CropExecutor> Clone for QueueEngine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Releases the consumer flag if the loop ends early (error or panic).
struct ConsumerGuard {
    consuming: Arc<watch::Sender<bool>>,
    armed: bool,
}

impl Drop for ConsumerGuard {
    fn drop(&mut self) {
        if self.armed {
            self.consuming.send_replace(false);
        }
    }
}

impl<E: CropExecutor> QueueEngine<E> {
    /// Opens the queue on `store`.
    ///
    /// Rows left Pending by a previous process are moved to Abort. Rows left
    /// Active are not touched.
    pub async fn start(store: Store, mappings: PathMappings, executor: E) -> CoreResult<Self> {
        let aborted = store
            .call(|conn| repository::abort_pending(conn, Utc::now()))
            .await?;
        if aborted > 0 {
            log::warn!("Aborted {} item(s) left pending by a previous run", aborted);
        }

        let vocabulary = Vocabulary::load(&store).await?;
        if !mappings.is_empty() {
            log::info!("Path mappings: {}", mappings);
        }

        let (consuming, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(EngineInner {
                store,
                vocabulary,
                mappings,
                executor: Arc::new(executor),
                consuming: Arc::new(consuming),
            }),
        })
    }

    pub fn mappings(&self) -> &PathMappings {
        &self.inner.mappings
    }

    /// Queues a file and returns its row id.
    ///
    /// If the mapped path already has a Pending or Active row, that row's id is
    /// returned and nothing is inserted.
    pub async fn enqueue(&self, request: EnqueueRequest) -> CoreResult<i64> {
        let path = self.inner.mappings.apply(&request.path);
        let vocabulary = &self.inner.vocabulary;

        let local_source = vocabulary
            .get_or_add_optional(Category::LocalSource, request.local_source.as_deref())
            .await?;
        let remote_source = vocabulary
            .get_or_add_optional(Category::RemoteSource, request.remote_source.as_deref())
            .await?;
        let remote_group = vocabulary
            .get_or_add_optional(Category::RemoteGroup, request.remote_group.as_deref())
            .await?;

        let name = if request.name.trim().is_empty() {
            default_name(&path)
        } else {
            request.name
        };
        let new_item = NewItem {
            name,
            path,
            local_source: local_source.map(|v| v.id),
            remote_source: remote_source.map(|v| v.id),
            remote_group: remote_group.map(|v| v.id),
        };

        let (id, created) = self
            .inner
            .store
            .call(move |conn| {
                let result = repository::enqueue_deduplicated(conn, &new_item, Utc::now())?;
                if result.1 {
                    log::info!("Queued '{}' ({}) as #{}", new_item.name, new_item.path, result.0);
                } else {
                    log::debug!("{} is already queued as #{}", new_item.path, result.0);
                }
                Ok(result)
            })
            .await?;

        if created {
            self.trigger();
        }
        Ok(id)
    }

    /// Marks every row for the mapped path as Skip, whatever its state.
    ///
    /// Returns the highest affected id, or `None` when nothing matched. A
    /// running crop is not interrupted.
    pub async fn cancel(&self, raw_path: &str) -> CoreResult<Option<i64>> {
        let path = self.inner.mappings.apply(raw_path);
        let log_path = path.clone();
        let ids = self
            .inner
            .store
            .call(move |conn| repository::skip_by_path(conn, &path, Utc::now()))
            .await?;

        let highest = ids.iter().copied().max();
        match highest {
            Some(id) => log::info!("Skipped {} item(s) for {} (#{})", ids.len(), log_path, id),
            None => log::debug!("Nothing queued for {}", log_path),
        }
        Ok(highest)
    }

    /// Pending and Active items, oldest first.
    pub async fn list_active(&self) -> CoreResult<Vec<QueueItem>> {
        self.inner.store.call(|conn| repository::list_open(conn)).await
    }

    pub async fn get(&self, id: i64) -> CoreResult<Option<QueueItem>> {
        self.inner.store.call(move |conn| repository::get(conn, id)).await
    }

    /// Whether the consumer loop is currently running.
    pub fn is_consuming(&self) -> bool {
        *self.inner.consuming.borrow()
    }

    /// Waits until the consumer loop is not running.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.consuming.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|consuming| !*consuming).await;
    }

    /// Starts the consumer unless one is already running.
    fn trigger(&self) {
        let started = self.inner.consuming.send_if_modified(|consuming| {
            if *consuming {
                false
            } else {
                *consuming = true;
                true
            }
        });
        if !started {
            log::trace!("Queue consumer already running");
            return;
        }

        let engine = self.clone();
        tokio::spawn(async move { engine.consume().await });
    }

    async fn consume(self) {
        let mut guard = ConsumerGuard {
            consuming: Arc::clone(&self.inner.consuming),
            armed: true,
        };
        log::debug!("Queue consumer started");

        loop {
            if let Err(e) = self.drain().await {
                log::error!("Queue consumer stopped: {}", e);
                return;
            }
            match self.release_if_idle().await {
                Ok(true) => {
                    guard.armed = false;
                    log::debug!("Queue consumer idle");
                    return;
                }
                Ok(false) => continue,
                Err(e) => {
                    log::error!("Queue consumer stopped: {}", e);
                    return;
                }
            }
        }
    }

    /// Processes Pending rows until none are left.
    async fn drain(&self) -> CoreResult<()> {
        while let Some(item) = self
            .inner
            .store
            .call(|conn| repository::claim_next_pending(conn, Utc::now()))
            .await?
        {
            log::info!("Starting crop on {} (#{})", item.path, item.id);

            let executor = Arc::clone(&self.inner.executor);
            let path = PathBuf::from(&item.path);
            let outcome = tokio::task::spawn_blocking(move || executor.crop(&path)).await;

            let state = match outcome {
                Ok(Ok(())) => {
                    log::info!("Crop complete on {} (#{})", item.path, item.id);
                    QueueState::Complete
                }
                Ok(Err(e)) => {
                    log::error!("Crop failed on {} (#{}): {}", item.path, item.id, e);
                    QueueState::Abort
                }
                Err(e) => {
                    log::error!("Crop task for {} (#{}) did not finish: {}", item.path, item.id, e);
                    QueueState::Abort
                }
            };

            let id = item.id;
            let recorded = self
                .inner
                .store
                .call(move |conn| repository::finish(conn, id, state, Utc::now()))
                .await?;
            if !recorded {
                log::info!("#{} changed state while cropping; keeping the new state", id);
            }
        }
        Ok(())
    }

    /// Clears the consumer flag if nothing is Pending, atomically with the check.
    async fn release_if_idle(&self) -> CoreResult<bool> {
        let consuming = Arc::clone(&self.inner.consuming);
        self.inner
            .store
            .call(move |conn| {
                let idle = repository::count_pending(conn)? == 0;
                if idle {
                    consuming.send_replace(false);
                }
                Ok(idle)
            })
            .await
    }
}

/// File name of `path`, used when a request carries no display name.
fn default_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
