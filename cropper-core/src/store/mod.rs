// ============================================================================
// cropper-core/src/store/mod.rs
// ============================================================================
//
// PERSISTENCE LANE: Strictly ordered access to the SQLite database
//
// A single thread owns the rusqlite Connection. Every database operation is a
// closure sent to that thread over one channel, so operations run one at a
// time in submission order. A closure is the unit of atomicity: a
// check-then-insert written as one closure cannot be interleaved with another
// caller's statements.
//
// KEY COMPONENTS:
// - Store: cloneable handle submitting operations to the lane
// - migrations: schema creation, applied on open

pub mod migrations;

use crate::error::{CoreError, CoreResult};
use rusqlite::Connection;
use std::path::Path;
use std::thread;
use tokio::sync::{mpsc, oneshot};

type Operation = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Handle to the persistence lane. Cheap to clone; the lane stops when the
/// last handle is dropped.
#[derive(Clone)]
pub struct Store {
    tx: mpsc::UnboundedSender<Operation>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("closed", &self.tx.is_closed()).finish()
    }
}

impl Store {
    /// Opens (creating if needed) the database file and starts the lane.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        log::info!("Opening queue database {}", path.display());
        Self::start(Connection::open(path)?)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::start(Connection::open_in_memory()?)
    }

    fn start(mut conn: Connection) -> CoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let applied = migrations::run(&mut conn)?;
        if applied > 0 {
            log::info!("Applied {} database migration(s)", applied);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Operation>();
        thread::Builder::new()
            .name("cropper-store".to_string())
            .spawn(move || {
                while let Some(op) = rx.blocking_recv() {
                    op(&mut conn);
                }
                log::debug!("Store lane stopped");
            })?;

        Ok(Self { tx })
    }

    /// Runs `op` on the lane and waits for its result.
    ///
    /// Operations submitted from one task run in submission order; operations
    /// from different tasks run in the order they reached the channel.
    pub async fn call<F, R>(&self, op: F) -> CoreResult<R>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Box::new(move |conn: &mut Connection| {
                // The caller may have gone away; nothing to report to then.
                let _ = reply_tx.send(op(conn));
            }))
            .map_err(|_| CoreError::StoreClosed)?;

        reply_rx
            .await
            .map_err(|_| CoreError::StoreClosed)?
            .map_err(CoreError::from)
    }
}
