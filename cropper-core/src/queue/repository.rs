//! SQL for the `Queue` table.
//!
//! Every function here runs on the store lane and is one atomic step from the
//! point of view of other callers.

use super::item::to_millis;
use super::{QueueItem, QueueState};
use crate::registry::CategoryValue;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{Connection, OptionalExtension, Row, named_params};

/// A row about to be inserted, with category ids already resolved.
#[derive(Debug, Clone)]
pub(crate) struct NewItem {
    pub name: String,
    pub path: String,
    pub local_source: Option<i64>,
    pub remote_source: Option<i64>,
    pub remote_group: Option<i64>,
}

const SELECT_ITEM: &str = "
    SELECT q.id, q.state, q.name, q.path, q.added_at, q.last_updated,
           ls.id, ls.name, rs.id, rs.name, rg.id, rg.name
    FROM Queue q
    LEFT JOIN LocalSource ls ON ls.id = q.local_source
    LEFT JOIN RemoteSource rs ON rs.id = q.remote_source
    LEFT JOIN RemoteGroup rg ON rg.id = q.remote_group";

fn category_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<CategoryValue>> {
    let id: Option<i64> = row.get(index)?;
    let name: Option<String> = row.get(index + 1)?;
    Ok(id.zip(name).map(|(id, name)| CategoryValue { id, name }))
}

/// Millisecond timestamp column; a value chrono cannot represent is a
/// conversion error rather than a silent epoch.
fn timestamp_at(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(index)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Integer,
            Box::new(FromSqlError::OutOfRange(millis)),
        )
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<QueueItem> {
    Ok(QueueItem {
        id: row.get(0)?,
        state: row.get(1)?,
        name: row.get(2)?,
        path: row.get(3)?,
        added_at: timestamp_at(row, 4)?,
        last_updated: timestamp_at(row, 5)?,
        local_source: category_at(row, 6)?,
        remote_source: category_at(row, 8)?,
        remote_group: category_at(row, 10)?,
    })
}

/// Moves every Pending row to Abort. Active rows are left as they are.
pub(crate) fn abort_pending(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE Queue SET state = :abort, last_updated = :now WHERE state = :pending",
        named_params! {
            ":abort": QueueState::Abort,
            ":now": to_millis(now),
            ":pending": QueueState::Pending,
        },
    )
}

/// Id of a Pending or Active row for `path`, if any.
pub(crate) fn find_open_by_path(conn: &Connection, path: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM Queue WHERE path = :path AND state IN (:pending, :active)
         ORDER BY id LIMIT 1",
        named_params! {
            ":path": path,
            ":pending": QueueState::Pending,
            ":active": QueueState::Active,
        },
        |row| row.get(0),
    )
    .optional()
}

/// Inserts `item` as Pending unless an open row for its path exists.
///
/// Returns the row id and whether a new row was created.
pub(crate) fn enqueue_deduplicated(
    conn: &Connection,
    item: &NewItem,
    now: DateTime<Utc>,
) -> rusqlite::Result<(i64, bool)> {
    if let Some(id) = find_open_by_path(conn, &item.path)? {
        return Ok((id, false));
    }

    let millis = to_millis(now);
    let id = conn.query_row(
        "INSERT INTO Queue (state, name, path, added_at, last_updated,
                            local_source, remote_source, remote_group)
         VALUES (:state, :name, :path, :added_at, :last_updated,
                 :local_source, :remote_source, :remote_group)
         RETURNING id",
        named_params! {
            ":state": QueueState::Pending,
            ":name": item.name,
            ":path": item.path,
            ":added_at": millis,
            ":last_updated": millis,
            ":local_source": item.local_source,
            ":remote_source": item.remote_source,
            ":remote_group": item.remote_group,
        },
        |row| row.get(0),
    )?;
    Ok((id, true))
}

/// Marks every row for `path` as Skip, whatever its state. Returns the ids.
pub(crate) fn skip_by_path(
    conn: &Connection,
    path: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "UPDATE Queue SET state = :skip, last_updated = :now WHERE path = :path RETURNING id",
    )?;
    let ids = stmt.query_map(
        named_params! {
            ":skip": QueueState::Skip,
            ":now": to_millis(now),
            ":path": path,
        },
        |row| row.get(0),
    )?;
    ids.collect()
}

/// Picks the oldest Pending row and marks it Active.
pub(crate) fn claim_next_pending(
    conn: &Connection,
    now: DateTime<Utc>,
) -> rusqlite::Result<Option<QueueItem>> {
    let next: Option<i64> = conn
        .query_row(
            "SELECT id FROM Queue WHERE state = :pending ORDER BY added_at, id LIMIT 1",
            named_params! { ":pending": QueueState::Pending },
            |row| row.get(0),
        )
        .optional()?;

    let Some(id) = next else {
        return Ok(None);
    };

    conn.execute(
        "UPDATE Queue SET state = :active, last_updated = :now WHERE id = :id",
        named_params! {
            ":active": QueueState::Active,
            ":now": to_millis(now),
            ":id": id,
        },
    )?;
    get(conn, id)
}

pub(crate) fn count_pending(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM Queue WHERE state = :pending",
        named_params! { ":pending": QueueState::Pending },
        |row| row.get(0),
    )
}

/// Records the outcome of a run. Only applies while the row is still Active,
/// so a cancellation made during the run wins.
pub(crate) fn finish(
    conn: &Connection,
    id: i64,
    state: QueueState,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE Queue SET state = :state, last_updated = :now WHERE id = :id AND state = :active",
        named_params! {
            ":state": state,
            ":now": to_millis(now),
            ":id": id,
            ":active": QueueState::Active,
        },
    )?;
    Ok(changed == 1)
}

/// Pending and Active rows, oldest first.
pub(crate) fn list_open(conn: &Connection) -> rusqlite::Result<Vec<QueueItem>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_ITEM} WHERE q.state IN (:pending, :active) ORDER BY q.added_at, q.id"
    ))?;
    let rows = stmt.query_map(
        named_params! {
            ":pending": QueueState::Pending,
            ":active": QueueState::Active,
        },
        item_from_row,
    )?;
    rows.collect()
}

pub(crate) fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<QueueItem>> {
    conn.query_row(
        &format!("{SELECT_ITEM} WHERE q.id = :id"),
        named_params! { ":id": id },
        item_from_row,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::migrations;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrations::run(&mut conn).unwrap();
        conn
    }

    fn item(path: &str) -> NewItem {
        NewItem {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            local_source: Some(3),
            remote_source: None,
            remote_group: None,
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_dedup_only_against_open_rows() {
        let conn = conn();
        let (first, created) = enqueue_deduplicated(&conn, &item("/tv/a.mkv"), at(1)).unwrap();
        assert!(created);
        assert_eq!(
            enqueue_deduplicated(&conn, &item("/tv/a.mkv"), at(2)).unwrap(),
            (first, false)
        );

        claim_next_pending(&conn, at(3)).unwrap();
        assert!(finish(&conn, first, QueueState::Complete, at(3)).unwrap());
        let (second, created) = enqueue_deduplicated(&conn, &item("/tv/a.mkv"), at(4)).unwrap();
        assert!(created);
        assert_ne!(first, second);
    }

    #[test]
    fn test_claim_is_fifo_by_added_at_then_id() {
        let conn = conn();
        let (late, _) = enqueue_deduplicated(&conn, &item("/late.mkv"), at(50)).unwrap();
        let (early_a, _) = enqueue_deduplicated(&conn, &item("/early_a.mkv"), at(10)).unwrap();
        let (early_b, _) = enqueue_deduplicated(&conn, &item("/early_b.mkv"), at(10)).unwrap();

        let order: Vec<i64> = std::iter::from_fn(|| claim_next_pending(&conn, at(60)).unwrap())
            .map(|claimed| {
                assert_eq!(claimed.state, QueueState::Active);
                claimed.id
            })
            .collect();
        assert_eq!(order, vec![early_a, early_b, late]);
        assert_eq!(count_pending(&conn).unwrap(), 0);
    }

    #[test]
    fn test_finish_keeps_skip_recorded_mid_run() {
        let conn = conn();
        let (id, _) = enqueue_deduplicated(&conn, &item("/a.mkv"), at(1)).unwrap();
        claim_next_pending(&conn, at(2)).unwrap();
        assert_eq!(skip_by_path(&conn, "/a.mkv", at(3)).unwrap(), vec![id]);
        assert!(!finish(&conn, id, QueueState::Complete, at(4)).unwrap());
        assert_eq!(get(&conn, id).unwrap().unwrap().state, QueueState::Skip);
    }

    #[test]
    fn test_abort_pending_leaves_active() {
        let conn = conn();
        let (active, _) = enqueue_deduplicated(&conn, &item("/a.mkv"), at(1)).unwrap();
        claim_next_pending(&conn, at(2)).unwrap();
        let (pending, _) = enqueue_deduplicated(&conn, &item("/b.mkv"), at(3)).unwrap();

        assert_eq!(abort_pending(&conn, at(4)).unwrap(), 1);
        assert_eq!(get(&conn, active).unwrap().unwrap().state, QueueState::Active);
        assert_eq!(get(&conn, pending).unwrap().unwrap().state, QueueState::Abort);
    }

    #[test]
    fn test_list_open_resolves_categories() {
        let conn = conn();
        let group = crate::registry::select_or_insert(
            &conn,
            crate::registry::Category::RemoteGroup,
            "NTb",
        )
        .unwrap();
        let mut new = item("/tv/show.mkv");
        new.remote_group = Some(group.id);
        enqueue_deduplicated(&conn, &new, at(1)).unwrap();

        let items = list_open(&conn).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "show.mkv");
        assert_eq!(items[0].local_source.as_ref().map(|v| v.name.as_str()), Some("Api"));
        assert_eq!(items[0].remote_source, None);
        assert_eq!(items[0].remote_group, Some(group));
        assert_eq!(items[0].added_at.timestamp_millis(), 1);
    }

    #[test]
    fn test_unrepresentable_timestamp_is_an_error() {
        let conn = conn();
        let (id, _) = enqueue_deduplicated(&conn, &item("/a.mkv"), at(1)).unwrap();
        conn.execute("UPDATE Queue SET added_at = ?1 WHERE id = ?2", (i64::MAX, id))
            .unwrap();

        let err = get(&conn, id).unwrap_err();
        assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, _)));
    }
}
