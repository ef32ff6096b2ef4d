//! Lifecycle state of a queue item.

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;

/// Persisted state of a queue row. Discriminants are the `State` table ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i64)]
pub enum QueueState {
    Pending = 1,
    Active = 2,
    Complete = 3,
    Abort = 4,
    Skip = 5,
}

impl QueueState {
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(QueueState::Pending),
            2 => Some(QueueState::Active),
            3 => Some(QueueState::Complete),
            4 => Some(QueueState::Abort),
            5 => Some(QueueState::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueState::Pending => "Pending",
            QueueState::Active => "Active",
            QueueState::Complete => "Complete",
            QueueState::Abort => "Abort",
            QueueState::Skip => "Skip",
        };
        f.write_str(name)
    }
}

impl ToSql for QueueState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.id()))
    }
}

impl FromSql for QueueState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let id = value.as_i64()?;
        QueueState::from_id(id).ok_or(FromSqlError::OutOfRange(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_seeded_table() {
        for (id, state) in [
            (1, QueueState::Pending),
            (2, QueueState::Active),
            (3, QueueState::Complete),
            (4, QueueState::Abort),
            (5, QueueState::Skip),
        ] {
            assert_eq!(state.id(), id);
            assert_eq!(QueueState::from_id(id), Some(state));
        }
        assert_eq!(QueueState::from_id(0), None);
    }

    #[test]
    fn test_sql_round_trip_rejects_unknown_ids() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let state: QueueState = conn
            .query_row("SELECT ?1", [QueueState::Abort], |r| r.get(0))
            .unwrap();
        assert_eq!(state, QueueState::Abort);

        let unknown: rusqlite::Result<QueueState> = conn.query_row("SELECT 9", [], |r| r.get(0));
        assert!(unknown.is_err());
    }
}
