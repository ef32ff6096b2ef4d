//! Schema migrations, tracked with `PRAGMA user_version`.
//!
//! Each entry is applied once, in order, inside its own transaction. Never edit
//! a released entry; append a new one.

use rusqlite::Connection;

pub const MIGRATIONS: &[&str] = &[
    // 1: lookup tables, seeded values and the queue itself
    "
    CREATE TABLE State (
        id   INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    INSERT INTO State (id, name) VALUES
        (1, 'Pending'), (2, 'Active'), (3, 'Complete'), (4, 'Abort'), (5, 'Skip');

    CREATE TABLE LocalSource (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );
    INSERT INTO LocalSource (name) VALUES ('Sonarr'), ('Radarr'), ('Api');

    CREATE TABLE RemoteSource (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE RemoteGroup (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE Queue (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        state         INTEGER NOT NULL REFERENCES State(id),
        name          TEXT NOT NULL,
        path          TEXT NOT NULL,
        added_at      INTEGER NOT NULL,
        last_updated  INTEGER NOT NULL,
        local_source  INTEGER NULL REFERENCES LocalSource(id),
        remote_source INTEGER NULL REFERENCES RemoteSource(id),
        remote_group  INTEGER NULL REFERENCES RemoteGroup(id)
    );
    CREATE INDEX idx_queue_state_added ON Queue(state, added_at, id);
    CREATE INDEX idx_queue_path ON Queue(path);
    ",
];

/// Brings the schema up to the latest version. Returns the number applied.
pub fn run(conn: &mut Connection) -> rusqlite::Result<usize> {
    let current: usize = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let pending = MIGRATIONS.iter().enumerate().skip(current);

    let mut applied = 0;
    for (index, sql) in pending {
        let version = index + 1;
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        log::debug!("Applied database migration {}", version);
        applied += 1;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(run(&mut conn).unwrap(), MIGRATIONS.len());
        assert_eq!(run(&mut conn).unwrap(), 0);

        let version: usize = conn.query_row("PRAGMA user_version", [], |r| r.get(0)).unwrap();
        assert_eq!(version, MIGRATIONS.len());
    }

    #[test]
    fn test_seed_data() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();

        let states: Vec<(i64, String)> = conn
            .prepare("SELECT id, name FROM State ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(states.len(), 5);
        assert_eq!(states[0], (1, "Pending".to_string()));
        assert_eq!(states[4], (5, "Skip".to_string()));

        let sources: i64 = conn
            .query_row("SELECT COUNT(*) FROM LocalSource", [], |r| r.get(0))
            .unwrap();
        assert_eq!(sources, 3);
    }
}
