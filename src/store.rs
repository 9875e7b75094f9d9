use crate::error::StoreError;
use crate::record::{StudentFields, StudentForm, StudentRecord};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DB_FILE: &str = "students.sqlite3";

/// Access to the collection of student documents.
pub trait RecordStore {
    /// All records, newest first.
    fn list_records(&self) -> Result<Vec<StudentRecord>, StoreError>;
    /// Removes one record. Removing an id that is not stored is not an error.
    fn delete_record(&self, id: &str) -> Result<(), StoreError>;
    /// Stores a submitted form for `user_id`; the store assigns id and time.
    fn create_record(&self, user_id: &str, form: &StudentForm)
        -> Result<StudentRecord, StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let path = workspace.join(DB_FILE);
        let conn = Connection::open(&path)?;

        // Documents stay schemaless: the body is whatever JSON the form produced.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS student_records(
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                data TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creation time for the next document, never earlier than the latest
    /// stored one so newest-first order matches write order.
    fn next_created_at(&self) -> Result<DateTime<Utc>, StoreError> {
        // stored with microsecond precision
        let now = Utc::now().trunc_subsecs(6);
        // Compared as parsed times: hand-written rows may use another
        // RFC 3339 spelling, which breaks text order.
        let mut stmt = self.conn.prepare("SELECT created_at FROM student_records")?;
        let last = stmt
            .query_map([], |r| r.get::<_, String>(0))
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())?
            .iter()
            .filter_map(|s| parse_created_at(s).ok())
            .max();
        match last {
            Some(last) if now <= last => Ok(last + Duration::microseconds(1)),
            _ => Ok(now),
        }
    }
}

fn format_created_at(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_created_at(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

impl RecordStore for SqliteStore {
    fn list_records(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, data
             FROM student_records
             ORDER BY seq DESC",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;

        let mut records = rows
            .into_iter()
            .map(|(id, created_at, data)| {
                let created_at = parse_created_at(&created_at).map_err(|e| StoreError::Corrupt {
                    id: id.clone(),
                    message: e.to_string(),
                })?;
                let mut fields: StudentFields =
                    serde_json::from_str(&data).map_err(|e| StoreError::Corrupt {
                        id: id.clone(),
                        message: e.to_string(),
                    })?;
                fields.strip_store_fields();
                Ok(StudentRecord {
                    id,
                    created_at,
                    fields,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        // stable: equal times stay newest-inserted first
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn delete_record(&self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM student_records WHERE id = ?", [id])?;
        if changed == 0 {
            log::warn!("delete of unknown record {} removed nothing", id);
        } else {
            log::info!("deleted record {}", id);
        }
        Ok(())
    }

    fn create_record(
        &self,
        user_id: &str,
        form: &StudentForm,
    ) -> Result<StudentRecord, StoreError> {
        let fields = form.submission(user_id);
        let data = serde_json::to_string(&fields)
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        let id = Uuid::new_v4().to_string();
        let created_at = self.next_created_at()?;

        self.conn.execute(
            "INSERT INTO student_records(id, user_id, created_at, data) VALUES(?, ?, ?, ?)",
            (&id, user_id, format_created_at(&created_at), &data),
        )?;
        log::info!("stored record {} for user {}", id, user_id);

        Ok(StudentRecord {
            id,
            created_at,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn form(name: &str) -> StudentForm {
        StudentForm::new(None).with_field("fullName", name)
    }

    #[test]
    fn list_is_newest_first() {
        let store = SqliteStore::open(&temp_dir("studentd-store-order")).expect("open");
        let a = store.create_record("u1", &form("A")).expect("create a");
        let b = store.create_record("u2", &form("B")).expect("create b");
        let c = store.create_record("u3", &form("C")).expect("create c");
        assert!(a.created_at < b.created_at && b.created_at < c.created_at);

        let ids: Vec<String> = store
            .list_records()
            .expect("list")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn stored_record_round_trips_fields() {
        let store = SqliteStore::open(&temp_dir("studentd-store-fields")).expect("open");
        let f = form("Asha")
            .with_field("feeDeposited", "1500")
            .with_field("hostel", "B-12");
        let created = store.create_record("uid-9", &f).expect("create");
        assert_eq!(created.fields.user_id.as_deref(), Some("uid-9"));

        let listed = store.list_records().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], created);
        assert_eq!(listed[0].fields.text("hostel").as_deref(), Some("B-12"));
        assert_eq!(listed[0].fields.pending_fee.as_deref(), Some("Nil"));
    }

    #[test]
    fn delete_removes_one_and_tolerates_unknown_ids() {
        let store = SqliteStore::open(&temp_dir("studentd-store-delete")).expect("open");
        let a = store.create_record("u1", &form("A")).expect("create a");
        let b = store.create_record("u2", &form("B")).expect("create b");

        store.delete_record(&a.id).expect("delete a");
        store.delete_record("no-such-id").expect("delete unknown");
        store.delete_record(&a.id).expect("delete a again");

        let left = store.list_records().expect("list");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[test]
    fn tolerates_hand_written_documents() {
        let store = SqliteStore::open(&temp_dir("studentd-store-loose")).expect("open");
        store
            .conn
            .execute(
                "INSERT INTO student_records(id, user_id, created_at, data) VALUES(?, ?, ?, ?)",
                (
                    "legacy-1",
                    "u0",
                    "2024-01-01T00:00:00.000000Z",
                    r#"{"semester":4,"id":"shadow","fullName":"Old","username":""}"#,
                ),
            )
            .expect("insert");
        let listed = store.list_records().expect("list");
        assert_eq!(listed[0].id, "legacy-1");
        assert_eq!(listed[0].fields.semester.as_deref(), Some("4"));
        assert!(!listed[0].fields.extra.contains_key("id"));
        assert_eq!(listed[0].fields.text("username").as_deref(), Some(""));
    }

    #[test]
    fn undecodable_document_is_reported() {
        let store = SqliteStore::open(&temp_dir("studentd-store-corrupt")).expect("open");
        store
            .conn
            .execute(
                "INSERT INTO student_records(id, user_id, created_at, data) VALUES(?, ?, ?, ?)",
                ("bad", "u0", "2024-01-01T00:00:00.000000Z", "not json"),
            )
            .expect("insert");
        match store.list_records() {
            Err(StoreError::Corrupt { id, .. }) => assert_eq!(id, "bad"),
            other => panic!("expected corrupt error, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn ordering_uses_time_not_text() {
        let store = SqliteStore::open(&temp_dir("studentd-store-time-order")).expect("open");
        for (id, at) in [
            ("whole", "2100-01-01T00:00:00Z"),
            ("half", "2100-01-01T00:00:00.500000Z"),
            ("offset", "2100-01-01T01:00:00.250+01:00"),
        ] {
            store
                .conn
                .execute(
                    "INSERT INTO student_records(id, user_id, created_at, data) VALUES(?, ?, ?, ?)",
                    (id, "u0", at, "{}"),
                )
                .expect("insert");
        }

        let ids: Vec<String> = store
            .list_records()
            .expect("list")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["half", "offset", "whole"]);

        let next = store.create_record("u1", &form("New")).expect("create");
        let latest = parse_created_at("2100-01-01T00:00:00.500000Z").expect("parse");
        assert_eq!(next.created_at, latest + Duration::microseconds(1));
        assert_eq!(store.list_records().expect("list")[0].id, next.id);
    }
}
