//! SQLite-backed card store.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{CardId, CardStore, schema};
use crate::error::StoreError;
use crate::profile::Profile;

/// Card store persisted in a single SQLite database file.
///
/// The connection is shared behind a mutex; SQLite serializes writers, so
/// concurrent `put`s to the same card resolve to the last committed write.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        schema::init_schema(&conn)?;

        tracing::info!(path = %path.display(), "card database opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CardStore for SqliteStore {
    fn put(&self, id: &CardId, profile: &Profile) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cards (
                id, name, title, company, phone, email,
                profile_image, website, linkedin, twitter,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                CAST(strftime('%s', 'now') AS INTEGER),
                CAST(strftime('%s', 'now') AS INTEGER)
            )
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                company = excluded.company,
                phone = excluded.phone,
                email = excluded.email,
                profile_image = excluded.profile_image,
                website = excluded.website,
                linkedin = excluded.linkedin,
                twitter = excluded.twitter,
                updated_at = excluded.updated_at",
            params![
                id.as_str(),
                profile.name,
                profile.title,
                profile.company,
                profile.phone,
                profile.email,
                profile.profile_image,
                profile.website,
                profile.linkedin,
                profile.twitter,
            ],
        )?;
        Ok(())
    }

    fn replace(&self, id: &CardId, profile: &Profile) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE cards SET
                name = ?2,
                title = ?3,
                company = ?4,
                phone = ?5,
                email = ?6,
                profile_image = ?7,
                website = ?8,
                linkedin = ?9,
                twitter = ?10,
                updated_at = CAST(strftime('%s', 'now') AS INTEGER)
            WHERE id = ?1",
            params![
                id.as_str(),
                profile.name,
                profile.title,
                profile.company,
                profile.phone,
                profile.email,
                profile.profile_image,
                profile.website,
                profile.linkedin,
                profile.twitter,
            ],
        )?;
        Ok(changed > 0)
    }

    fn get(&self, id: &CardId) -> Result<Option<Profile>, StoreError> {
        let conn = self.conn.lock();
        let profile = conn
            .query_row(
                "SELECT name, title, company, phone, email,
                        profile_image, website, linkedin, twitter
                 FROM cards WHERE id = ?1",
                [id.as_str()],
                profile_from_row,
            )
            .optional()?;

        match profile {
            Some(p) if p.name.is_empty() || p.email.is_empty() => Err(StoreError::Corrupt {
                card_id: id.to_string(),
                reason: "missing name or email".to_string(),
            }),
            other => Ok(other),
        }
    }

    fn exists(&self, id: &CardId) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let found = conn
            .query_row("SELECT 1 FROM cards WHERE id = ?1", [id.as_str()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn delete(&self, id: &CardId) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cards WHERE id = ?1", [id.as_str()])?;
        Ok(())
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        name: row.get(0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        profile_image: row.get(5)?,
        website: row.get(6)?,
        linkedin: row.get(7)?,
        twitter: row.get(8)?,
    })
}
