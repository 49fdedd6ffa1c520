//! Account tables: `users`, `sessions`.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::catalog_db::conversion_err;
use super::Database;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

impl Database {
    pub fn insert_user(&self, user: &UserRow) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.created_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: parse_ts(row, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub fn insert_session(
        &self,
        token: &str,
        user_id: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![token, user_id, created_at.to_rfc3339(), expires_at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn session(&self, token: &str) -> Result<Option<SessionRow>> {
        let session = self
            .conn()
            .query_row(
                "SELECT s.token, s.user_id, u.email, s.created_at, s.expires_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1",
                params![token],
                |row| {
                    Ok(SessionRow {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                        email: row.get(2)?,
                        created_at: parse_ts(row, 3)?,
                        expires_at: parse_ts(row, 4)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Move a session's expiry. Returns false if the token is unknown.
    pub fn extend_session(&self, token: &str, expires_at: DateTime<Utc>) -> Result<bool> {
        let updated = self.conn().execute(
            "UPDATE sessions SET expires_at = ?2 WHERE token = ?1",
            params![token, expires_at.to_rfc3339()],
        )?;
        Ok(updated > 0)
    }

    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> UserRow {
        UserRow {
            id: "u1".to_string(),
            email: "hero@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_email_is_a_constraint_error() {
        let db = Database::open_memory().unwrap();
        db.insert_user(&user()).unwrap();
        let mut dup = user();
        dup.id = "u2".to_string();
        let err = db.insert_user(&dup).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Database(crate::error::DatabaseError::Constraint(_))
        ));
    }

    #[test]
    fn session_lifecycle() {
        let db = Database::open_memory().unwrap();
        db.insert_user(&user()).unwrap();
        let now = Utc::now();
        db.insert_session("tok", "u1", now, now + Duration::minutes(60)).unwrap();

        let s = db.session("tok").unwrap().unwrap();
        assert_eq!(s.email, "hero@example.com");

        let later = now + Duration::minutes(120);
        assert!(db.extend_session("tok", later).unwrap());
        assert_eq!(db.session("tok").unwrap().unwrap().expires_at.timestamp(), later.timestamp());

        db.delete_session("tok").unwrap();
        assert!(db.session("tok").unwrap().is_none());
        assert!(!db.extend_session("tok", later).unwrap());
    }
}
