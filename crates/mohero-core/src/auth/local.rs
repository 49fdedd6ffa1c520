//! Account and session handling against the local database.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use super::validation::{normalize_email, validate_sign_in, validate_sign_up};
use super::{Session, SignUp};
use crate::error::{AuthError, CoreError, DatabaseError, Result};
use crate::storage::{Config, Database, SessionRow, UserRow};

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Argon2id hash in PHC string form; the salt and parameters travel inside it.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()).into())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn to_session(row: SessionRow) -> Session {
    Session {
        user_id: row.user_id,
        email: row.email,
        token: row.token,
        expires_at: row.expires_at,
    }
}

/// Authentication backed by the `users` and `sessions` tables.
pub struct LocalAuth<'a> {
    db: &'a Database,
    ttl: Duration,
    min_password_len: usize,
}

impl<'a> LocalAuth<'a> {
    pub fn new(db: &'a Database, config: &Config) -> Self {
        Self {
            db,
            ttl: config.session_ttl(),
            min_password_len: config.auth.min_password_len,
        }
    }

    /// Create an account and its profile, then open a session.
    pub fn sign_up(&self, req: &SignUp, now: DateTime<Utc>) -> Result<Session> {
        validate_sign_up(&req.email, &req.password, &req.name, self.min_password_len)?;
        let email = normalize_email(&req.email);

        if self.db.user_by_email(&email)?.is_some() {
            return Err(AuthError::EmailTaken(email).into());
        }

        let user = UserRow {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            password_hash: hash_password(&req.password)?,
            created_at: now,
        };

        let tx = self.db.conn().unchecked_transaction()?;
        match self.db.insert_user(&user) {
            Err(CoreError::Database(DatabaseError::Constraint(_))) => {
                return Err(AuthError::EmailTaken(email).into());
            }
            other => other?,
        }
        let clan = req.clan.as_deref().map(str::trim).filter(|c| !c.is_empty());
        self.db.create_profile(&user.id, req.name.trim(), clan)?;
        tx.commit()?;

        tracing::info!(user = %user.id, "account created");
        self.open_session(&user.id, &email, now)
    }

    pub fn sign_in(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session> {
        validate_sign_in(email, password)?;
        let email = normalize_email(email);
        let user = self
            .db
            .user_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(email = %email, "password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }
        self.open_session(&user.id, &user.email, now)
    }

    fn open_session(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> Result<Session> {
        let token = random_hex(32);
        let expires_at = now + self.ttl;
        self.db.insert_session(&token, user_id, now, expires_at)?;
        Ok(Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
            token,
            expires_at,
        })
    }

    pub fn sign_out(&self, token: &str) -> Result<()> {
        self.db.delete_session(token)
    }

    /// The live session for `token`; `None` if unknown or expired.
    pub fn current_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        Ok(self
            .db
            .session(token)?
            .map(to_session)
            .filter(|s| !s.is_expired(now)))
    }

    /// Extend a live session by the configured lifetime.
    pub fn refresh_session(&self, token: &str, now: DateTime<Utc>) -> Result<Session> {
        let session = self
            .db
            .session(token)?
            .map(to_session)
            .ok_or(AuthError::NotAuthenticated)?;
        if session.is_expired(now) {
            return Err(AuthError::SessionExpired.into());
        }
        let expires_at = now + self.ttl;
        if !self.db.extend_session(token, expires_at)? {
            return Err(AuthError::NotAuthenticated.into());
        }
        tracing::debug!(user = %session.user_id, %expires_at, "session refreshed");
        Ok(Session {
            expires_at,
            ..session
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn signup(email: &str) -> SignUp {
        SignUp {
            email: email.to_string(),
            password: "secret12".to_string(),
            name: "Hero".to_string(),
            clan: Some("  ".to_string()),
        }
    }

    #[test]
    fn sign_up_creates_profile_and_session() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        let now = Utc::now();
        let session = auth.sign_up(&signup("Hero@Example.com"), now).unwrap();
        assert_eq!(session.email, "hero@example.com");
        assert_eq!(session.expires_at, now + Duration::minutes(60));

        let profile = db.profile(&session.user_id).unwrap().unwrap();
        assert_eq!(profile.name, "Hero");
        assert_eq!(profile.clan, None);
    }

    #[test]
    fn duplicate_sign_up_is_rejected() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        auth.sign_up(&signup("hero@example.com"), Utc::now()).unwrap();
        let err = auth.sign_up(&signup("HERO@example.com"), Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::EmailTaken(_))));
    }

    #[test]
    fn validation_runs_before_storage() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        let mut req = signup("hero@example.com");
        req.password = "123".to_string();
        let err = auth.sign_up(&req, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::PasswordTooShort { min: 6 })
        ));
        assert!(db.user_by_email("hero@example.com").unwrap().is_none());
    }

    #[test]
    fn sign_in_checks_password() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        auth.sign_up(&signup("hero@example.com"), Utc::now()).unwrap();

        assert!(auth.sign_in("hero@example.com", "secret12", Utc::now()).is_ok());
        assert!(matches!(
            auth.sign_in("hero@example.com", "wrong-pass", Utc::now()),
            Err(CoreError::Auth(AuthError::InvalidCredentials))
        ));
        assert!(matches!(
            auth.sign_in("nobody@example.com", "secret12", Utc::now()),
            Err(CoreError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[test]
    fn passwords_stored_as_salted_argon2() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        auth.sign_up(&signup("a@example.com"), Utc::now()).unwrap();
        auth.sign_up(&signup("b@example.com"), Utc::now()).unwrap();

        let a = db.user_by_email("a@example.com").unwrap().unwrap();
        let b = db.user_by_email("b@example.com").unwrap().unwrap();
        assert!(a.password_hash.starts_with("$argon2id$"));
        assert!(!a.password_hash.contains("secret12"));
        assert_ne!(a.password_hash, b.password_hash);
        assert!(verify_password("secret12", &a.password_hash).unwrap());
        assert!(!verify_password("secret13", &a.password_hash).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        assert!(matches!(
            verify_password("secret12", "not-a-phc-string"),
            Err(CoreError::Auth(AuthError::PasswordHash(_)))
        ));
    }

    #[test]
    fn refresh_and_expiry() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        let t0 = Utc::now();
        let session = auth.sign_up(&signup("hero@example.com"), t0).unwrap();

        let t1 = t0 + Duration::minutes(50);
        let refreshed = auth.refresh_session(&session.token, t1).unwrap();
        assert_eq!(refreshed.expires_at, t1 + Duration::minutes(60));
        assert!(auth.current_session(&session.token, t0 + Duration::minutes(100)).unwrap().is_some());

        let late = t1 + Duration::minutes(61);
        assert!(auth.current_session(&session.token, late).unwrap().is_none());
        assert!(matches!(
            auth.refresh_session(&session.token, late),
            Err(CoreError::Auth(AuthError::SessionExpired))
        ));
    }

    #[test]
    fn sign_out_invalidates_token() {
        let db = Database::open_memory().unwrap();
        let auth = LocalAuth::new(&db, &Config::default());
        let session = auth.sign_up(&signup("hero@example.com"), Utc::now()).unwrap();
        auth.sign_out(&session.token).unwrap();
        assert!(auth.current_session(&session.token, Utc::now()).unwrap().is_none());
        assert!(matches!(
            auth.refresh_session(&session.token, Utc::now()),
            Err(CoreError::Auth(AuthError::NotAuthenticated))
        ));
    }
}
