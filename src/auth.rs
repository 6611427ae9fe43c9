use crate::database::{AdminDb, DbError};
use crate::error::{log_error, AppError};
use crate::model::User;
use crate::Db;
use actix_identity::{Identity, IdentityExt};
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::{debug, info};
use std::fmt;
use std::future::{ready, Ready};

#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials,
    NotConfigured,
    Db(DbError),
    Hash(bcrypt::BcryptError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::NotConfigured => write!(f, "No administrator has been configured"),
            AuthError::Db(e) => write!(f, "{}", e),
            AuthError::Hash(e) => write!(f, "Password hashing error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<DbError> for AuthError {
    fn from(e: DbError) -> Self {
        AuthError::Db(e)
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::Hash(e)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthenticated,
            AuthError::NotConfigured => AppError::NotConfigured,
            AuthError::Db(e) => e.into(),
            AuthError::Hash(e) => log_error(e, "Verification error"),
        }
    }
}

pub const HASH_COST: u32 = bcrypt::DEFAULT_COST;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Checks a username/password pair against the stored admin.
pub fn login(db: &sled::Db, username: &str, password: &str) -> Result<User, AuthError> {
    let admin = db.get_admin()?.ok_or(AuthError::NotConfigured)?;
    if admin.username != username || !bcrypt::verify(password, &admin.password_hash)? {
        info!("Rejected login attempt for {:?}", username);
        return Err(AuthError::InvalidCredentials);
    }
    Ok(admin)
}

/// The logged in administrator.
///
/// Taking this as a handler argument is what guards a route: extraction
/// fails with [`AppError::Unauthenticated`] unless the session carries the
/// identity of the current admin.
pub struct AdminSession {
    pub admin: User,
    identity: Identity,
}

impl AdminSession {
    pub fn logout(self) {
        self.identity.logout();
    }
}

fn require_session(req: &HttpRequest) -> Result<AdminSession, AppError> {
    let identity = req
        .get_identity()
        .map_err(|_| AppError::Unauthenticated)?;
    let username = identity.id().map_err(|err| {
        debug!("{:?}", err);
        AppError::Unauthenticated
    })?;
    let db = req
        .app_data::<Db>()
        .ok_or(AppError::Internal("Database unavailable"))?;
    let admin = db.get_admin()?.ok_or(AppError::NotConfigured)?;
    if admin.username != username {
        // The admin was re-provisioned since this session logged in.
        identity.logout();
        return Err(AppError::Unauthenticated);
    }
    Ok(AdminSession { admin, identity })
}

impl FromRequest for AdminSession {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(require_session(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_admin(password: &str) -> sled::Db {
        let db = sled::Config::new().temporary(true).open().unwrap();
        db.put_admin(&User {
            name: "Admin".to_owned(),
            username: "admin".to_owned(),
            password_hash: hash_password(password, 4).unwrap(),
        })
        .unwrap();
        db
    }

    #[test]
    fn correct_credentials() {
        let db = db_with_admin("secret");
        let user = login(&db, "admin", "secret").unwrap();
        assert_eq!(user.username, "admin");
    }

    #[test]
    fn wrong_password_or_username() {
        let db = db_with_admin("secret");
        assert!(matches!(
            login(&db, "admin", "Secret"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&db, "root", "secret"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&db, "", ""),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn no_admin_configured() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        assert!(matches!(
            login(&db, "admin", "secret"),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn rejected_login_redirects() {
        use actix_web::{http::StatusCode, ResponseError};
        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::FOUND);
        let err = AppError::from(AuthError::NotConfigured);
        assert_eq!(err.status_code(), StatusCode::FOUND);
    }

    #[test]
    fn hash_is_salted() {
        let a = hash_password("secret", 4).unwrap();
        let b = hash_password("secret", 4).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, "secret");
        assert!(bcrypt::verify("secret", &a).unwrap());
    }
}
