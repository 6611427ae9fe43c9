pub mod auth;
pub mod cli;
pub mod commands;
pub mod database;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod model;
pub mod validate;

use actix_identity::{config::LogoutBehaviour, IdentityMiddleware};
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, web};

pub type Tera = web::Data<tera::Tera>;
pub type Db = web::Data<sled::Db>;

pub const SESSION_COOKIE: &str = "watchlist";

pub fn load_templates() -> tera::Result<tera::Tera> {
    tera::Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*"))
}

/// Sessions live entirely in a signed and encrypted cookie.
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .build()
}

// Logging out only drops the identity so the "Goodbye." flash survives.
pub fn identity_middleware() -> IdentityMiddleware {
    IdentityMiddleware::builder()
        .logout_behaviour(LogoutBehaviour::DeleteIdentityKeys)
        .build()
}
