use crate::database::DbError;
use actix_web::{http::header, http::StatusCode, HttpResponse, ResponseError};
use log::debug;
use std::fmt;

/// Errors surfaced at the request boundary.
#[derive(Debug)]
pub enum AppError {
    Unauthenticated,
    NotConfigured,
    NotFound,
    Internal(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "Not logged in"),
            AppError::NotConfigured => write!(f, "No administrator has been configured"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::NotConfigured => StatusCode::FOUND,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthenticated | AppError::NotConfigured => redirect("/login"),
            _ => HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
        }
    }
}

pub fn log_error<E: fmt::Debug>(err: E, message: &'static str) -> AppError {
    debug!("{:?}", err);
    AppError::Internal(message)
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => AppError::NotFound,
            err => log_error(err, "Database error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_redirects_to_login() {
        let res = AppError::Unauthenticated.error_response();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[test]
    fn missing_record_is_not_found() {
        let err = AppError::from(DbError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = AppError::from(DbError::CorruptKey);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
