//! Field checks applied to form input before anything is written.

pub const MAX_TITLE_LEN: usize = 60;
pub const YEAR_LEN: usize = 4;
pub const MAX_NAME_LEN: usize = 20;

/// A movie needs a title of at most 60 characters and a 4 character year.
pub fn validate_movie(title: &str, year: &str) -> bool {
    !title.is_empty()
        && title.chars().count() <= MAX_TITLE_LEN
        && year.chars().count() == YEAR_LEN
}

pub fn validate_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_NAME_LEN
}

/// The login form only needs both fields filled in; anything else is a
/// credential mismatch.
pub fn validate_login(username: &str, password: &str) -> bool {
    !username.is_empty() && !password.is_empty()
}

pub fn validate_credentials(username: &str, password: &str) -> bool {
    validate_name(username) && !password.is_empty()
}
