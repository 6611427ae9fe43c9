use serde::{Deserialize, Serialize};

/// The single administrator of a deployment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Movie {
    pub title: String,
    pub year: String,
}

impl Movie {
    pub fn new<T: Into<String>, Y: Into<String>>(title: T, year: Y) -> Self {
        Movie {
            title: title.into(),
            year: year.into(),
        }
    }
}
