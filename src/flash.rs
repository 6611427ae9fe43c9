//! One-shot messages carried in the session until the next rendered page.

use crate::error::{log_error, AppError};
use actix_session::Session;
use log::debug;

const FLASH_KEY: &str = "_flashes";
// Sessions live in a cookie, so the queue has to stay small.
const MAX_QUEUED: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flash {
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    InvalidInput,
    LoginSuccess,
    InvalidCredentials,
    NotConfigured,
    Goodbye,
    SettingsUpdated,
}

impl Flash {
    pub fn message(self) -> &'static str {
        match self {
            Flash::ItemCreated => "Item created.",
            Flash::ItemUpdated => "Item updated.",
            Flash::ItemDeleted => "Item deleted.",
            Flash::InvalidInput => "Invalid input.",
            Flash::LoginSuccess => "Login success.",
            Flash::InvalidCredentials => "Invalid username or password.",
            Flash::NotConfigured => "No administrator has been configured.",
            Flash::Goodbye => "Goodbye.",
            Flash::SettingsUpdated => "Settings updated.",
        }
    }
}

pub fn push(session: &Session, flash: Flash) -> Result<(), AppError> {
    let mut messages: Vec<String> = session
        .get(FLASH_KEY)
        .map_err(|err| log_error(err, "Session error"))?
        .unwrap_or_default();
    queue(&mut messages, flash);
    session
        .insert(FLASH_KEY, messages)
        .map_err(|err| log_error(err, "Session error"))
}

fn queue(messages: &mut Vec<String>, flash: Flash) {
    let message = flash.message();
    if messages.iter().any(|m| m == message) {
        return;
    }
    if messages.len() >= MAX_QUEUED {
        messages.remove(0);
    }
    messages.push(message.to_owned());
}

/// Drains the queued messages.
pub fn take(session: &Session) -> Vec<String> {
    match session.remove_as::<Vec<String>>(FLASH_KEY) {
        Some(Ok(messages)) => messages,
        Some(Err(raw)) => {
            debug!("Discarding malformed flash messages: {}", raw);
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_messages_are_queued_once() {
        let mut messages = Vec::new();
        for _ in 0..100 {
            queue(&mut messages, Flash::InvalidInput);
        }
        queue(&mut messages, Flash::LoginSuccess);
        queue(&mut messages, Flash::InvalidInput);
        assert_eq!(messages, ["Invalid input.", "Login success."]);
    }

    #[test]
    fn queue_is_bounded() {
        let all = [
            Flash::ItemCreated,
            Flash::ItemUpdated,
            Flash::ItemDeleted,
            Flash::InvalidInput,
            Flash::LoginSuccess,
            Flash::InvalidCredentials,
            Flash::NotConfigured,
            Flash::Goodbye,
            Flash::SettingsUpdated,
        ];
        let mut messages = Vec::new();
        for flash in all.iter() {
            queue(&mut messages, *flash);
        }
        assert_eq!(messages.len(), MAX_QUEUED);
        assert_eq!(messages.last().unwrap(), "Settings updated.");
        assert_eq!(messages[0], "Item updated.");
    }
}
