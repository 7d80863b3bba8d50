//! Outcome of a fire-and-forget collaborator call
//!
//! Mail and push delivery never propagate errors to the caller: failures
//! are logged where they happen and reported back as an `Outcome`, which
//! can still be inspected for the cause.

use std::fmt;

/// Success flag plus the error that caused a failure
#[derive(Debug)]
#[must_use]
pub struct Outcome<E> {
    error: Option<E>,
}

impl<E> Outcome<E> {
    pub fn success() -> Self {
        Self { error: None }
    }

    pub fn failure(error: E) -> Self {
        Self { error: Some(error) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The failure cause, `None` on success
    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<(), E> {
        match self.error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl<E> From<Result<(), E>> for Outcome<E> {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(e) => Self::failure(e),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Outcome<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => f.write_str("ok"),
            Some(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Why a mail or push notification was not delivered
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no {kind} profile named '{name}'")]
    UnknownProfile { kind: &'static str, name: String },

    #[error("no secret stored for '{0}'")]
    MissingSecret(String),

    #[error("invalid recipient address '{0}'")]
    InvalidAddress(String),

    #[error("message has no recipients")]
    NoRecipients,

    #[error("attachment '{title}' is not valid base64: {reason}")]
    Attachment { title: String, reason: String },

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        let ok: Outcome<DeliveryError> = Ok(()).into();
        assert!(ok.is_success());
        assert!(ok.error().is_none());
        assert_eq!(ok.to_string(), "ok");

        let failed: Outcome<DeliveryError> = Err(DeliveryError::NoRecipients).into();
        assert!(!failed.is_success());
        assert!(matches!(failed.error(), Some(DeliveryError::NoRecipients)));
        assert_eq!(failed.to_string(), "failed: message has no recipients");
    }

    #[test]
    fn test_into_result() {
        let failed = Outcome::failure(DeliveryError::MissingSecret("push:ops".into()));
        assert!(matches!(
            failed.into_result(),
            Err(DeliveryError::MissingSecret(key)) if key == "push:ops"
        ));
    }
}
