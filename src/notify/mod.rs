//! Outbound notifications
//!
//! Push notifications through Pushover and transactional mail through an
//! injected SMTP transport. Both report failures as `Outcome`s.

pub mod mail;
pub mod push;

pub use mail::{Attachment, MailMessage, Mailer, OutgoingMail};
pub use push::{Notifier, PushNotification, PushOptions, PushoverClient};
