//! Best-effort outbound email
//!
//! Notifications are fire-and-forget: `dispatch` spawns the send and only
//! logs failures. Nothing is retried and callers never see the outcome.

pub mod email;

pub use email::HttpEmailNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("email service returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// One outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Tell an item owner that someone reserved their item.
    pub fn item_reserved(owner_email: &str, item_description: &str, reserver_email: &str) -> Self {
        Self {
            to: owner_email.to_string(),
            subject: "Your item was reserved".to_string(),
            body: format!(
                "Good news! \"{}\" was just reserved by {}.\n\
                 Reach out to them to arrange a pickup.",
                item_description, reserver_email
            ),
        }
    }

    /// Password reset link for `email`.
    pub fn password_reset(email: &str, reset_url: &str, token: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: "Reset your One Hand password".to_string(),
            body: format!(
                "Someone asked to reset the password for this account.\n\
                 If that was you, open the link below. Otherwise ignore this email.\n\n\
                 {}?token={}",
                reset_url, token
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError>;
}

/// Notifier used when no email service is configured; logs and drops.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(to = %message.to, subject = %message.subject, "email not sent (no notify endpoint configured)");
        Ok(())
    }
}

/// Send in the background; failures are logged, never returned.
pub fn dispatch(notifier: Arc<dyn Notifier>, message: EmailMessage) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let to = message.to.clone();
        let subject = message.subject.clone();
        match notifier.send(message).await {
            Ok(()) => tracing::debug!(%to, %subject, "notification sent"),
            Err(e) => tracing::warn!(%to, %subject, error = %e, "notification failed"),
        }
    })
}
