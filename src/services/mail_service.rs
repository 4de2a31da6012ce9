use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn verification_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Email verification code".to_string(),
            body: format!("Your verification code is {}. It expires in 24 hours.", code),
        }
    }

    pub fn password_reset_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Password reset code".to_string(),
            body: format!("Your password reset code is {}. It expires in 15 minutes.", code),
        }
    }
}

/// Transport d'e-mails sortants
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Mailer qui écrit les messages dans les logs (pas de transport SMTP)
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(from = %self.from, to = %message.to, subject = %message.subject, "outgoing mail");
        tracing::debug!(body = %message.body, "mail body");
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Garde les messages envoyés pour les assertions, ou échoue à la demande
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<MailMessage>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self { sent: Mutex::new(Vec::new()), fail: true }
        }

        pub fn messages(&self) -> Vec<MailMessage> {
            self.sent.lock().unwrap().clone()
        }

        /// Dernier code à 6 chiffres envoyé à cette adresse
        pub fn last_code_for(&self, to: &str) -> Option<String> {
            self.messages()
                .into_iter()
                .rev()
                .find(|m| m.to == to)
                .and_then(|m| {
                    m.body
                        .split_whitespace()
                        .map(|w| w.trim_end_matches('.'))
                        .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
                        .map(str::to_string)
                })
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Transport("smtp unreachable".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    #[tokio::test]
    async fn test_recording_mailer_extracts_code() {
        let mailer = RecordingMailer::default();
        mailer.send(MailMessage::verification_code("a@x.com", "123456")).await.unwrap();
        assert_eq!(mailer.last_code_for("a@x.com").as_deref(), Some("123456"));
        assert_eq!(mailer.last_code_for("b@x.com"), None);
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = LogMailer::new("no-reply@localhost");
        assert!(mailer.send(MailMessage::password_reset_code("a@x.com", "654321")).await.is_ok());
    }
}
