//! Best-effort passcode delivery.
//!
//! The dispatcher never fails: every provider error or timeout is logged and
//! absorbed. When no channel delivers, the code is written to the log under
//! the `passcode_fallback` target so the flow still works without provider
//! credentials.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::traits::BaseNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => f.write_str("email"),
            Channel::Sms => f.write_str("sms"),
        }
    }
}

/// Where a passcode can be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub phone: Option<String>,
}

impl Recipient {
    pub fn address_for(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Email => Some(self.email.as_str()),
            Channel::Sms => self.phone.as_deref(),
        }
    }
}

/// The plaintext code plus what the message needs to say about it.
#[derive(Clone)]
pub struct PasscodeMessage {
    pub code: String,
    pub valid_minutes: i64,
}

impl fmt::Debug for PasscodeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasscodeMessage")
            .field("code", &"******")
            .field("valid_minutes", &self.valid_minutes)
            .finish()
    }
}

impl PasscodeMessage {
    pub fn subject(&self) -> String {
        "Your Germany Meds passcode".to_string()
    }

    pub fn text(&self) -> String {
        format!(
            "Your Germany Meds passcode is {code}. It is valid for {minutes} minutes.\n\n\
             If you did not request this code, you can ignore this message.",
            code = self.code,
            minutes = self.valid_minutes
        )
    }

    pub fn sms_text(&self) -> String {
        format!(
            "Your Germany Meds passcode is {}. Valid for {} minutes.",
            self.code, self.valid_minutes
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// At least one channel accepted the message.
    Delivered(Vec<Channel>),
    /// Nothing delivered; the code is only in the operational log.
    LoggedOnly,
}

pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn BaseNotifier>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    /// Dispatcher with no network channels (log-only).
    pub fn new(timeout: Duration) -> Self {
        Self {
            notifiers: Vec::new(),
            timeout,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn BaseNotifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.notifiers.iter().map(|n| n.channel()).collect()
    }

    /// Try every channel the recipient can receive on. Never returns an error.
    pub async fn send(&self, recipient: &Recipient, message: &PasscodeMessage) -> DispatchOutcome {
        let mut delivered = Vec::new();

        for notifier in &self.notifiers {
            let channel = notifier.channel();
            let Some(address) = recipient.address_for(channel) else {
                debug!(%channel, email = %recipient.email, "No address for channel, skipping");
                continue;
            };

            match tokio::time::timeout(self.timeout, notifier.send_passcode(address, message))
                .await
            {
                Ok(Ok(())) => {
                    info!(%channel, email = %recipient.email, "Passcode delivered");
                    delivered.push(channel);
                }
                Ok(Err(e)) => {
                    warn!(%channel, email = %recipient.email, error = %e, "Passcode delivery failed");
                }
                Err(_) => {
                    warn!(
                        %channel,
                        email = %recipient.email,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Passcode delivery timed out"
                    );
                }
            }
        }

        if delivered.is_empty() {
            info!(
                target: "passcode_fallback",
                email = %recipient.email,
                code = %message.code,
                "Passcode not delivered over any channel; available in log only"
            );
            DispatchOutcome::LoggedOnly
        } else {
            DispatchOutcome::Delivered(delivered)
        }
    }

    /// Fire-and-forget `send` on a separate task.
    ///
    /// The handle is only useful to tests; request handlers drop it.
    pub fn dispatch_in_background(
        self: &Arc<Self>,
        recipient: Recipient,
        message: PasscodeMessage,
    ) -> JoinHandle<DispatchOutcome> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.send(&recipient, &message).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{FailingNotifier, HangingNotifier, RecordingNotifier};

    fn message() -> PasscodeMessage {
        PasscodeMessage {
            code: "123456".to_string(),
            valid_minutes: 5,
        }
    }

    fn recipient(phone: Option<&str>) -> Recipient {
        Recipient {
            email: "ana@test.com".to_string(),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_message_text_mentions_code_and_validity() {
        let text = message().text();
        assert!(text.contains("123456"));
        assert!(text.contains("5 minutes"));
        assert!(message().sms_text().contains("123456"));
    }

    #[test]
    fn test_debug_hides_code() {
        assert!(!format!("{:?}", message()).contains("123456"));
    }

    #[tokio::test]
    async fn test_no_channels_falls_back_to_log() {
        let dispatcher = NotificationDispatcher::new(Duration::from_secs(1));
        let outcome = dispatcher.send(&recipient(None), &message()).await;
        assert_eq!(outcome, DispatchOutcome::LoggedOnly);
    }

    #[tokio::test]
    async fn test_failure_is_absorbed() {
        let dispatcher = NotificationDispatcher::new(Duration::from_secs(1))
            .with_notifier(Arc::new(FailingNotifier::new(Channel::Email)));
        let outcome = dispatcher.send(&recipient(None), &message()).await;
        assert_eq!(outcome, DispatchOutcome::LoggedOnly);
    }

    #[tokio::test]
    async fn test_hung_provider_is_cut_off_by_timeout() {
        let dispatcher = NotificationDispatcher::new(Duration::from_millis(50))
            .with_notifier(Arc::new(HangingNotifier::new(Channel::Email)));

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.send(&recipient(None), &message()),
        )
        .await
        .expect("dispatcher must not hang");
        assert_eq!(outcome, DispatchOutcome::LoggedOnly);
    }

    #[tokio::test]
    async fn test_sms_skipped_without_phone() {
        let (sms, mut inbox) = RecordingNotifier::new(Channel::Sms);
        let dispatcher =
            NotificationDispatcher::new(Duration::from_secs(1)).with_notifier(Arc::new(sms));

        let outcome = dispatcher.send(&recipient(None), &message()).await;
        assert_eq!(outcome, DispatchOutcome::LoggedOnly);
        assert!(inbox.try_next().is_none());
    }

    #[tokio::test]
    async fn test_one_working_channel_is_enough() {
        let (sms, mut inbox) = RecordingNotifier::new(Channel::Sms);
        let dispatcher = NotificationDispatcher::new(Duration::from_secs(1))
            .with_notifier(Arc::new(FailingNotifier::new(Channel::Email)))
            .with_notifier(Arc::new(sms));

        let outcome = dispatcher
            .send(&recipient(Some("+491512345678")), &message())
            .await;
        assert_eq!(outcome, DispatchOutcome::Delivered(vec![Channel::Sms]));

        let sent = inbox.try_next().unwrap();
        assert_eq!(sent.address, "+491512345678");
        assert_eq!(sent.code, "123456");
    }

    #[tokio::test]
    async fn test_background_dispatch_reports_outcome() {
        let (email, mut inbox) = RecordingNotifier::new(Channel::Email);
        let dispatcher = Arc::new(
            NotificationDispatcher::new(Duration::from_secs(1)).with_notifier(Arc::new(email)),
        );

        let handle = dispatcher.dispatch_in_background(recipient(None), message());
        assert_eq!(
            handle.await.unwrap(),
            DispatchOutcome::Delivered(vec![Channel::Email])
        );
        assert_eq!(inbox.next_code().await, "123456");
    }
}
