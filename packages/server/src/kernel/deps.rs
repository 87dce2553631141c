//! Server dependencies and adapters for the external providers.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use async_trait::async_trait;
use brevo::{BrevoClient, BrevoOptions, Email};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use twilio::{TwilioOptions, TwilioService};

use super::memory_store::MemoryStore;
use super::notifications::{Channel, NotificationDispatcher, PasscodeMessage};
use super::postgres_store::PostgresStore;
use super::traits::{BaseClock, BaseIdentityStore, BaseNotifier, BasePasscodeStore};
use crate::config::Config;
use crate::domains::auth::JwtService;

// =============================================================================
// Provider adapters
// =============================================================================

/// SMS delivery through Twilio Messaging
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseNotifier for TwilioAdapter {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send_passcode(&self, address: &str, message: &PasscodeMessage) -> Result<()> {
        self.0
            .send_sms(address, &message.sms_text())
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// E-mail delivery through Brevo
pub struct BrevoAdapter(pub Arc<BrevoClient>);

impl BrevoAdapter {
    pub fn new(client: Arc<BrevoClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseNotifier for BrevoAdapter {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send_passcode(&self, address: &str, message: &PasscodeMessage) -> Result<()> {
        let email = Email {
            to_email: address.to_string(),
            to_name: None,
            subject: message.subject(),
            text: Some(message.text()),
            html: None,
        };
        self.0
            .send_email(email)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// Wall clock
pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Passcode rules applied by the auth actions.
#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    pub passcode_ttl: Duration,
    /// Wrong guesses allowed on one passcode before it is locked.
    pub max_attempts: i32,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            passcode_ttl: Duration::minutes(5),
            max_attempts: 5,
        }
    }
}

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub identities: Arc<dyn BaseIdentityStore>,
    pub passcodes: Arc<dyn BasePasscodeStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub jwt_service: Arc<JwtService>,
    pub clock: Arc<dyn BaseClock>,
    pub policy: AuthPolicy,
}

impl ServerDeps {
    pub fn new(
        identities: Arc<dyn BaseIdentityStore>,
        passcodes: Arc<dyn BasePasscodeStore>,
        dispatcher: Arc<NotificationDispatcher>,
        jwt_service: Arc<JwtService>,
        clock: Arc<dyn BaseClock>,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            identities,
            passcodes,
            dispatcher,
            jwt_service,
            clock,
            policy,
        }
    }

    /// Wire everything from configuration. `pool` is `None` for in-memory mode.
    pub fn from_config(config: &Config, pool: Option<PgPool>) -> Self {
        let (identities, passcodes): (Arc<dyn BaseIdentityStore>, Arc<dyn BasePasscodeStore>) =
            match pool {
                Some(pool) => {
                    let store = Arc::new(PostgresStore::new(pool));
                    (store.clone() as Arc<dyn BaseIdentityStore>, store as Arc<dyn BasePasscodeStore>)
                }
                None => {
                    warn!("Using in-memory stores; identities and passcodes are lost on restart");
                    let store = Arc::new(MemoryStore::new());
                    (store.clone() as Arc<dyn BaseIdentityStore>, store as Arc<dyn BasePasscodeStore>)
                }
            };

        let session_ttl = Duration::seconds(config.session_ttl_seconds);
        let jwt_service = match &config.jwt_secret {
            Some(secret) => JwtService::new(secret.as_bytes(), config.jwt_issuer.clone(), session_ttl),
            None => JwtService::with_random_secret(config.jwt_issuer.clone(), session_ttl),
        };

        let policy = AuthPolicy {
            passcode_ttl: Duration::seconds(config.passcode_ttl_seconds),
            max_attempts: config.passcode_max_attempts,
        };

        Self::new(
            identities,
            passcodes,
            Arc::new(build_dispatcher(config)),
            Arc::new(jwt_service),
            Arc::new(SystemClock),
            policy,
        )
    }
}

fn build_dispatcher(config: &Config) -> NotificationDispatcher {
    let mut dispatcher =
        NotificationDispatcher::new(StdDuration::from_secs(config.notification_timeout_seconds));

    if let Some(brevo) = &config.brevo {
        let client = BrevoClient::new(BrevoOptions {
            api_key: brevo.api_key.clone(),
            sender_email: brevo.sender_email.clone(),
            sender_name: brevo.sender_name.clone(),
        });
        dispatcher = dispatcher.with_notifier(Arc::new(BrevoAdapter::new(Arc::new(client))));
    }

    if let Some(twilio) = &config.twilio {
        let service = TwilioService::new(TwilioOptions {
            account_sid: twilio.account_sid.clone(),
            auth_token: twilio.auth_token.clone(),
            from_number: twilio.from_number.clone(),
        });
        dispatcher = dispatcher.with_notifier(Arc::new(TwilioAdapter::new(Arc::new(service))));
    }

    let channels = dispatcher.channels();
    if channels.is_empty() {
        warn!("No notification provider configured; passcodes will only be written to the log");
    } else {
        info!(?channels, "Notification channels configured");
    }

    dispatcher
}
