// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio::sync::mpsc;

use super::memory_store::MemoryStore;
use super::notifications::{Channel, NotificationDispatcher, PasscodeMessage};
use super::traits::{BaseClock, BaseNotifier, BasePasscodeStore, StoreError};
use super::{AuthPolicy, ServerDeps};
use crate::common::PasscodeId;
use crate::domains::auth::{JwtService, PasscodeRequest};

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "test_issuer";

// =============================================================================
// Mock Clock
// =============================================================================

/// Clock that only moves when told to
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl BaseClock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// Mock Notifiers
// =============================================================================

/// One captured delivery
#[derive(Debug, Clone)]
pub struct SentPasscode {
    pub channel: Channel,
    pub address: String,
    pub code: String,
}

/// Receiving end of a `RecordingNotifier`
pub struct PasscodeInbox {
    rx: mpsc::UnboundedReceiver<SentPasscode>,
}

impl PasscodeInbox {
    /// Wait (up to 5s) for the next delivery.
    pub async fn next(&mut self) -> SentPasscode {
        tokio::time::timeout(StdDuration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a passcode delivery")
            .expect("notifier dropped")
    }

    pub async fn next_code(&mut self) -> String {
        self.next().await.code
    }

    /// Non-blocking: a delivery that already happened, if any.
    pub fn try_next(&mut self) -> Option<SentPasscode> {
        self.rx.try_recv().ok()
    }
}

/// Notifier that succeeds and hands every message to a `PasscodeInbox`
pub struct RecordingNotifier {
    channel: Channel,
    tx: mpsc::UnboundedSender<SentPasscode>,
}

impl RecordingNotifier {
    pub fn new(channel: Channel) -> (Self, PasscodeInbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { channel, tx }, PasscodeInbox { rx })
    }
}

#[async_trait]
impl BaseNotifier for RecordingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send_passcode(&self, address: &str, message: &PasscodeMessage) -> Result<()> {
        let _ = self.tx.send(SentPasscode {
            channel: self.channel,
            address: address.to_string(),
            code: message.code.clone(),
        });
        Ok(())
    }
}

/// Notifier whose provider always rejects
pub struct FailingNotifier {
    channel: Channel,
}

impl FailingNotifier {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl BaseNotifier for FailingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send_passcode(&self, _address: &str, _message: &PasscodeMessage) -> Result<()> {
        anyhow::bail!("provider rejected credentials")
    }
}

/// Notifier whose provider never answers
pub struct HangingNotifier {
    channel: Channel,
}

impl HangingNotifier {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl BaseNotifier for HangingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send_passcode(&self, _address: &str, _message: &PasscodeMessage) -> Result<()> {
        tokio::time::sleep(StdDuration::from_secs(3600)).await;
        Ok(())
    }
}

// =============================================================================
// Delayed Passcode Store
// =============================================================================

/// MemoryStore whose passcode reads and writes pause for `delay`.
///
/// Concurrent verifies all read the row before any of them writes, so the
/// outcome is decided by the store's atomic updates alone.
pub struct DelayedPasscodeStore {
    inner: Arc<MemoryStore>,
    delay: StdDuration,
}

impl DelayedPasscodeStore {
    pub fn new(inner: Arc<MemoryStore>, delay: StdDuration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl BasePasscodeStore for DelayedPasscodeStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn insert(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> std::result::Result<PasscodeRequest, StoreError> {
        self.inner.insert(email, code_hash, expires_at).await
    }

    async fn find_latest_active(
        &self,
        email: &str,
    ) -> std::result::Result<Option<PasscodeRequest>, StoreError> {
        let row = self.inner.find_latest_active(email).await;
        tokio::time::sleep(self.delay).await;
        row
    }

    async fn mark_consumed(&self, id: PasscodeId) -> std::result::Result<bool, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.mark_consumed(id).await
    }

    async fn reserve_attempt(
        &self,
        id: PasscodeId,
        max_attempts: i32,
    ) -> std::result::Result<Option<i32>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.reserve_attempt(id, max_attempts).await
    }
}

// =============================================================================
// TestDeps
// =============================================================================

/// ServerDeps on a MemoryStore, a MockClock and a recording e-mail channel
pub struct TestDeps {
    pub deps: ServerDeps,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<MockClock>,
    pub inbox: PasscodeInbox,
}

impl TestDeps {
    pub fn new() -> Self {
        Self::with_policy(AuthPolicy::default())
    }

    pub fn with_policy(policy: AuthPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(MockClock::new(Utc::now()));
        let (email, inbox) = RecordingNotifier::new(Channel::Email);
        let dispatcher = NotificationDispatcher::new(StdDuration::from_secs(1))
            .with_notifier(Arc::new(email));
        let jwt_service = JwtService::new(
            TEST_JWT_SECRET.as_bytes(),
            TEST_JWT_ISSUER.to_string(),
            Duration::days(7),
        );

        let deps = ServerDeps::new(
            store.clone(),
            store.clone(),
            Arc::new(dispatcher),
            Arc::new(jwt_service),
            clock.clone(),
            policy,
        );

        Self {
            deps,
            store,
            clock,
            inbox,
        }
    }

    /// Like `with_policy`, with passcode store calls going through a
    /// `DelayedPasscodeStore`. `store` still reads the same tables directly.
    pub fn with_delayed_passcodes(policy: AuthPolicy, delay: StdDuration) -> Self {
        let mut t = Self::with_policy(policy);
        t.deps.passcodes = Arc::new(DelayedPasscodeStore::new(t.store.clone(), delay));
        t
    }
}

impl Default for TestDeps {
    fn default() -> Self {
        Self::new()
    }
}
