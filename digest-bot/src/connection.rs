use crate::types::MessageChannel;
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    NotStarted,
    ConnectionLost,
    Timeout,
    RestartRequired,
    LoggedOut,
    Replaced,
}

impl DisconnectReason {
    pub fn is_reconnectable(&self) -> bool {
        matches!(self, Self::ConnectionLost | Self::Timeout | Self::RestartRequired)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not started",
            Self::ConnectionLost => "connection lost",
            Self::Timeout => "timed out",
            Self::RestartRequired => "restart required",
            Self::LoggedOut => "logged out",
            Self::Replaced => "replaced by another session",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingPairing { code: String },
    Connected,
    Disconnected { reason: DisconnectReason },
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingPairing { .. } => f.write_str("awaiting pairing"),
            Self::Connected => f.write_str("connected"),
            Self::Disconnected { reason } => write!(f, "disconnected ({})", reason),
        }
    }
}

/// Point-in-time copy of the connection state for observers.
#[derive(Debug, Clone)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    pub since: DateTime<Utc>,
    pub reconnect_attempts: u32,
}

impl ConnectionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectDecision {
    RetryAfter(Duration),
    GiveUp,
}

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl ReconnectPolicy {
    /// A fresh, unjittered exponential schedule with no overall deadline;
    /// `max_attempts` is the only stop condition.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }
}

struct ConnectionInner {
    state: ConnectionState,
    since: DateTime<Utc>,
    attempts: u32,
    backoff: ExponentialBackoff,
}

/// Owns the transport connection state and decides whether a drop is retried.
pub struct ConnectionManager {
    policy: ReconnectPolicy,
    inner: RwLock<ConnectionInner>,
}

impl ConnectionManager {
    pub fn new(policy: ReconnectPolicy) -> Self {
        let backoff = policy.backoff();
        Self {
            policy,
            inner: RwLock::new(ConnectionInner {
                state: ConnectionState::Disconnected {
                    reason: DisconnectReason::NotStarted,
                },
                since: Utc::now(),
                attempts: 0,
                backoff,
            }),
        }
    }

    pub async fn pairing_required(&self, code: impl Into<String>) {
        let code = code.into();
        info!("Channel awaiting pairing, code {}", code);
        self.transition(ConnectionState::AwaitingPairing { code }).await;
    }

    pub async fn connected(&self) {
        let mut inner = self.inner.write().await;
        inner.state = ConnectionState::Connected;
        inner.since = Utc::now();
        inner.attempts = 0;
        inner.backoff.reset();
        info!("Channel connected");
    }

    /// Record a drop and decide what to do about it.
    pub async fn disconnected(&self, reason: DisconnectReason) -> ReconnectDecision {
        let mut inner = self.inner.write().await;
        inner.state = ConnectionState::Disconnected { reason };
        inner.since = Utc::now();

        if !reason.is_reconnectable() {
            warn!("Channel disconnected ({}), not reconnecting", reason);
            return ReconnectDecision::GiveUp;
        }
        if inner.attempts >= self.policy.max_attempts {
            warn!(
                "Channel disconnected ({}), giving up after {} attempts",
                reason, inner.attempts
            );
            return ReconnectDecision::GiveUp;
        }

        inner.attempts += 1;
        match inner.backoff.next_backoff() {
            Some(delay) => {
                info!(
                    "Channel disconnected ({}), reconnect attempt {}/{} in {:?}",
                    reason, inner.attempts, self.policy.max_attempts, delay
                );
                ReconnectDecision::RetryAfter(delay)
            }
            None => ReconnectDecision::GiveUp,
        }
    }

    pub async fn snapshot(&self) -> ConnectionSnapshot {
        let inner = self.inner.read().await;
        ConnectionSnapshot {
            state: inner.state.clone(),
            since: inner.since,
            reconnect_attempts: inner.attempts,
        }
    }

    async fn transition(&self, state: ConnectionState) {
        let mut inner = self.inner.write().await;
        inner.state = state;
        inner.since = Utc::now();
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

/// Connect the channel, retrying per the manager's policy. Returns the last
/// connect error once the policy gives up.
pub async fn maintain_connection(
    channel: Arc<dyn MessageChannel>,
    manager: Arc<ConnectionManager>,
) -> anyhow::Result<()> {
    loop {
        match channel.connect().await {
            Ok(()) => {
                manager.connected().await;
                return Ok(());
            }
            Err(e) => {
                warn!("Connecting {} failed: {:#}", channel.channel_name(), e);
                match manager.disconnected(DisconnectReason::ConnectionLost).await {
                    ReconnectDecision::RetryAfter(delay) => tokio::time::sleep(delay).await,
                    ReconnectDecision::GiveUp => return Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(1000),
            multiplier: 2.0,
        }
    }

    fn roughly(delay: Duration, millis: u64) -> bool {
        let expected = Duration::from_millis(millis);
        delay >= expected && delay < expected + Duration::from_millis(1)
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let manager = ConnectionManager::default();
        let snapshot = manager.snapshot().await;
        assert_eq!(
            snapshot.state,
            ConnectionState::Disconnected {
                reason: DisconnectReason::NotStarted
            }
        );
        assert!(!snapshot.is_connected());
    }

    #[tokio::test]
    async fn terminal_reasons_never_reconnect() {
        let manager = ConnectionManager::new(quick_policy(5));
        assert_eq!(manager.disconnected(DisconnectReason::LoggedOut).await, ReconnectDecision::GiveUp);
        assert_eq!(manager.disconnected(DisconnectReason::Replaced).await, ReconnectDecision::GiveUp);
        assert_eq!(manager.snapshot().await.reconnect_attempts, 0);
    }

    #[tokio::test]
    async fn reconnect_delays_grow_until_attempts_run_out() {
        let manager = ConnectionManager::new(quick_policy(3));
        let mut delays = Vec::new();
        for reason in [
            DisconnectReason::ConnectionLost,
            DisconnectReason::Timeout,
            DisconnectReason::RestartRequired,
        ] {
            match manager.disconnected(reason).await {
                ReconnectDecision::RetryAfter(delay) => delays.push(delay),
                ReconnectDecision::GiveUp => panic!("gave up early"),
            }
        }
        assert!(roughly(delays[0], 100));
        assert!(roughly(delays[1], 200));
        assert!(roughly(delays[2], 400));
        assert_eq!(
            manager.disconnected(DisconnectReason::ConnectionLost).await,
            ReconnectDecision::GiveUp
        );
    }

    #[tokio::test]
    async fn connecting_resets_the_schedule() {
        let manager = ConnectionManager::new(quick_policy(3));
        manager.disconnected(DisconnectReason::Timeout).await;
        manager.disconnected(DisconnectReason::Timeout).await;
        manager.connected().await;

        let snapshot = manager.snapshot().await;
        assert!(snapshot.is_connected());
        assert_eq!(snapshot.reconnect_attempts, 0);

        match manager.disconnected(DisconnectReason::Timeout).await {
            ReconnectDecision::RetryAfter(delay) => assert!(roughly(delay, 100)),
            ReconnectDecision::GiveUp => panic!("expected a retry"),
        }
    }

    #[tokio::test]
    async fn pairing_code_is_visible_to_observers() {
        let manager = ConnectionManager::default();
        manager.pairing_required("ABCD-1234").await;
        assert_eq!(
            manager.snapshot().await.state,
            ConnectionState::AwaitingPairing {
                code: "ABCD-1234".to_string()
            }
        );
    }
}
