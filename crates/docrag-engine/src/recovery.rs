use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use docrag_core::config::RecoverySettings;
use docrag_core::types::OperatingMode;

use crate::engine::RagEngine;

/// Exponential backoff between re-initialisation attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RecoveryPolicy {
    /// `None` unless recovery is enabled.
    pub fn from_settings(settings: &RecoverySettings) -> Option<Self> {
        settings.enabled.then(|| Self {
            initial_backoff: Duration::from_secs(settings.initial_backoff_secs),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
        })
    }

    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_backoff)
    }
}

/// Retry `reinitialize` in the background until the engine is FULL.
/// Returns immediately (the task ends at once) when it already is.
pub fn spawn_recovery(engine: Arc<RagEngine>, policy: RecoveryPolicy) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = policy.initial_backoff;
        let mut attempt = 0u32;
        while engine.mode().await == OperatingMode::Degraded {
            tokio::time::sleep(backoff).await;
            attempt += 1;
            match engine.reinitialize().await {
                OperatingMode::Full => {
                    tracing::info!(attempt, "recovery succeeded");
                    break;
                }
                OperatingMode::Degraded => {
                    backoff = policy.next_backoff(backoff);
                    tracing::warn!(attempt, next_retry = ?backoff, "recovery attempt failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_follows_recovery_settings() {
        assert_eq!(RecoveryPolicy::from_settings(&RecoverySettings::default()), None);

        let settings =
            RecoverySettings { enabled: true, initial_backoff_secs: 2, max_backoff_secs: 10 };
        let policy = RecoveryPolicy::from_settings(&settings).unwrap();
        assert_eq!(policy.initial_backoff, Duration::from_secs(2));
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = RecoveryPolicy {
            initial_backoff: Duration::from_secs(3),
            max_backoff: Duration::from_secs(10),
        };
        let second = policy.next_backoff(policy.initial_backoff);
        assert_eq!(second, Duration::from_secs(6));
        assert_eq!(policy.next_backoff(second), Duration::from_secs(10));
        assert_eq!(policy.next_backoff(Duration::from_secs(10)), Duration::from_secs(10));
    }
}
