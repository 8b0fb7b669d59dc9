//! Post-commit side channels: cache invalidation and notifications.
//!
//! Both channels are fire-and-forget. The manager invokes them after a
//! successful commit, logs delivery failures at warn level, and never
//! lets them affect the outcome of the ledger operation.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use quadra_shared::types::PropertyId;

use crate::workflow::types::Role;

/// Delivery failure on a side channel.
#[derive(Debug, Error)]
#[error("signal delivery failed: {0}")]
pub struct SignalError(pub String);

/// Urgency of a ledger notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPriority {
    /// Informational.
    Low,
    /// Default priority for lifecycle events.
    Normal,
    /// Needs prompt attention (e.g. cancellations).
    High,
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Invalidates cached read models after a ledger write.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Drops all cached entries matching the pattern.
    async fn invalidate(&self, pattern: &str) -> Result<(), SignalError>;
}

/// Delivers ledger event notifications to property staff.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a message to users holding any of `target_roles` on the
    /// property.
    async fn notify(
        &self,
        property_id: PropertyId,
        message: &str,
        priority: NotificationPriority,
        target_roles: &[Role],
    ) -> Result<(), SignalError>;
}

/// Cache invalidator that does nothing.
#[derive(Debug, Default)]
pub struct NoopCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoopCacheInvalidator {
    async fn invalidate(&self, _pattern: &str) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Notifier that does nothing.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(
        &self,
        _property_id: PropertyId,
        _message: &str,
        _priority: NotificationPriority,
        _target_roles: &[Role],
    ) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Records every signal it receives. Test double.
#[derive(Debug, Default)]
pub struct RecordingSignals {
    invalidations: Mutex<Vec<String>>,
    notifications: Mutex<Vec<(PropertyId, String, NotificationPriority)>>,
}

impl RecordingSignals {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the invalidation patterns received so far.
    pub fn invalidations(&self) -> Vec<String> {
        match self.invalidations.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the notifications received so far.
    pub fn notifications(&self) -> Vec<(PropertyId, String, NotificationPriority)> {
        match self.notifications.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl CacheInvalidator for RecordingSignals {
    async fn invalidate(&self, pattern: &str) -> Result<(), SignalError> {
        if let Ok(mut guard) = self.invalidations.lock() {
            guard.push(pattern.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingSignals {
    async fn notify(
        &self,
        property_id: PropertyId,
        message: &str,
        priority: NotificationPriority,
        _target_roles: &[Role],
    ) -> Result<(), SignalError> {
        if let Ok(mut guard) = self.notifications.lock() {
            guard.push((property_id, message.to_string(), priority));
        }
        Ok(())
    }
}

/// Signal sink that always fails. Test double for the fire-and-forget
/// contract.
#[derive(Debug, Default)]
pub struct FailingSignals;

#[async_trait]
impl CacheInvalidator for FailingSignals {
    async fn invalidate(&self, pattern: &str) -> Result<(), SignalError> {
        Err(SignalError(format!("cache unreachable for {pattern}")))
    }
}

#[async_trait]
impl Notifier for FailingSignals {
    async fn notify(
        &self,
        _property_id: PropertyId,
        _message: &str,
        _priority: NotificationPriority,
        _target_roles: &[Role],
    ) -> Result<(), SignalError> {
        Err(SignalError("notification channel down".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_signals_capture_order() {
        let signals = RecordingSignals::new();
        let property = PropertyId::new();

        signals.invalidate("ledger:a").await.unwrap();
        signals.invalidate("ledger:b").await.unwrap();
        signals
            .notify(
                property,
                "Transaction approved",
                NotificationPriority::Normal,
                &[Role::Manager],
            )
            .await
            .unwrap();

        assert_eq!(signals.invalidations(), vec!["ledger:a", "ledger:b"]);
        let notifications = signals.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].0, property);
        assert_eq!(notifications[0].2, NotificationPriority::Normal);
    }

    #[tokio::test]
    async fn test_failing_signals_report_errors() {
        let signals = FailingSignals;
        assert!(signals.invalidate("ledger:x").await.is_err());
        assert!(signals
            .notify(
                PropertyId::new(),
                "msg",
                NotificationPriority::High,
                &[Role::Admin],
            )
            .await
            .is_err());
    }
}
