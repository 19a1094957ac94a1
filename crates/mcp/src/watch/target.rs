//! Validated watch requests.

use std::time::Duration;

use crate::watch::duration::{MAX_TIMEOUT, parse_positive_duration};
use crate::watch::error::WatchError;

/// Identity of the workflow to observe plus an optional overall deadline.
///
/// Construction validates every field, so a `WatchTarget` in hand is always
/// safe to subscribe with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    name: String,
    namespace: String,
    timeout: Option<Duration>,
}

impl WatchTarget {
    /// Build a target from an already parsed timeout.
    pub fn new(name: &str, namespace: &str, timeout: Option<Duration>) -> Result<Self, WatchError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WatchError::validation("name", "workflow name is required"));
        }
        if timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(WatchError::validation("timeout", "timeout must be greater than zero"));
        }
        if timeout.is_some_and(|timeout| timeout > MAX_TIMEOUT) {
            return Err(WatchError::validation("timeout", "timeout exceeds the maximum supported duration"));
        }
        Ok(Self {
            name: name.to_string(),
            namespace: namespace.trim().to_string(),
            timeout,
        })
    }

    /// Build a target from tool input, where the timeout is a duration string such as `10m`.
    pub fn parse(name: &str, namespace: &str, timeout: Option<&str>) -> Result<Self, WatchError> {
        let timeout = timeout
            .map(|raw| {
                parse_positive_duration(raw).map_err(|error| WatchError::validation("timeout", format!("invalid timeout '{raw}': {error}")))
            })
            .transpose()?;
        Self::new(name, namespace, timeout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_name_and_namespace() {
        let target = WatchTarget::parse("  hello-x7k2p ", " argo ", Some("5m")).unwrap();
        assert_eq!(target.name(), "hello-x7k2p");
        assert_eq!(target.namespace(), "argo");
        assert_eq!(target.timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn rejects_blank_name() {
        let error = WatchTarget::parse(" \t", "argo", None).unwrap_err();
        assert!(matches!(error, WatchError::Validation { field: "name", .. }));
    }

    #[test]
    fn rejects_zero_negative_and_malformed_timeouts() {
        for raw in ["0s", "-1m", "eventually", "10"] {
            let error = WatchTarget::parse("hello", "argo", Some(raw)).unwrap_err();
            assert!(matches!(error, WatchError::Validation { field: "timeout", .. }), "{raw}");
        }
        assert!(WatchTarget::new("hello", "argo", Some(Duration::ZERO)).is_err());
    }

    #[test]
    fn rejects_timeouts_beyond_supported_range() {
        let error = WatchTarget::parse("hello", "argo", Some("5000000000000000h")).unwrap_err();
        assert!(matches!(error, WatchError::Validation { field: "timeout", .. }));
        let error = WatchTarget::new("hello", "argo", Some(Duration::MAX)).unwrap_err();
        assert!(matches!(error, WatchError::Validation { field: "timeout", .. }));
        assert!(WatchTarget::new("hello", "argo", Some(MAX_TIMEOUT)).is_ok());
    }
}
