use std::time::Duration;
use tenure_core::{Result, TenureError};

/// Timing configuration for a candidate's participation in an election.
///
/// The three durations must satisfy
/// `retry_period < renew_deadline < lease_duration`: renewal needs multiple
/// chances before the lease expires, and re-observation must be faster than
/// the renew deadline.
#[derive(Debug, Clone)]
pub struct ElectionConfig {
    /// How long a renewal keeps the lease valid for the holder.
    pub lease_duration: Duration,

    /// How long a leading elector tolerates failed renewals before it
    /// gives up leadership.
    pub renew_deadline: Duration,

    /// How often the elector re-observes the record and retries
    /// acquisition or renewal.
    pub retry_period: Duration,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            lease_duration: Duration::from_secs(15),
            renew_deadline: Duration::from_secs(10),
            retry_period: Duration::from_secs(2),
        }
    }
}

impl ElectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lease_duration(mut self, lease_duration: Duration) -> Self {
        self.lease_duration = lease_duration;
        self
    }

    pub fn with_renew_deadline(mut self, renew_deadline: Duration) -> Self {
        self.renew_deadline = renew_deadline;
        self
    }

    pub fn with_retry_period(mut self, retry_period: Duration) -> Self {
        self.retry_period = retry_period;
        self
    }

    /// Checks the ordering invariants between the three durations.
    pub fn validate(&self) -> Result<()> {
        if self.renew_deadline >= self.lease_duration {
            return Err(TenureError::invalid_config(format!(
                "renew_deadline ({:?}) must be shorter than lease_duration ({:?})",
                self.renew_deadline, self.lease_duration
            )));
        }
        if self.retry_period >= self.renew_deadline {
            return Err(TenureError::invalid_config(format!(
                "retry_period ({:?}) must be shorter than renew_deadline ({:?})",
                self.retry_period, self.renew_deadline
            )));
        }
        Ok(())
    }

    pub fn lease_duration_ms(&self) -> u64 {
        self.lease_duration.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ElectionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_renew_deadline_must_undercut_lease() {
        let config = ElectionConfig::default().with_renew_deadline(Duration::from_secs(15));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_period_must_undercut_renew_deadline() {
        let config = ElectionConfig::default()
            .with_renew_deadline(Duration::from_secs(10))
            .with_retry_period(Duration::from_secs(10));
        assert!(config.validate().is_err());
    }
}
