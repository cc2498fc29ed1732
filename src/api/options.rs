use crate::router::RouterConfig;
use std::cmp;
use std::convert::TryFrom;
use tokio::time::Duration;

/// ProxyOptions tunes the proxy's deadlines. Unset fields fall back to defaults.
#[derive(Clone, Default)]
pub struct ProxyOptions {
    pub write_timeout: Option<Duration>,
    pub write_retry_backoff: Option<Duration>,
    pub write_max_attempts: Option<u32>,
    pub read_node_timeout: Option<Duration>,
    pub read_overall_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

pub(super) struct ProxyOptionsValidated {
    pub write_timeout: Duration,
    pub write_retry_backoff: Duration,
    pub write_max_attempts: u32,
    pub read_node_timeout: Duration,
    pub read_overall_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ProxyOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.write_timeout == Duration::from_secs(0) {
            return Err("Write timeout must be non-zero");
        }
        if self.write_retry_backoff >= self.write_timeout {
            return Err("Write retry backoff must be less than the write timeout");
        }
        if self.write_max_attempts == 0 {
            return Err("Write max attempts must be at least 1");
        }
        if self.read_node_timeout == Duration::from_secs(0) {
            return Err("Read node timeout must be non-zero");
        }
        if self.read_node_timeout > self.read_overall_timeout {
            return Err("Read node timeout must not exceed the overall read timeout");
        }
        if self.connect_timeout == Duration::from_secs(0) {
            return Err("Connect timeout must be non-zero");
        }

        Ok(())
    }

    pub(super) fn router_config(&self) -> RouterConfig {
        RouterConfig {
            write_timeout: self.write_timeout,
            write_retry_backoff: self.write_retry_backoff,
            write_max_attempts: self.write_max_attempts,
            read_node_timeout: self.read_node_timeout,
            read_overall_timeout: self.read_overall_timeout,
        }
    }
}

impl TryFrom<ProxyOptions> for ProxyOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ProxyOptions) -> Result<Self, Self::Error> {
        let write_timeout = options.write_timeout.unwrap_or(Duration::from_secs(2));
        let write_retry_backoff = options
            .write_retry_backoff
            .unwrap_or_else(|| default_write_retry_backoff(write_timeout));
        let write_max_attempts = options
            .write_max_attempts
            .unwrap_or_else(|| default_write_max_attempts(write_timeout, write_retry_backoff));

        let values = ProxyOptionsValidated {
            write_timeout,
            write_retry_backoff,
            write_max_attempts,
            read_node_timeout: options.read_node_timeout.unwrap_or(Duration::from_secs(5)),
            read_overall_timeout: options.read_overall_timeout.unwrap_or(Duration::from_secs(5)),
            connect_timeout: options.connect_timeout.unwrap_or(Duration::from_secs(1)),
        };

        values.validate()?;
        Ok(values)
    }
}

/// Short write timeouts get a proportionally shorter backoff, so the timeout alone is enough to
/// configure writes.
fn default_write_retry_backoff(write_timeout: Duration) -> Duration {
    cmp::min(Duration::from_millis(50), write_timeout / 4)
}

/// Enough attempts that backing off after every one of them outlasts the write timeout. Redirect
/// hops don't back off, so a cluster that keeps redirecting can still run out first.
fn default_write_max_attempts(write_timeout: Duration, write_retry_backoff: Duration) -> u32 {
    let backoff_nanos = write_retry_backoff.as_nanos().max(1);
    let backoffs = (write_timeout.as_nanos() + backoff_nanos - 1) / backoff_nanos;

    u32::try_from(backoffs + 1).unwrap_or(u32::MAX)
}
