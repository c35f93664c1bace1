use std::net::Ipv4Addr;
use std::time::Duration;

use hpi_wire::frame::MAX_PAYLOAD_LENGTH;

use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::error::{Error, ErrorKind, Result};

/// Default server port.
pub const DEFAULT_PORT: u16 = 4743;

/// Environment variable overriding the default server port.
pub const PORT_VARIABLE: &str = "HPI_DAEMON_PORT";

// Half an hour, in seconds.
const DEFAULT_READ_TIMEOUT: u64 = 1800;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Keyword {
    Unbounded,
}

// Either the `unbounded` keyword or a positive number.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Limit {
    Keyword(Keyword),
    Value(u64),
}

/// Maximum number of connections served at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Limit", into = "Limit")]
pub enum Workers {
    /// No limit.
    #[default]
    Unbounded,
    /// At most this many connections.
    Bounded(usize),
}

impl TryFrom<Limit> for Workers {
    type Error = String;

    fn try_from(limit: Limit) -> std::result::Result<Self, Self::Error> {
        match limit {
            Limit::Keyword(Keyword::Unbounded) => Ok(Self::Unbounded),
            Limit::Value(0) => Err("The number of workers must be positive".into()),
            Limit::Value(workers) => usize::try_from(workers)
                .map(Self::Bounded)
                .map_err(|e| e.to_string()),
        }
    }
}

impl From<Workers> for Limit {
    fn from(workers: Workers) -> Self {
        match workers {
            Workers::Unbounded => Self::Keyword(Keyword::Unbounded),
            Workers::Bounded(workers) => Self::Value(workers as u64),
        }
    }
}

/// How long a connection may stay idle while waiting for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Limit", into = "Limit")]
pub enum ReadTimeout {
    /// Connections may stay idle forever.
    Unbounded,
    /// Connections are closed after being idle for this long.
    After(Duration),
}

impl ReadTimeout {
    /// Returns the timeout duration, if any.
    #[must_use]
    pub const fn duration(self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::After(duration) => Some(duration),
        }
    }
}

impl Default for ReadTimeout {
    fn default() -> Self {
        Self::After(Duration::from_secs(DEFAULT_READ_TIMEOUT))
    }
}

impl TryFrom<Limit> for ReadTimeout {
    type Error = String;

    fn try_from(limit: Limit) -> std::result::Result<Self, Self::Error> {
        match limit {
            Limit::Keyword(Keyword::Unbounded) => Ok(Self::Unbounded),
            Limit::Value(0) => Err("The read timeout must be positive".into()),
            Limit::Value(seconds) => Ok(Self::After(Duration::from_secs(seconds))),
        }
    }
}

impl From<ReadTimeout> for Limit {
    fn from(timeout: ReadTimeout) -> Self {
        match timeout {
            ReadTimeout::Unbounded => Self::Keyword(Keyword::Unbounded),
            ReadTimeout::After(duration) => Self::Value(duration.as_secs()),
        }
    }
}

/// Server configuration.
///
/// Missing fields take their default value, and the default port can be
/// overridden through the [`PORT_VARIABLE`] environment variable.
///
/// ```
/// use hpi_daemon::config::{Config, Workers};
///
/// let config = Config::from_json(r#"{ "max_workers": 8, "read_timeout": "unbounded" }"#)
///     .unwrap();
/// assert_eq!(config.max_workers, Workers::Bounded(8));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listening address.
    pub address: Ipv4Addr,
    /// Listening port.
    pub port: u16,
    /// Maximum number of connections served at the same time.
    pub max_workers: Workers,
    /// Per-connection read timeout.
    pub read_timeout: ReadTimeout,
    /// Maximum frame payload size.
    pub max_payload: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::UNSPECIFIED,
            port: default_port(),
            max_workers: Workers::default(),
            read_timeout: ReadTimeout::default(),
            max_payload: MAX_PAYLOAD_LENGTH,
        }
    }
}

impl Config {
    /// Parses and validates a `json` configuration.
    ///
    /// # Errors
    ///
    /// Fails when the input is not a valid configuration.
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Fails on zero workers or a zero payload maximum.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == Workers::Bounded(0) {
            return Err(Error::new(
                ErrorKind::Configuration,
                "The number of workers must be positive",
            ));
        }
        if self.max_payload == 0 {
            return Err(Error::new(
                ErrorKind::Configuration,
                "The payload maximum must be positive",
            ));
        }
        if self.max_payload > MAX_PAYLOAD_LENGTH {
            warn!(
                "Payload maximum {} clamped to {MAX_PAYLOAD_LENGTH}",
                self.max_payload
            );
        }
        Ok(())
    }

    /// Returns the payload maximum, clamped to the protocol maximum.
    #[must_use]
    pub fn payload_limit(&self) -> usize {
        self.max_payload.min(MAX_PAYLOAD_LENGTH)
    }
}

fn default_port() -> u16 {
    let Ok(port) = std::env::var(PORT_VARIABLE) else {
        return DEFAULT_PORT;
    };
    port.parse().unwrap_or_else(|_| {
        warn!("Ignoring {PORT_VARIABLE}: `{port}` is not a valid port");
        DEFAULT_PORT
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hpi_wire::frame::MAX_PAYLOAD_LENGTH;

    use serde_json::json;

    use crate::error::ErrorKind;

    use super::{Config, ReadTimeout, Workers};

    #[test]
    fn defaults() {
        let config = Config::from_json("{}").unwrap();

        assert_eq!(config.max_workers, Workers::Unbounded);
        assert_eq!(
            config.read_timeout,
            ReadTimeout::After(Duration::from_secs(1800))
        );
        assert_eq!(config.max_payload, MAX_PAYLOAD_LENGTH);
        assert!(config.address.is_unspecified());
    }

    #[test]
    fn limits() {
        let config = Config::from_json(
            &json!({
                "port": 5000,
                "max_workers": "unbounded",
                "read_timeout": 30,
                "max_payload": 1_000_000,
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.read_timeout.duration(), Some(Duration::from_secs(30)));
        assert_eq!(config.payload_limit(), MAX_PAYLOAD_LENGTH);

        let config = Config::from_json(r#"{ "read_timeout": "unbounded" }"#).unwrap();
        assert_eq!(config.read_timeout.duration(), None);
    }

    #[test]
    fn invalid() {
        for input in [
            r#"{ "max_workers": 0 }"#,
            r#"{ "max_workers": "all" }"#,
            r#"{ "read_timeout": 0 }"#,
            r#"{ "read_timeout": -3 }"#,
        ] {
            assert_eq!(
                Config::from_json(input).unwrap_err().kind(),
                ErrorKind::Serialization
            );
        }

        assert_eq!(
            Config::from_json(r#"{ "max_payload": 0 }"#)
                .unwrap_err()
                .kind(),
            ErrorKind::Configuration
        );

        let config = Config {
            max_workers: Workers::Bounded(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn serialize() {
        let config = Config {
            max_workers: Workers::Bounded(4),
            read_timeout: ReadTimeout::Unbounded,
            ..Config::default()
        };
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["max_workers"], json!(4));
        assert_eq!(value["read_timeout"], json!("unbounded"));
        assert_eq!(serde_json::from_value::<Config>(value).unwrap(), config);
    }
}
