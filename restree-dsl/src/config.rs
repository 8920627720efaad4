use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConstructionError;

/**
Backend settings a [crate::ClientFactory] hands to the client it creates.
Not every backend honours every knob; unsupported settings are ignored.

Serialized with durations as milliseconds, e.g.
```json
{ "connectTimeout": 2000, "maxRequestRetry": 1 }
```
Missing fields take their default value.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub request_charset: String,
    pub response_charset: String,
    pub max_request_retry: u32,
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    #[serde(with = "millis")]
    pub read_timeout: Duration,
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    #[serde(with = "millis")]
    pub pooled_connection_idle_timeout: Duration,
    /// -1 means unlimited
    pub max_connections: i32,
    /// -1 means unlimited
    pub max_connections_per_host: i32,
    pub follow_redirect: bool,
    pub user_agent: Option<String>,
    pub accept_any_certificate: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            request_charset: "UTF-8".to_string(),
            response_charset: "UTF-8".to_string(),
            max_request_retry: 5,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(60),
            pooled_connection_idle_timeout: Duration::from_secs(60),
            max_connections: -1,
            max_connections_per_host: -1,
            follow_redirect: true,
            user_agent: None,
            accept_any_certificate: false,
        }
    }
}

impl ClientConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConstructionError> {
        let config: ClientConfig = serde_json::from_str(s)
            .map_err(|e| ConstructionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConstructionError> {
        let timeouts = [
            ("connectTimeout", self.connect_timeout),
            ("readTimeout", self.read_timeout),
            ("requestTimeout", self.request_timeout),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, t)| t.is_zero()) {
            return Err(ConstructionError::InvalidConfig(format!(
                "{name} must be greater than zero"
            )));
        }
        if self.max_connections < -1 || self.max_connections_per_host < -1 {
            return Err(ConstructionError::InvalidConfig(
                "connection limits must be -1 (unlimited) or a non-negative number".to_string(),
            ));
        }
        if self.request_charset.is_empty() || self.response_charset.is_empty() {
            return Err(ConstructionError::InvalidConfig(
                "charsets must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `max_connections_per_host` as a pool size, `None` if unlimited
    pub fn pool_limit_per_host(&self) -> Option<usize> {
        usize::try_from(self.max_connections_per_host).ok()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
