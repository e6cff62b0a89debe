//! Connection parameters and DSN parsing (§4.F/§4.G, §6 Connection-spec API).

mod dsn;

pub use dsn::IntoConnectParams;

use std::time::Duration;

use secstr::SecUtf8;

use crate::conn::retry::RetryPolicy;
use crate::error::{QError, QResult};

/// How a connection should be wrapped, if at all. Only passthrough is
/// supported — the caller supplies an already-configured `rustls`
/// client config; this crate manages no TLS policy of its own (Non-goal).
#[derive(Clone, Default)]
pub enum Tls {
    /// Plain TCP.
    #[default]
    Off,
    /// TLS using a caller-supplied client configuration.
    On(std::sync::Arc<rustls::ClientConfig>),
}

impl std::fmt::Debug for Tls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tls::Off => f.write_str("Tls::Off"),
            Tls::On(_) => f.write_str("Tls::On(..)"),
        }
    }
}

/// Everything needed to open a connection (§6 Connection-spec API).
#[derive(Clone, Debug)]
pub struct ConnectParams {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecUtf8>,
    timeout: Option<Duration>,
    tls: Tls,
    retry_policy: Option<RetryPolicy>,
}

impl ConnectParams {
    #[must_use]
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::default()
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn password(&self) -> Option<&SecUtf8> {
        self.password.as_ref()
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn is_tls(&self) -> bool {
        matches!(self.tls, Tls::On(_))
    }

    #[must_use]
    pub fn tls(&self) -> &Tls {
        &self.tls
    }

    #[must_use]
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}

impl std::fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = if self.is_tls() { "kdb+tls" } else { "kdb" };
        write!(f, "{scheme}://")?;
        if let Some(user) = &self.username {
            write!(f, "{user}@")?;
        }
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Builder for [`ConnectParams`], mirroring the teacher's builder shape.
#[derive(Clone, Debug, Default)]
pub struct ConnectParamsBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<SecUtf8>,
    timeout: Option<Duration>,
    tls: Tls,
    retry_policy: Option<RetryPolicy>,
}

impl ConnectParamsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hostname(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecUtf8::from(password.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn tls(mut self, tls: Tls) -> Self {
        self.tls = tls;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// # Errors
    /// `QError::ConnParams` if host or port is missing.
    pub fn build(self) -> QResult<ConnectParams> {
        let host = self
            .host
            .ok_or_else(|| QError::ConnParams("missing host".into()))?;
        let port = self
            .port
            .ok_or_else(|| QError::ConnParams("missing port".into()))?;
        Ok(ConnectParams {
            host,
            port,
            username: self.username,
            password: self.password,
            timeout: self.timeout,
            tls: self.tls,
            retry_policy: self.retry_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_host_and_port() {
        assert!(ConnectParamsBuilder::new().build().is_err());
        assert!(ConnectParamsBuilder::new().hostname("h").build().is_err());
        assert!(ConnectParamsBuilder::new()
            .hostname("h")
            .port(5000)
            .build()
            .is_ok());
    }

    #[test]
    fn displays_as_dsn_without_password() {
        let p = ConnectParamsBuilder::new()
            .hostname("myhost")
            .port(5001)
            .credentials("alice", "secret")
            .build()
            .unwrap();
        assert_eq!(p.to_string(), "kdb://alice@myhost:5001");
    }
}
