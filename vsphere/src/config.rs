/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::soap::CertType;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub host_alias: Option<(HostAlias, Option<String>)>,
    pub certificate: Option<(CertType, PathBuf)>,
    pub credentials: Option<Credentials>,
    pub disable_certificate_verification: Option<bool>,
    pub disable_hostname_verification: Option<bool>,
    /// Sent as `SOAPAction: urn:vim25/<version>`.
    pub api_version: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout: Option<u64>,
    /// Session idle timeout in minutes.
    pub session_timeout: Option<u64>,
    /// Page size for property retrieval.
    pub retrieve_max_objects: Option<u32>,
    #[serde(default)]
    pub task: TaskOptions,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum HostAlias {
    Domain,
    Ip,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(default)]
pub struct TaskOptions {
    /// Upper bound for a single `WaitForUpdatesEx` call.
    pub max_wait_seconds: u32,
    /// Consecutive waits without update before giving up. Also bounds
    /// the retries of a failing wait call.
    pub max_wait_attempts: u32,
    /// Pause between processing an update and the next wait.
    pub poll_interval_ms: u64,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            max_wait_seconds: 3,
            max_wait_attempts: 30,
            poll_interval_ms: 1000,
        }
    }
}

impl TaskOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            port: None,
            host_alias: None,
            certificate: None,
            credentials: None,
            disable_certificate_verification: None,
            disable_hostname_verification: None,
            api_version: None,
            request_timeout: None,
            session_timeout: None,
            retrieve_max_objects: None,
            task: TaskOptions::default(),
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn get_hostname(&self) -> Result<String> {
        match &self.host_alias {
            Some((HostAlias::Domain, Some(domain))) => {
                Ok(format!("{}.{}", self.host, domain))
            }
            Some((HostAlias::Ip, Some(ip))) => Ok(ip.clone()),
            Some((HostAlias::Ip, None)) => {
                Ok(ip_lookup_one(&self.host, self.port()).await?.to_string())
            }
            _ => Ok(self.host.clone()),
        }
    }

    pub async fn endpoint(&self) -> Result<String> {
        let hostname = self.get_hostname().await?;
        Ok(format!("https://{}:{}/sdk", hostname, self.port()))
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(443)
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or("5.0")
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }

    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_timeout.unwrap_or(30) as i64)
    }
}

async fn ip_lookup_one(host: &str, port: u16) -> Result<IpAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .map(|addr| addr.ip())
        .next()
        .ok_or_else(|| Error::NoIpFound(host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: Config = serde_json::from_str(
            r#"{"host": "vcenter", "credentials": {"username": "root"}}"#,
        )
        .unwrap();
        assert_eq!(config.port(), 443);
        assert_eq!(config.api_version(), "5.0");
        assert_eq!(config.session_timeout(), chrono::Duration::minutes(30));
        assert_eq!(config.task, TaskOptions::default());
        assert_eq!(config.task.max_wait_attempts, 30);
        assert!(config.credentials.unwrap().password.is_none());
    }

    #[tokio::test]
    async fn host_alias() {
        let mut config = Config::new("vcenter");
        config.port = Some(8443);
        config.host_alias =
            Some((HostAlias::Domain, Some(String::from("lab.local"))));
        assert_eq!(
            config.endpoint().await.unwrap(),
            "https://vcenter.lab.local:8443/sdk"
        );
        config.host_alias =
            Some((HostAlias::Ip, Some(String::from("10.0.0.5"))));
        assert_eq!(config.get_hostname().await.unwrap(), "10.0.0.5");
    }
}
