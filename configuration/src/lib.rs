use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub fn get_config<T: DeserializeOwned>(config_path: PathBuf) -> Result<T, config::ConfigError> {
    let f = config::File::from(config_path);
    let config = config::Config::builder().add_source(f).build()?;
    config.try_deserialize::<T>()
}

#[derive(Debug, Deserialize)]
pub struct ResponderConfiguration {
    pub server: ServerConfiguration,
    // 没有 upstream 时，查不到的名字直接回 NXDOMAIN
    pub upstream: Option<UpstreamConfiguration>,
    #[serde(default)]
    pub records: Vec<RecordConfiguration>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfiguration {
    ip_address: IpAddr,
    port: u16,
}

impl ServerConfiguration {
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.ip_address, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpstreamConfiguration {
    pub server_address: SocketAddr,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl UpstreamConfiguration {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    3
}

/// One static answer, e.g. `{ name = "mail.test.com", type = "MX", value = "10 mx.test.com" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfiguration {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub value: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    300
}
