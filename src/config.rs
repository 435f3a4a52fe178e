//! Connection file loading.
//!
//! A front-end hands the kernel a JSON connection file naming the three
//! endpoint ports, the bind address, and the shared signing key:
//!
//! ```json
//! {
//!   "ip": "127.0.0.1",
//!   "shell_port": 53001,
//!   "iopub_port": 53002,
//!   "hb_port": 53003,
//!   "key": "a0436f6c-1916-498b-8eb9-e81ab9368e84"
//! }
//! ```
//!
//! Port and key negotiation is out of scope; the file is read once at
//! startup.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::transport::{ChannelSet, TcpChannel};

fn default_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_username() -> String {
    "kernel".to_string()
}

/// Parsed connection file.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionInfo {
    /// Bind address shared by all three endpoints.
    #[serde(default = "default_ip")]
    pub ip: String,
    /// Routed request/reply endpoint port.
    pub shell_port: u16,
    /// Broadcast endpoint port.
    pub iopub_port: u16,
    /// Heartbeat endpoint port.
    pub hb_port: u16,
    /// Shared signing key; empty disables signing.
    #[serde(default)]
    pub key: String,
    /// User name stamped into minted headers.
    #[serde(default = "default_username")]
    pub username: String,
}

impl ConnectionInfo {
    /// Load and parse a connection file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// host:port of the routed request/reply endpoint.
    pub fn shell_addr(&self) -> String {
        format!("{}:{}", self.ip, self.shell_port)
    }

    /// host:port of the broadcast endpoint.
    pub fn iopub_addr(&self) -> String {
        format!("{}:{}", self.ip, self.iopub_port)
    }

    /// host:port of the heartbeat endpoint.
    pub fn hb_addr(&self) -> String {
        format!("{}:{}", self.ip, self.hb_port)
    }

    /// Bind all three endpoints and wait for a front-end on each.
    ///
    /// Accepts in a fixed order: shell, then iopub, then heartbeat. A
    /// connecting front-end must open its sockets in the same order.
    pub async fn bind(&self) -> Result<ChannelSet<TcpChannel, TcpChannel, TcpChannel>> {
        Ok(ChannelSet {
            shell: TcpChannel::bind(&self.shell_addr()).await?,
            iopub: TcpChannel::bind(&self.iopub_addr()).await?,
            heartbeat: TcpChannel::bind(&self.hb_addr()).await?,
        })
    }
}
