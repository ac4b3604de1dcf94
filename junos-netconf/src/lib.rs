//! # junos-netconf
//!
//! ```toml
//! junos-netconf = "^0.1.0"
//! ```
//!
//! NETCONF client for Junos devices: candidate configuration locking,
//! rollback and rescue configurations, and operational mode commands.
//!
//! ## Example
//!
//! ```rust,no_run
//! use junos_netconf::{OutputFormat, Session};
//!
//! #[tokio::main]
//! async fn main() -> junos_netconf::Result<()> {
//!     let mut session = Session::connect("192.0.2.1", "admin", "secret").await?;
//!     session.lock().await?;
//!     println!("{}", session.rollback_diff(1).await?);
//!     println!("{}", session.command("show version", OutputFormat::Text).await?);
//!     session.unlock().await?;
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
pub mod error;
#[cfg(feature = "ssh")]
mod framer;
pub mod hello;
pub mod reply;
pub mod rpc;
pub mod session;
pub mod transport;

pub use error::{Error, Result, TransportError};
pub use reply::{Reply, RpcError};
pub use rpc::{OutputFormat, RpcCommand, RpcTemplates};
pub use session::{Session, NO_OUTPUT, NO_RESCUE_CONFIGURATION};
pub use transport::Transport;

pub const NETCONF_URN: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
pub const NETCONF_BASE_10_CAP: &str = "urn:ietf:params:netconf:base:1.0";
pub const NETCONF_BASE_11_CAP: &str = "urn:ietf:params:netconf:base:1.1";
pub const NETCONF_SSH_PORT: u16 = 830;
