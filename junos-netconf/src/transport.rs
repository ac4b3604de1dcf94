use crate::error::TransportError;
use async_trait::async_trait;

#[cfg(feature = "ssh")]
pub mod ssh;

/// Channel able to carry one NETCONF request/reply exchange at a time.
#[async_trait]
pub trait Transport: Send {
    /// Sends a complete `<rpc>` document and returns the raw `<rpc-reply>`.
    async fn execute(&mut self, rpc: &str) -> Result<String, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;

    /// Session id announced by the server hello, when known.
    fn session_id(&self) -> Option<u64> {
        None
    }
}
