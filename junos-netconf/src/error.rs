use crate::reply::RpcError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`Session`](crate::session::Session) operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to establish NETCONF session: {0}")]
    Connection(#[source] TransportError),
    #[error("NETCONF transport failure: {0}")]
    Transport(#[source] TransportError),
    /// The device answered with `<rpc-error>`; only the first one is kept.
    #[error("{0}")]
    Device(RpcError),
    #[error(transparent)]
    Decode(#[from] quick_xml::DeError),
    #[error("session is not connected")]
    NotConnected,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "ssh")]
    #[error(transparent)]
    Ssh(#[from] async_ssh2_lite::Error),
    #[error("invalid hello message: {0}")]
    Hello(#[from] quick_xml::DeError),
    #[error(
        "malformed message chunk (expected {:?}, actual {:?})",
        expected,
        actual
    )]
    MalformedChunk { expected: char, actual: char },
    #[error("ssh session is not authenticated")]
    NotAuthenticated,
    #[error("invalid device address '{0}'")]
    InvalidAddress(String),
}
