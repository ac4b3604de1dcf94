use crate::error::TransportError;
use crate::framer::Framer;
use crate::hello::Hello;
use crate::transport::Transport;
use crate::{NETCONF_BASE_11_CAP, NETCONF_SSH_PORT};
use async_ssh2_lite::{ssh2, AsyncChannel, AsyncSession, SessionConfiguration};
use async_trait::async_trait;
use log::{debug, trace};
use quick_xml::de::from_str;
use tokio::net::TcpStream;

/// SSH session timeout, in milliseconds.
const SSH_TIMEOUT: u32 = 10_000;

/// NETCONF over the `netconf` SSH subsystem.
pub struct SshTransport {
    session: AsyncSession<TcpStream>,
    framer: Framer<AsyncChannel<TcpStream>>,
    session_id: Option<u64>,
}

impl SshTransport {
    /// Connects to `host` (`address[:port]`) and authenticates with a password.
    pub async fn dial(
        host: &str,
        user: &str,
        password: &str,
    ) -> Result<SshTransport, TransportError> {
        let (address, port) = parse_address(host)?;
        debug!(target: host, "Connecting to {}:{} as '{}'", address, port, user);
        let stream = TcpStream::connect((address.as_str(), port)).await?;
        let mut configuration = SessionConfiguration::new();
        configuration.set_timeout(SSH_TIMEOUT);
        let mut session = AsyncSession::new(stream, configuration)?;
        session.handshake().await?;

        session.userauth_password(user, password).await?;
        SshTransport::with_session(session).await
    }

    /// Opens the `netconf` subsystem on an already authenticated session.
    pub async fn with_session(
        session: AsyncSession<TcpStream>,
    ) -> Result<SshTransport, TransportError> {
        if !session.authenticated() {
            return Err(TransportError::NotAuthenticated);
        }
        let mut channel = session.channel_session().await?;
        channel.subsystem("netconf").await?;
        let mut transport = SshTransport {
            session,
            framer: Framer::new(channel),
            session_id: None,
        };
        transport.hello().await?;
        Ok(transport)
    }

    async fn hello(&mut self) -> Result<(), TransportError> {
        self.framer
            .write_message(&Hello::client().to_string())
            .await?;
        let response = self.framer.read_message().await?;
        trace!("Hello:\n{}", response);

        let hello: Hello = from_str(&response)?;
        if hello.has_capability(NETCONF_BASE_11_CAP) {
            self.framer.upgrade();
        }
        self.session_id = hello.session_id();
        debug!(
            "NETCONF session {} started with {:?} framing",
            self.session_id.unwrap_or(0),
            self.framer.framing()
        );
        Ok(())
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn execute(&mut self, rpc: &str) -> Result<String, TransportError> {
        self.framer.write_message(rpc).await?;
        self.framer.read_message().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let channel = self.framer.channel_mut();
        channel.send_eof().await?;
        channel.close().await?;
        channel.wait_close().await?;
        self.session
            .disconnect(Some(ssh2::ByApplication), "Shutdown", None)
            .await?;
        Ok(())
    }

    fn session_id(&self) -> Option<u64> {
        self.session_id
    }
}

/// Splits `address[:port]` (or `[v6-address][:port]`), defaulting to port 830.
pub fn parse_address(host: &str) -> Result<(String, u16), TransportError> {
    let invalid = || TransportError::InvalidAddress(host.to_string());

    let (address, port) = if let Some(rest) = host.strip_prefix('[') {
        let (address, tail) = rest.split_once(']').ok_or_else(invalid)?;
        match tail.strip_prefix(':') {
            Some(port) => (address, Some(port)),
            None if tail.is_empty() => (address, None),
            None => return Err(invalid()),
        }
    } else {
        match host.split_once(':') {
            Some((address, port)) if !port.contains(':') => (address, Some(port)),
            _ => (host, None),
        }
    };

    if address.is_empty() {
        return Err(invalid());
    }
    let port = match port {
        Some(port) => port.parse().map_err(|_| invalid())?,
        None => NETCONF_SSH_PORT,
    };
    Ok((address.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("r1.example.net").unwrap(),
            ("r1.example.net".to_string(), 830)
        );
        assert_eq!(
            parse_address("192.0.2.1:22").unwrap(),
            ("192.0.2.1".to_string(), 22)
        );
        assert_eq!(
            parse_address("[2001:db8::1]:2830").unwrap(),
            ("2001:db8::1".to_string(), 2830)
        );
        assert_eq!(
            parse_address("[2001:db8::1]").unwrap(),
            ("2001:db8::1".to_string(), 830)
        );
        assert_eq!(
            parse_address("2001:db8::1").unwrap(),
            ("2001:db8::1".to_string(), 830)
        );
    }

    #[test]
    fn test_parse_invalid_address() {
        for host in ["", ":830", "r1:ssh", "r1:70000", "[2001:db8::1", "[::1]x"] {
            assert!(
                matches!(parse_address(host), Err(TransportError::InvalidAddress(_))),
                "{} should be rejected",
                host
            );
        }
    }
}
