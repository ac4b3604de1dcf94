use crate::error::{Error, Result};
use crate::reply::{self, RescueInformation, Reply, RollbackInformation};
use crate::rpc::{self, OutputFormat, RpcCommand, RpcTemplates};
use crate::transport::Transport;
use log::{debug, trace, warn};
use quick_xml::escape::escape;
use std::sync::Arc;

#[cfg(feature = "ssh")]
use crate::transport::ssh::SshTransport;
#[cfg(feature = "ssh")]
use async_ssh2_lite::AsyncSession;
#[cfg(feature = "ssh")]
use tokio::net::TcpStream;

pub const NO_RESCUE_CONFIGURATION: &str = "No rescue configuration set.";
pub const NO_OUTPUT: &str = "No output available.";

/// A NETCONF session with a single Junos device.
///
/// The session is open from creation until [`Session::close`]; afterwards
/// every operation fails with [`Error::NotConnected`]. Calls are strictly
/// sequential: each one waits for its reply before returning.
pub struct Session {
    transport: Option<Box<dyn Transport + 'static>>,
    templates: Arc<RpcTemplates>,
}

impl Session {
    /// Opens a password-authenticated NETCONF session to `host` (`address[:port]`).
    #[cfg(feature = "ssh")]
    pub async fn connect(host: &str, user: &str, password: &str) -> Result<Session> {
        let transport = SshTransport::dial(host, user, password)
            .await
            .map_err(Error::Connection)?;
        Ok(Session::new(transport))
    }

    /// Opens a NETCONF session over an already authenticated SSH session.
    #[cfg(feature = "ssh")]
    pub async fn from_ssh_session(session: AsyncSession<TcpStream>) -> Result<Session> {
        let transport = SshTransport::with_session(session)
            .await
            .map_err(Error::Connection)?;
        Ok(Session::new(transport))
    }

    pub fn new<T>(transport: T) -> Session
    where
        T: Transport + 'static,
    {
        Session {
            transport: Some(Box::new(transport)),
            templates: RpcTemplates::junos(),
        }
    }

    pub fn with_templates(mut self, templates: Arc<RpcTemplates>) -> Session {
        self.templates = templates;
        self
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn session_id(&self) -> Option<u64> {
        self.transport
            .as_ref()
            .and_then(|transport| transport.session_id())
    }

    /// Locks the candidate configuration.
    pub async fn lock(&mut self) -> Result<()> {
        self.execute(RpcCommand::Lock, None).await.map(|_| ())
    }

    /// Unlocks the candidate configuration.
    pub async fn unlock(&mut self) -> Result<()> {
        self.execute(RpcCommand::Unlock, None).await.map(|_| ())
    }

    /// Returns the text of rollback configuration `number`.
    ///
    /// The index is not checked locally; the device reports unknown ones.
    pub async fn get_rollback_config(&mut self, number: u32) -> Result<String> {
        let number = number.to_string();
        let reply = self
            .execute(RpcCommand::GetRollbackInformation, Some(number.as_str()))
            .await?;
        Ok(reply::decode::<RollbackInformation>(reply.data())?)
    }

    /// Returns the diff between the active configuration and rollback `compare`.
    pub async fn rollback_diff(&mut self, compare: u32) -> Result<String> {
        let compare = compare.to_string();
        let reply = self
            .execute(RpcCommand::GetRollbackInformationCompare, Some(compare.as_str()))
            .await?;
        Ok(reply::decode::<RollbackInformation>(reply.data())?)
    }

    /// Returns the rescue configuration, or [`NO_RESCUE_CONFIGURATION`] when
    /// none is set. Non-empty text is returned verbatim.
    pub async fn get_rescue_config(&mut self) -> Result<String> {
        let reply = self.execute(RpcCommand::GetRescueInformation, None).await?;
        if reply.data().trim().is_empty() {
            return Ok(NO_RESCUE_CONFIGURATION.to_string());
        }
        let config = reply::decode::<RescueInformation>(reply.data())?;
        if config.is_empty() {
            Ok(NO_RESCUE_CONFIGURATION.to_string())
        } else {
            Ok(config)
        }
    }

    /// Runs an operational mode command such as `show` or `request`.
    ///
    /// Returns the raw inner XML of the reply payload verbatim, or
    /// [`NO_OUTPUT`] when it is empty.
    pub async fn command(&mut self, cmd: &str, format: OutputFormat) -> Result<String> {
        let cmd = escape(cmd);
        let reply = self.execute(format.rpc_command(), Some(cmd.as_ref())).await?;
        let output = reply::command_output(reply.data())?;
        if output.is_empty() {
            Ok(NO_OUTPUT.to_string())
        } else {
            Ok(output.to_string())
        }
    }

    /// Ends the NETCONF session and releases the connection.
    ///
    /// Failures are logged, not returned. Calling it again does nothing.
    pub async fn close(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        let close_session = rpc::wrap(&self.templates.render(RpcCommand::CloseSession, None));
        match transport.execute(&close_session).await {
            Ok(response) => trace!("Reply:\n{}", response),
            Err(err) => warn!("Error closing NETCONF session: {}", err),
        }
        if let Err(err) = transport.close().await {
            warn!("Error closing NETCONF transport: {}", err);
        }
    }

    async fn execute(&mut self, command: RpcCommand, argument: Option<&str>) -> Result<Reply> {
        let transport = self.transport.as_mut().ok_or(Error::NotConnected)?;
        let rpc = rpc::wrap(&self.templates.render(command, argument));
        debug!("Executing {}", command);

        let response = transport.execute(&rpc).await.map_err(Error::Transport)?;
        trace!("Reply:\n{}", response);

        Reply::parse(&response)?.into_result()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.transport.is_some() {
            warn!("NETCONF session dropped without close");
        }
    }
}
