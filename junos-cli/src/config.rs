use crate::commands::builtin::values_of;
use anyhow::{anyhow, bail, Context};
use async_ssh2_lite::{AsyncSession, SessionConfiguration};
use clap::ArgMatches;
use dirs::home_dir;
use junos_netconf::transport::ssh::parse_address;
use log::{debug, error, warn};
use ssh2::MethodType;
use ssh2_config::{HostParams, ParseRule, SshConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inner: Arc<Config>,
}

#[derive(Debug)]
pub struct Config {
    pub args: ArgMatches,
    pub ssh_config: Option<SshConfig>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub addresses: Vec<String>,
}

impl CliConfig {
    pub fn new(args: ArgMatches) -> anyhow::Result<Self> {
        let mut ssh_dir = home_dir().unwrap_or(PathBuf::from("/"));
        ssh_dir.extend(Path::new(".ssh/config"));
        let ssh_config = read_ssh_config(&ssh_dir);
        let hosts = values_of::<String>("host", &args)
            .iter()
            .map(|h| h.to_string())
            .collect();
        let username = args.get_one::<String>("username").cloned();
        let password = args.get_one::<String>("password").cloned();
        Ok(Self {
            inner: Arc::new(Config {
                username,
                password,
                addresses: hosts,
                args,
                ssh_config,
            }),
        })
    }
}

fn read_ssh_config(dir: &Path) -> Option<SshConfig> {
    debug!("Trying to parse ssh configuration '{}'", dir.display());

    let mut reader = match File::open(dir) {
        Ok(f) => BufReader::new(f),
        Err(err) => {
            debug!(
                "Could not open ssh config file '{}', error: {}",
                dir.display(),
                err
            );
            return None;
        }
    };
    match SshConfig::default().parse(&mut reader, ParseRule::ALLOW_UNKNOWN_FIELDS) {
        Ok(config) => {
            debug!("Successfully parsed configuration");
            Some(config)
        }
        Err(err) => {
            error!("Failed to parse ssh configuration, error '{}'", err);
            None
        }
    }
}

#[derive(Debug)]
pub struct Host {
    /// Address as given on the command line, used as log target.
    pub(crate) address: String,
    hostname: String,
    port: u16,
    auth_user: String,
    auth_password: Option<String>,
    params: HostParams,
}

impl Host {
    pub(crate) fn new(
        addr: &str,
        username: &Option<String>,
        password: &Option<String>,
        params: HostParams,
    ) -> anyhow::Result<Host> {
        let (hostname, port) = parse_address(addr)?;
        let hostname = params.host_name.clone().unwrap_or(hostname);
        let port = params.port.unwrap_or(port);

        let auth_user = match (username, params.user.as_deref()) {
            (Some(user), _) => user.clone(),
            (None, Some(user)) => user.to_string(),
            (None, None) => whoami::username(),
        };

        if password.is_none() && params.identity_file.is_none() {
            bail!("No password or identity file provided for '{}'", addr);
        }

        Ok(Host {
            address: addr.to_string(),
            hostname,
            port,
            auth_user,
            auth_password: password.clone(),
            params,
        })
    }

    pub(crate) async fn connect_ssh(&self) -> anyhow::Result<AsyncSession<TcpStream>> {
        let stream: TcpStream = self.tcp_connect_timeout().await?;
        let mut configuration = SessionConfiguration::new();
        configuration.set_timeout(10_000);
        if let Some(compress) = &self.params.compression {
            debug!(target: &self.address, "Setting compression: {}", compress);
            configuration.set_compress(*compress);
        }
        if self.params.tcp_keep_alive.unwrap_or(false) {
            if let Some(interval) = self.params.server_alive_interval {
                let interval = interval.as_secs() as u32;
                debug!(target: &self.address, "Setting keepalive interval: {} seconds", interval);
                configuration.set_keepalive(true, interval);
            }
        }
        let mut session = AsyncSession::new(stream, configuration)?;
        configure_session(&mut session, &self.params).await?;
        session.handshake().await?;

        if let Some(password) = &self.auth_password {
            debug!(target: &self.address, "Using password authentication as '{}'", self.auth_user);
            session.userauth_password(&self.auth_user, password).await?;
        } else {
            let mut agent = session.agent()?;
            agent.connect().await?;
            agent.list_identities().await?;

            for identity in agent.identities()? {
                debug!(
                    target: &self.address,
                    "Trying authentication with public key '{}'",
                    identity.comment()
                );
                match agent.userauth(&self.auth_user, &identity).await {
                    Ok(_) => break,
                    Err(err) => {
                        warn!(
                            target: &self.address,
                            "Public key '{}' authentication failed: {}",
                            identity.comment(),
                            err
                        );
                        continue;
                    }
                }
            }
        }

        if session.authenticated() {
            Ok(session)
        } else {
            Err(anyhow!(
                "Authentication failed for '{}' at {}",
                self.auth_user,
                self.address
            ))
        }
    }

    async fn tcp_connect_timeout(&self) -> anyhow::Result<TcpStream> {
        let connect_timeout = self.params.connect_timeout.unwrap_or(CONNECT_TIMEOUT);
        debug!(target: &self.address, "Connecting to {}:{}", self.hostname, self.port);
        let stream = timeout(
            connect_timeout,
            TcpStream::connect(&(self.hostname.as_str(), self.port)),
        )
        .await
        .with_context(|| format!("Connection to {}:{} timed out", self.hostname, self.port))??;
        Ok(stream)
    }
}

async fn configure_session(
    session: &mut AsyncSession<TcpStream>,
    params: &HostParams,
) -> anyhow::Result<()> {
    if let Some(algos) = params.kex_algorithms.as_deref() {
        session
            .method_pref(MethodType::Kex, algos.join(",").as_str())
            .await?;
    }
    if let Some(algos) = params.host_key_algorithms.as_deref() {
        session
            .method_pref(MethodType::HostKey, algos.join(",").as_str())
            .await?;
    }
    if let Some(algos) = params.ciphers.as_deref() {
        session
            .method_pref(MethodType::CryptCs, algos.join(",").as_str())
            .await?;
    }
    if let Some(algos) = params.mac.as_deref() {
        session
            .method_pref(MethodType::MacCs, algos.join(",").as_str())
            .await?;
        session
            .method_pref(MethodType::MacSc, algos.join(",").as_str())
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_defaults() {
        let host = Host::new(
            "r1.example.net",
            &Some("admin".to_string()),
            &Some("secret".to_string()),
            HostParams::default(),
        )
        .unwrap();
        assert_eq!(host.address, "r1.example.net");
        assert_eq!(host.hostname, "r1.example.net");
        assert_eq!(host.port, 830);
        assert_eq!(host.auth_user, "admin");
    }

    #[test]
    fn test_host_with_port() {
        let host = Host::new(
            "192.0.2.1:2222",
            &None,
            &Some("secret".to_string()),
            HostParams::default(),
        )
        .unwrap();
        assert_eq!(host.hostname, "192.0.2.1");
        assert_eq!(host.port, 2222);
        assert_eq!(host.auth_user, whoami::username());
    }

    #[test]
    fn test_host_requires_credentials() {
        assert!(Host::new("r1", &Some("admin".to_string()), &None, HostParams::default()).is_err());
        let password = Some("secret".to_string());
        assert!(Host::new("r1:ssh", &None, &password, HostParams::default()).is_err());
    }
}
