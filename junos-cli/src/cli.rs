use crate::commands::builtin::{builtin, builtin_exec};
use crate::config::{CliConfig, Host};
use anyhow::anyhow;
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command,
};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use junos_netconf::Session;
use log::{debug, error, info, warn};
use ssh2_config::HostParams;
use std::time::Instant;
use tokio::task::JoinHandle;

pub async fn exec(cmd: String, cfg: CliConfig) -> anyhow::Result<()> {
    let hosts = &cfg.inner.addresses;
    if hosts.is_empty() {
        warn!("No hosts given, use --host or JUNOS_HOST");
        return Ok(());
    }

    let mut futures = FuturesUnordered::new();
    for addr in hosts {
        let params = if let Some(ssh_config) = &cfg.inner.ssh_config {
            ssh_config.query(addr)
        } else {
            HostParams::default()
        };
        let host = Host::new(addr, &cfg.inner.username, &cfg.inner.password, params)?;
        let start_time = Instant::now();
        let cmd_clone = cmd.clone();
        let cfg_clone = cfg.clone();
        let handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
            let ssh_session = host.connect_ssh().await?;
            let mut session = Session::from_ssh_session(ssh_session).await?;
            info!(target: &host.address, "Connected to host");
            debug!(
                target: &host.address,
                "Started NETCONF session with session-id: {}",
                session.session_id().unwrap_or(0)
            );

            let result =
                builtin_exec(&cmd_clone, &mut session, &cfg_clone.inner, &host.address)
                    .await
                    .unwrap_or_else(|| Err(anyhow!("Unknown command '{}'", cmd_clone)));
            session.close().await;
            result?;

            info!(target: &host.address, "Operation took: {:.3}s", start_time.elapsed().as_secs_f32());
            Ok(())
        });
        futures.push(handle);
    }

    while let Some(handle) = futures.next().await {
        match handle {
            Ok(result) => {
                if let Err(err) = result {
                    error!("Task failed with error: {:#}", err);
                } else {
                    debug!("Task completed successfully")
                }
            }
            Err(err) => error!("Task failed: {}", err),
        }
    }
    Ok(())
}

pub fn cli() -> Command {
    Command::new(crate_name!())
        .author(crate_authors!("\n"))
        .about(crate_description!())
        .version(crate_version!())
        .long_version(crate_version!())
        .arg_required_else_help(true)
        .allow_external_subcommands(false)
        .bin_name("junos")
        .display_name("junos")
        .help_template(color_print::cstr!(
            "\
{about-with-newline}
<green,bold>Author:</> {author}

<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}

<green,bold>Commands:</>
    <cyan,bold>lock</>              Lock the candidate configuration
    <cyan,bold>unlock</>            Unlock the candidate configuration
    <cyan,bold>rollback</>          Show a rollback configuration
    <cyan,bold>diff</>              Compare the active configuration to a rollback
    <cyan,bold>rescue</>            Show the rescue configuration
    <cyan,bold>command</>           Run an operational mode command

See '<cyan,bold>junos help</> <cyan><<command>></>' for more information on a specific command.\n",
        ))
        .args([
            arg!(-v --verbose ... "Use verbose output (-vv to log rpc replies, -vvv to log all NETCONF traffic)")
                .global(true),
            arg!(-q --quiet "Disable logging completely")
                .global(true),
            global_opt("host", "Device address, address:port or ssh_config host alias")
                .env("JUNOS_HOST")
                .action(ArgAction::Append)
                .value_delimiter(','),
            global_opt("username", "Username for NETCONF connection")
                .env("JUNOS_USERNAME"),
            global_opt("password", "Password for NETCONF connection")
                .env("JUNOS_PASSWORD")
                .hide_env(true),
        ])
        .subcommands(builtin())
}

fn global_opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).help(help).long(name).global(true)
}

#[test]
fn verify_cli() {
    cli().debug_assert();
}

#[test]
fn parse_subcommand_options() {
    use crate::commands::builtin::{value_of, values_of};

    let mut args = cli()
        .try_get_matches_from(["junos", "--host", "r1,r2", "rollback"])
        .unwrap();
    let (cmd, args) = args.remove_subcommand().unwrap();
    assert_eq!(cmd, "rollback");
    assert_eq!(*value_of::<u32>("number", &args), 0);
    assert_eq!(values_of::<String>("host", &args), ["r1", "r2"]);

    let mut args = cli()
        .try_get_matches_from(["junos", "command", "-f", "xml", "show", "version"])
        .unwrap();
    let (_, args) = args.remove_subcommand().unwrap();
    assert_eq!(value_of::<String>("format", &args), "xml");
    assert_eq!(values_of::<String>("command", &args), ["show", "version"]);

    assert!(cli().try_get_matches_from(["junos", "diff"]).is_err());
    assert!(cli().try_get_matches_from(["junos", "diff", "-c", "x"]).is_err());
}
