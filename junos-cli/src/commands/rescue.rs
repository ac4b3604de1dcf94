use crate::commands::builtin::help_template;
use clap::Command;
use junos_netconf::Session;
use log::info;

pub fn cli() -> Command {
    Command::new("rescue")
        .about("Show the rescue configuration")
        .help_template(help_template())
}

pub async fn exec(session: &mut Session, target: &str) -> anyhow::Result<()> {
    let config = session.get_rescue_config().await?;
    info!(target: target, "Rescue configuration:\n{}", config);
    Ok(())
}
