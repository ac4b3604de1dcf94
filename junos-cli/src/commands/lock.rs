use crate::commands::builtin::help_template;
use clap::Command;
use junos_netconf::Session;
use log::info;

pub fn cli() -> Command {
    Command::new("lock")
        .about("Lock the candidate configuration")
        .long_about(
            "Lock the candidate configuration. The device releases the lock when the session ends.",
        )
        .help_template(help_template())
}

pub fn unlock_cli() -> Command {
    Command::new("unlock")
        .about("Unlock the candidate configuration")
        .help_template(help_template())
}

pub async fn exec(session: &mut Session, target: &str) -> anyhow::Result<()> {
    session.lock().await?;
    info!(target: target, "Candidate configuration locked");
    Ok(())
}

pub async fn unlock_exec(session: &mut Session, target: &str) -> anyhow::Result<()> {
    session.unlock().await?;
    info!(target: target, "Candidate configuration unlocked");
    Ok(())
}
