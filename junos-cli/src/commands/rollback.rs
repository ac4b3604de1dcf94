use crate::commands::builtin::{help_template, opt, value_of};
use crate::config::Config;
use clap::{value_parser, Command};
use junos_netconf::Session;
use log::info;

pub fn cli() -> Command {
    Command::new("rollback")
        .about("Show a rollback configuration")
        .help_template(help_template())
        .arg(
            opt(
                "number",
                'n',
                "Rollback configuration to show (0 is the active configuration)",
            )
            .default_value("0")
            .value_parser(value_parser!(u32)),
        )
}

pub fn diff_cli() -> Command {
    Command::new("diff")
        .about("Compare the active configuration to a rollback configuration")
        .help_template(help_template())
        .arg(
            opt("compare", 'c', "Rollback configuration to compare against")
                .required(true)
                .value_parser(value_parser!(u32)),
        )
}

pub async fn exec(cfg: &Config, session: &mut Session, target: &str) -> anyhow::Result<()> {
    let number = *value_of::<u32>("number", &cfg.args);
    let config = session.get_rollback_config(number).await?;
    info!(target: target, "Rollback {}:\n{}", number, config);
    Ok(())
}

pub async fn diff_exec(cfg: &Config, session: &mut Session, target: &str) -> anyhow::Result<()> {
    let compare = *value_of::<u32>("compare", &cfg.args);
    let diff = session.rollback_diff(compare).await?;
    info!(target: target, "Changes against rollback {}:\n{}", compare, diff);
    Ok(())
}
