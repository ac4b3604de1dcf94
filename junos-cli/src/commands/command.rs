use crate::commands::builtin::{help_template, opt, value_of, values_of};
use crate::config::Config;
use clap::{Arg, ArgAction, Command};
use junos_netconf::{OutputFormat, Session};
use log::info;

pub fn cli() -> Command {
    Command::new("command")
        .about("Run an operational mode command")
        .help_template(help_template())
        .args([
            Arg::new("command")
                .help("Command to run, e.g. 'show version'")
                .required(true)
                .num_args(1..)
                .trailing_var_arg(true)
                .action(ArgAction::Append),
            opt("format", 'f', "Output format")
                .default_value("text")
                .value_parser(["text", "xml"])
                .env("JUNOS_FORMAT"),
        ])
}

pub async fn exec(cfg: &Config, session: &mut Session, target: &str) -> anyhow::Result<()> {
    let command = values_of::<String>("command", &cfg.args)
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    let format = OutputFormat::from(value_of::<String>("format", &cfg.args).as_str());
    let output = session.command(&command, format).await?;
    info!(target: target, "{}:\n{}", command, output);
    Ok(())
}
