use crate::commands::builtin::value_of;
use config::CliConfig;
use env_logger::{Builder, Target};
use log::LevelFilter;

mod cli;
mod commands;
mod config;

/// Library modules raised by each additional `-v`, applied cumulatively.
const NETCONF_LOG_LEVELS: [&[(&str, LevelFilter)]; 3] = [
    // operations executed per host
    &[("junos_netconf::session", LevelFilter::Debug)],
    // rpc replies, hello and framing
    &[
        ("junos_netconf::session", LevelFilter::Trace),
        ("junos_netconf::transport", LevelFilter::Debug),
    ],
    // every message on the wire
    &[
        ("junos_netconf", LevelFilter::Trace),
        ("junos_netconf::transport", LevelFilter::Trace),
    ],
];

fn init_logging(verbosity: u8) {
    let mut builder = Builder::new();
    let level = if verbosity == 0 {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    };
    builder
        .filter_level(level)
        .filter_module("junos_netconf", LevelFilter::Warn);
    for modules in NETCONF_LOG_LEVELS.iter().take(usize::from(verbosity)) {
        for (module, level) in modules.iter() {
            builder.filter_module(module, *level);
        }
    }
    builder.target(Target::Stdout).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = cli::cli().get_matches();
    if !*value_of::<bool>("quiet", &args) {
        init_logging(*value_of::<u8>("verbose", &args));
    }

    match args.remove_subcommand() {
        Some((cmd, args)) => {
            let cli_config = CliConfig::new(args)?;
            cli::exec(cmd, cli_config).await?;
        }
        _ => {
            cli::cli().print_help()?;
        }
    }
    Ok(())
}
