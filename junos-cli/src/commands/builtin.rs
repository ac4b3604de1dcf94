use crate::commands::*;
use crate::config::Config;
use clap::{Arg, ArgMatches, Command};
use junos_netconf::Session;

pub fn builtin() -> Vec<Command> {
    vec![
        lock::cli(),
        lock::unlock_cli(),
        rollback::cli(),
        rollback::diff_cli(),
        rescue::cli(),
        command::cli(),
    ]
}

pub async fn builtin_exec(
    cmd: &str,
    session: &mut Session,
    args: &Config,
    target: &str,
) -> Option<anyhow::Result<()>> {
    let f = match cmd {
        "lock" => lock::exec(session, target).await,
        "unlock" => lock::unlock_exec(session, target).await,
        "rollback" => rollback::exec(args, session, target).await,
        "diff" => rollback::diff_exec(args, session, target).await,
        "rescue" => rescue::exec(session, target).await,
        "command" => command::exec(args, session, target).await,
        _ => return None,
    };
    Some(f)
}

/// Value of an argument that has a default or is required.
pub(crate) fn value_of<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> &'a T {
    args.get_one::<T>(name)
        .unwrap_or_else(|| panic!("argument '{}' has no default", name))
}

pub(crate) fn values_of<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> Vec<&'a T> {
    args.get_many::<T>(name).unwrap_or_default().collect()
}

/// `-<short>, --<name> <VALUE>` option of a subcommand.
pub(super) fn opt(name: &'static str, short: char, help: &'static str) -> Arg {
    Arg::new(name).short(short).long(name).help(help)
}

pub(super) fn help_template() -> &'static str {
    color_print::cstr!(
        "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}\n",
    )
}
