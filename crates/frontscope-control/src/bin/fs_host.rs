//! fs_host: read and write device parameters through the control protocol.

use anyhow::Context;
use frontscope_control::args::{HOST_OPTIONS, HostAction, HostArgs, NO_ARGS_HINT, format_help};
use frontscope_control::{CommandMap, ControlError, FileDevice, HOST_APP_ERROR, Host};
use std::io::Write;
use std::process::ExitCode;

fn help() -> String {
    let usage = format!(
        "usage: fs_host [ -u <protocol> ] [ -cmp <command map> ] [ -br ] [ command | option ]\n\
         \n\
         Current application version is {}.\n\
         You can use --use or -u option to specify protocol you want to use.\n\
         Default control protocol is I2C.",
        env!("CARGO_PKG_VERSION")
    );
    format_help(&usage, HOST_OPTIONS)
}

fn run() -> anyhow::Result<()> {
    let args = HostArgs::parse(std::env::args().skip(1))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.action {
        HostAction::Hint => {
            writeln!(out, "{NO_ARGS_HINT}")?;
            return Ok(());
        }
        HostAction::Help => {
            write!(out, "{}", help())?;
            return Ok(());
        }
        HostAction::Version => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            return Ok(());
        }
        _ => {}
    }

    let map = match &args.command_map {
        Some(path) => CommandMap::load(path)?,
        None => CommandMap::test_map(),
    };
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    tracing::debug!(protocol = %args.protocol, dir = %cwd.display(), "opening device");
    let mut host = Host::new(FileDevice::new(cwd, args.protocol), map)
        .bypass_range_check(args.bypass_range_check);

    if args.action == HostAction::ListCommands {
        host.list_commands(&mut out)?;
        return Ok(());
    }

    host.init()?;
    match args.action {
        HostAction::DumpParams => host.dump_params(&mut out)?,
        HostAction::ExecuteList(path) => {
            let n = host.execute_command_list(&path, &mut out)?;
            tracing::debug!(commands = n, "command list done");
        }
        HostAction::Command { name, args } => host.execute(&name, args.as_slice(), &mut out)?,
        _ => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    frontscope_control::init_logging(false);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            let code = err
                .downcast_ref::<ControlError>()
                .map_or(HOST_APP_ERROR, ControlError::exit_code);
            ExitCode::from(code)
        }
    }
}
