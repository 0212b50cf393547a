//! fs_dfu: firmware image transfers through the control protocol.

use anyhow::Context;
use frontscope_control::args::{DFU_OPTIONS, DfuAction, DfuArgs, NO_ARGS_HINT, format_help};
use frontscope_control::dfu::{ALT_FACTORY, ALT_UPGRADE};
use frontscope_control::{ControlError, DfuClient, HOST_APP_ERROR, SimulatedDfu};
use std::io::Write;
use std::process::ExitCode;

fn help() -> String {
    let usage = format!(
        "usage: fs_dfu [ -u <protocol> ] [ --verbose ] command\n\
         \n\
         Current application version is {}.\n\
         You can use --use or -u option to specify protocol you want to use.\n\
         Default control protocol is I2C.",
        env!("CARGO_PKG_VERSION")
    );
    format_help(&usage, DFU_OPTIONS)
}

fn run() -> anyhow::Result<()> {
    let args = DfuArgs::parse(std::env::args().skip(1))?;
    frontscope_control::init_logging(args.verbose);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &args.action {
        DfuAction::Hint => {
            writeln!(out, "{NO_ARGS_HINT}")?;
            return Ok(());
        }
        DfuAction::Help => {
            write!(out, "{}", help())?;
            return Ok(());
        }
        DfuAction::AppVersion => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            return Ok(());
        }
        DfuAction::Download(path) if !path.is_file() => {
            return Err(ControlError::PathNotFound(path.clone()).into());
        }
        DfuAction::UploadFactory(path) | DfuAction::UploadUpgrade(path) if path.exists() => {
            return Err(ControlError::PathExists(path.clone()).into());
        }
        _ => {}
    }

    if args.verbose {
        writeln!(out, "Verbose mode enabled")?;
    }
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    tracing::debug!(protocol = %args.protocol, dir = %cwd.display(), "opening device");
    let mut client = DfuClient::new(SimulatedDfu::new(cwd));
    client.init()?;

    if args.action == DfuAction::Version {
        let [major, minor, patch] = client.version()?;
        writeln!(out, "DFU_GETVERSION: {major} {minor} {patch}")?;
        return Ok(());
    }

    let alternate = match args.action {
        DfuAction::UploadFactory(_) => ALT_FACTORY,
        _ => ALT_UPGRADE,
    };
    client.set_alternate(alternate)?;
    client.wait_idle()?;

    match &args.action {
        DfuAction::Download(path) => {
            let bytes = client.download(path, &mut out)?;
            tracing::info!(bytes, "download finished");
        }
        DfuAction::UploadFactory(path) | DfuAction::UploadUpgrade(path) => {
            let bytes = client.upload(path, &mut out)?;
            tracing::info!(bytes, "upload finished");
        }
        DfuAction::Reboot => client.reboot(&mut out)?,
        _ => {}
    }
    Ok(())
}

fn main() -> ExitCode {
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
