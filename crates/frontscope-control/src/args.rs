//! Command-line parsing for `fs_host` and `fs_dfu`.
//!
//! Both tools accept multi-letter short options (`-cmp`, `-br`, `-uf`), so
//! arguments are matched against option tables instead of a derive parser.
//! Option names are case-insensitive.

use crate::device::Protocol;
use crate::{ControlError, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Default command list for `--execute-command-list`.
pub const DEFAULT_COMMAND_LIST: &str = "commands.txt";

/// Printed when a tool runs without arguments.
pub const NO_ARGS_HINT: &str = "Use --help to get the list of options for this application.\n\
                                Or use --list-commands to print the list of commands and their info.";

/// One entry of an option table.
#[derive(Debug, Clone, Copy)]
pub struct OptSpec {
    /// Long form, e.g. `--use`.
    pub long: &'static str,
    /// Short form, e.g. `-u`.
    pub short: &'static str,
    /// Help text.
    pub help: &'static str,
}

impl OptSpec {
    fn matches(&self, arg: &str) -> bool {
        let arg = arg.to_ascii_lowercase();
        arg == self.long || arg == self.short
    }
}

/// Options of `fs_host`.
pub const HOST_OPTIONS: &[OptSpec] = &[
    OptSpec {
        long: "--help",
        short: "-h",
        help: "display this information",
    },
    OptSpec {
        long: "--version",
        short: "-v",
        help: "print the current version of this application",
    },
    OptSpec {
        long: "--list-commands",
        short: "-l",
        help: "print the list of commands",
    },
    OptSpec {
        long: "--use",
        short: "-u",
        help: "use specific hardware protocol, I2C, SPI and USB are available to use, I2C is the default",
    },
    OptSpec {
        long: "--command-map",
        short: "-cmp",
        help: "use a command map TOML file, the built-in test map is the default",
    },
    OptSpec {
        long: "--bypass-range-check",
        short: "-br",
        help: "bypass the range check of the values written with a command",
    },
    OptSpec {
        long: "--dump-params",
        short: "-d",
        help: "print all the parameters that can be read",
    },
    OptSpec {
        long: "--execute-command-list",
        short: "-e",
        help: "execute commands from a file, one command per line, commands.txt is the default",
    },
];

/// Options of `fs_dfu`.
pub const DFU_OPTIONS: &[OptSpec] = &[
    OptSpec {
        long: "--help",
        short: "-h",
        help: "display this information",
    },
    OptSpec {
        long: "--app-version",
        short: "-av",
        help: "print the version of this application",
    },
    OptSpec {
        long: "--use",
        short: "-u",
        help: "use specific hardware protocol, I2C, SPI and USB are available to use",
    },
    OptSpec {
        long: "--verbose",
        short: "-vvv",
        help: "enable debug prints",
    },
    OptSpec {
        long: "--version",
        short: "-v",
        help: "read the version on the device",
    },
    OptSpec {
        long: "--download",
        short: "-d",
        help: "download upgrade image stored in the specified path, the path is relative to the working dir",
    },
    OptSpec {
        long: "--upload-factory",
        short: "-uf",
        help: "upload factory image and save it in the specified path, the path is relative to the working dir",
    },
    OptSpec {
        long: "--upload-upgrade",
        short: "-uu",
        help: "upload upgrade image and save it in the specified path, the path is relative to the working dir",
    },
    OptSpec {
        long: "--reboot",
        short: "-r",
        help: "reboot device",
    },
];

/// Find the table entry matching `arg`.
pub fn find_option<'a>(table: &'a [OptSpec], arg: &str) -> Option<&'a OptSpec> {
    table.iter().find(|opt| opt.matches(arg))
}

/// Render a help screen: `usage` lines, then one block per option.
pub fn format_help(usage: &str, table: &[OptSpec]) -> String {
    let short_width = table.iter().map(|o| o.short.len()).max().unwrap_or(0);
    let long_width = table.iter().map(|o| o.long.len()).max().unwrap_or(0);
    let mut text = format!("{usage}\n\nOptions:\n");
    for opt in table {
        let _ = writeln!(
            text,
            "  {:<short_width$}  {:<long_width$}  {}\n",
            opt.short, opt.long, opt.help
        );
    }
    text
}

/// What `fs_host` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    /// No command or action; print the usage hint.
    Hint,
    /// Print the option list.
    Help,
    /// Print the application version.
    Version,
    /// Print the command list.
    ListCommands,
    /// Read and print every readable command.
    DumpParams,
    /// Execute commands from a file.
    ExecuteList(PathBuf),
    /// Run a single command.
    Command {
        /// Command name as given.
        name: String,
        /// Values to write; empty for a read.
        args: Vec<String>,
    },
}

/// Parsed `fs_host` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostArgs {
    /// Transport.
    pub protocol: Protocol,
    /// Command map file, if not the built-in one.
    pub command_map: Option<PathBuf>,
    /// Skip value range checks.
    pub bypass_range_check: bool,
    /// Requested action.
    pub action: HostAction,
}

fn next_value(tokens: &mut impl Iterator<Item = String>, option: &str) -> Result<String> {
    tokens
        .next()
        .ok_or_else(|| ControlError::Usage(format!("Error: option {option} requires a value")))
}

fn next_path(tokens: &mut impl Iterator<Item = String>, option: &str) -> Result<PathBuf> {
    tokens
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| ControlError::MissingPath {
            option: option.to_string(),
        })
}

fn unsupported(option: &str) -> ControlError {
    ControlError::Usage(format!("Option {option} is not supported"))
}

impl HostArgs {
    /// Parse arguments, excluding the program name.
    ///
    /// Options come first; the first non-option token is the command name and
    /// every token after it is a value, so negative numbers need no escaping.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = HostArgs {
            protocol: Protocol::default(),
            command_map: None,
            bypass_range_check: false,
            action: HostAction::Hint,
        };
        let mut tokens = args.into_iter().peekable();
        while let Some(token) = tokens.next() {
            if !token.starts_with('-') {
                parsed.set_action(HostAction::Command {
                    name: token,
                    args: tokens.by_ref().collect(),
                });
                break;
            }
            let Some(opt) = find_option(HOST_OPTIONS, &token) else {
                return Err(ControlError::Usage(format!(
                    "Option {token} does not exist.\n{NO_ARGS_HINT}"
                )));
            };
            match opt.long {
                "--help" => parsed.set_action(HostAction::Help),
                "--version" => parsed.set_action(HostAction::Version),
                "--list-commands" => parsed.set_action(HostAction::ListCommands),
                "--dump-params" => parsed.set_action(HostAction::DumpParams),
                "--use" => parsed.protocol = next_value(&mut tokens, opt.long)?.parse()?,
                "--command-map" => {
                    parsed.command_map = Some(PathBuf::from(next_value(&mut tokens, opt.long)?));
                }
                "--bypass-range-check" => parsed.bypass_range_check = true,
                "--execute-command-list" => {
                    let explicit = tokens.peek().is_some_and(|next| !next.starts_with('-'));
                    let file = if explicit {
                        next_value(&mut tokens, opt.long)?
                    } else {
                        DEFAULT_COMMAND_LIST.to_string()
                    };
                    parsed.set_action(HostAction::ExecuteList(PathBuf::from(file)));
                }
                other => return Err(unsupported(other)),
            }
        }
        Ok(parsed)
    }

    fn set_action(&mut self, action: HostAction) {
        if self.action == HostAction::Hint {
            self.action = action;
        }
    }
}

/// What `fs_dfu` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DfuAction {
    /// No option; print the usage hint.
    Hint,
    /// Print the option list.
    Help,
    /// Print the application version.
    AppVersion,
    /// Read the device firmware version.
    Version,
    /// Download an image to the upgrade slot.
    Download(PathBuf),
    /// Save the factory image.
    UploadFactory(PathBuf),
    /// Save the upgrade image.
    UploadUpgrade(PathBuf),
    /// Reboot the device.
    Reboot,
}

/// Parsed `fs_dfu` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfuArgs {
    /// Transport.
    pub protocol: Protocol,
    /// Debug output.
    pub verbose: bool,
    /// Requested action.
    pub action: DfuAction,
}

impl DfuArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = DfuArgs {
            protocol: Protocol::default(),
            verbose: false,
            action: DfuAction::Hint,
        };
        let mut tokens = args.into_iter();
        while let Some(token) = tokens.next() {
            let Some(opt) = find_option(DFU_OPTIONS, &token) else {
                return Err(ControlError::Usage(format!(
                    "Option {token} does not exist.\nUse --help to get the list of options for this application."
                )));
            };
            let action = match opt.long {
                "--help" => DfuAction::Help,
                "--app-version" => DfuAction::AppVersion,
                "--version" => DfuAction::Version,
                "--reboot" => DfuAction::Reboot,
                "--download" => DfuAction::Download(next_path(&mut tokens, opt.long)?),
                "--upload-factory" => DfuAction::UploadFactory(next_path(&mut tokens, opt.long)?),
                "--upload-upgrade" => DfuAction::UploadUpgrade(next_path(&mut tokens, opt.long)?),
                "--use" => {
                    parsed.protocol = next_value(&mut tokens, opt.long)?.parse()?;
                    continue;
                }
                "--verbose" => {
                    parsed.verbose = true;
                    continue;
                }
                other => return Err(unsupported(other)),
            };
            if parsed.action == DfuAction::Hint {
                parsed.action = action;
            }
        }
        Ok(parsed)
    }
}
