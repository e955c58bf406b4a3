//-
// Copyright (c) 2026, the mailbiff authors
//
// This file is part of mailbiff.
//
// Mailbiff is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public  License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mailbiff is distributed in the hope  that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// mailbiff. If not, see <http://www.gnu.org/licenses/>.

use std::fs;
use std::io::Read;
use std::mem;
use std::path::PathBuf;

use structopt::StructOpt;

use crate::support::sysexits::*;
use crate::support::user_config::Config;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
enum Command {
    /// Check every configured account once and print its status.
    Check(CommonOptions),
    /// Check accounts on their configured schedules until interrupted.
    Watch(CommonOptions),
    /// Mark everything currently in an account's mailbox as read.
    MarkRead(AccountCommand),
    /// Prompt for an account's password and save it in the store.
    SetPassword(AccountCommand),
    /// Delete the store, including all saved passwords and mailbox state.
    Forget(CommonOptions),
}

impl Command {
    fn common_options(&mut self) -> CommonOptions {
        match *self {
            Command::Check(ref mut c)
            | Command::Watch(ref mut c)
            | Command::Forget(ref mut c) => mem::take(c),

            Command::MarkRead(ref mut c)
            | Command::SetPassword(ref mut c) => mem::take(&mut c.common),
        }
    }
}

#[derive(StructOpt, Default)]
pub(super) struct CommonOptions {
    /// The configuration file to use
    /// [default: ~/.mailbiff/mailbiff.toml or /etc/mailbiff/mailbiff.toml]
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
}

#[derive(StructOpt, Default)]
pub(super) struct AccountCommand {
    #[structopt(flatten)]
    common: CommonOptions,

    /// The name of the account, as configured.
    account: String,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let mut cmd = Command::from_clap(&match Command::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        },
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        },
    });

    let config_path = config_path(cmd.common_options());
    let config = load_config(&config_path);
    init_logging(&config_path);

    match cmd {
        Command::Check(_) => super::check::check(config),
        Command::Watch(_) => super::check::watch(config),
        Command::MarkRead(cmd) => super::check::mark_read(config, &cmd.account),
        Command::SetPassword(cmd) => {
            super::password::set_password(config, &cmd.account)
        },
        Command::Forget(_) => forget(config),
    }
}

fn config_path(common: CommonOptions) -> PathBuf {
    common.config.unwrap_or_else(|| {
        let home = dirs::home_dir()
            .map(|home| home.join(".mailbiff/mailbiff.toml"))
            .filter(|path| path.is_file());
        if let Some(path) = home {
            path
        } else if std::path::Path::new("/etc/mailbiff/mailbiff.toml").is_file()
        {
            "/etc/mailbiff/mailbiff.toml".to_owned().into()
        } else {
            eprintln!(
                "Neither ~/.mailbiff/mailbiff.toml nor\n\
                 /etc/mailbiff/mailbiff.toml exists; use\n\
                 --config=/path/to/mailbiff.toml if your configuration is\n\
                 elsewhere."
            );
            EX_CONFIG.exit()
        }
    })
}

fn load_config(config_path: &std::path::Path) -> Config {
    let mut config_toml = Vec::new();
    if let Err(e) = fs::File::open(config_path)
        .and_then(|mut f| f.read_to_end(&mut config_toml))
    {
        eprintln!("Error reading '{}': {}", config_path.display(), e);
        EX_CONFIG.exit();
    }

    match toml::from_slice(&config_toml) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Error in config file at '{}': {}",
                config_path.display(),
                e
            );
            EX_CONFIG.exit()
        },
    }
}

fn init_logging(config_path: &std::path::Path) {
    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        crate::init_simple_log();
    } else {
        // Right now we have this awkward situation where you can use log4rs
        // *or* syslog, because log4rs-syslog hasn't been updated in quite a
        // while.
        let log_config_file = config_path.with_file_name("logging.toml");
        if log_config_file.is_file() {
            if let Err(e) = log4rs::init_file(
                log_config_file,
                log4rs::file::Deserializers::new(),
            ) {
                die!(EX_CONFIG, "Failed to initialise logging: {}", e);
            }
        } else {
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_MAIL,
                hostname: None,
                process: env!("CARGO_PKG_NAME").to_owned(),
                pid: nix::unistd::getpid().as_raw(),
            };

            let logger = match syslog::unix(formatter) {
                Ok(logger) => logger,
                Err(e) => die!(
                    EX_UNAVAILABLE,
                    "Failed to connect to syslog: {}",
                    e
                ),
            };
            if log::set_boxed_logger(Box::new(syslog::BasicLogger::new(
                logger,
            )))
            .map(|_| log::set_max_level(log::LevelFilter::Info))
            .is_err()
            {
                die!(EX_SOFTWARE, "Failed to initialise logging");
            }
        }
    }
}

fn forget(config: Config) {
    if let Err(e) =
        crate::support::file_ops::remove_recursively(&config.store.path)
    {
        die!(
            EX_IOERR,
            "Failed to remove '{}': {}",
            config.store.path.display(),
            e
        );
    }
    println!("Store at '{}' removed.", config.store.path.display());
}
