//! Server entry point: parses arguments, loads configuration, and runs the
//! master process until a shutdown signal or the control socket's
//! `shutdown` command stops it.
//!
//! Usage: `ipv6-dhcpd config-file [-v...] [-p pidfile] [-C]`.
//!
//! Exit codes: `0` clean shutdown, `1` configuration error, `2`
//! a runtime error surfaced from the master loop, `3` a privilege error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ipv6_dhcpd::config::Config;
use ipv6_dhcpd::error::{MasterError, PrivilegeError};
use ipv6_dhcpd::master::Master;
use ipv6_dhcpd::plan::Plan;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ipv6-dhcpd", about = "A DHCPv6 server")]
struct Args {
    /// path to the TOML configuration file.
    config: PathBuf,

    /// increase verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// override the configured pid file path.
    #[arg(short = 'p', long = "pid-file")]
    pid_file: Option<PathBuf>,

    /// validate the configuration and print the compiled plan, then exit.
    #[arg(short = 'C', long)]
    check_config: bool,
}

fn verbosity_filter(level: u8) -> &'static str {
    match level {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity_filter(args.verbose))),
        )
        .init();

    let mut config = match Config::from_path(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, path = %args.config.display(), "loading configuration");
            return ExitCode::from(1);
        }
    };

    if let Some(pid_file) = &args.pid_file {
        config.pid_file = pid_file.clone();
    }

    if args.check_config {
        return match Plan::from_config(&config) {
            Ok(plan) => {
                println!("{plan:#?}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(1)
            }
        };
    }

    let mut master = match Master::bootstrap(args.config.clone(), config) {
        Ok(master) => master,
        Err(e) => {
            error!(error = %e, "starting server");
            return exit_code_for(&e);
        }
    };

    match master.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server exited");
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(err: &MasterError) -> ExitCode {
    match err {
        MasterError::Config(_) | MasterError::Plan(_) => ExitCode::from(1),
        MasterError::Privilege(PrivilegeError::UnknownUser(_) | PrivilegeError::UnknownGroup(_)) => {
            ExitCode::from(3)
        }
        MasterError::Privilege(_) => ExitCode::from(3),
        _ => ExitCode::from(2),
    }
}
