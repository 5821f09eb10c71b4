//! Control CLI for `ipv6-dhcpd`: sends one newline-terminated command over
//! the server's control socket and prints the reply.
//!
//! Deliberately self-contained rather than depending on the `ipv6-dhcpd`
//! library crate -- the wire protocol is a handful of lines, not worth a
//! shared dependency for.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

const DEFAULT_SOCKET: &str = "/var/run/ipv6-dhcpd.sock";

#[derive(Parser, Debug)]
#[command(name = "ipv6-dhcpdctl", about = "Control CLI for ipv6-dhcpd")]
struct Args {
    /// path to the server's control socket.
    #[arg(short = 'c', long, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the server's command list.
    Help,
    /// ask the server to shut down gracefully.
    Shutdown,
    /// ask the server to re-read its configuration.
    Reload,
    /// print aggregate counters as `key value` lines.
    Stats,
    /// print aggregate counters as a single JSON object.
    StatsJson,
}

impl Command {
    fn wire_form(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Shutdown => "shutdown",
            Command::Reload => "reload",
            Command::Stats => "stats",
            Command::StatsJson => "stats-json",
        }
    }
}

/// A reply as actually read off the wire -- the control CLI's own copy of
/// the shape `ipv6_dhcpd::control::Response` writes, since this crate
/// doesn't depend on that one.
enum Response {
    Ok(String),
    Err(String),
    Block(Vec<String>),
}

fn read_response<R: BufRead>(mut r: R) -> anyhow::Result<Response> {
    let mut first = String::new();
    if r.read_line(&mut first)? == 0 {
        anyhow::bail!("connection closed before a response arrived");
    }
    let first = first.trim_end_matches(['\n', '\r']);
    if let Some(rest) = first.strip_prefix("OK ") {
        return Ok(Response::Ok(rest.to_string()));
    }
    if first == "OK" {
        return Ok(Response::Ok(String::new()));
    }
    if let Some(rest) = first.strip_prefix("ERR ") {
        return Ok(Response::Err(rest.to_string()));
    }
    if first == "ERR" {
        return Ok(Response::Err(String::new()));
    }

    let mut lines = vec![first.to_string()];
    loop {
        let mut line = String::new();
        if r.read_line(&mut line)? == 0 {
            anyhow::bail!("connection closed mid-block response");
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line == "." {
            return Ok(Response::Block(lines));
        }
        lines.push(line.to_string());
    }
}

fn run(args: &Args) -> anyhow::Result<Response> {
    let mut stream = UnixStream::connect(&args.socket)
        .map_err(|e| anyhow::anyhow!("connecting to {}: {e}", args.socket.display()))?;
    writeln!(stream, "{}", args.command.wire_form())?;
    stream.shutdown(std::net::Shutdown::Write)?;
    read_response(BufReader::new(&stream))
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(Response::Ok(text)) => {
            if !text.is_empty() {
                println!("{text}");
            }
            ExitCode::SUCCESS
        }
        Ok(Response::Block(lines)) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Ok(Response::Err(text)) => {
            eprintln!("error: {text}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
