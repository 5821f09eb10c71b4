//! The control channel wire protocol: newline-terminated UTF-8 request
//! lines, answered with either a single
//! `OK <text>` / `ERR <text>` line or a multi-line block terminated by a
//! line containing a single `.`.
//!
//! This module only knows the protocol, not how to act on a command --
//! [`crate::master`] owns the `UnixListener` and the state (`Stats`,
//! reload/shutdown flags) a [`Command`] actually touches.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::error::ControlError;

/// One parsed request line: `help`, `shutdown`, `reload`, `stats`, or
/// `stats-json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Shutdown,
    Reload,
    Stats,
    StatsJson,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ControlError> {
        match line.trim() {
            "help" => Ok(Command::Help),
            "shutdown" => Ok(Command::Shutdown),
            "reload" => Ok(Command::Reload),
            "stats" => Ok(Command::Stats),
            "stats-json" => Ok(Command::StatsJson),
            other => Err(ControlError::UnknownCommand(other.to_string())),
        }
    }
}

/// A reply to one command. `Block` is the multi-line form, terminated by
/// a line containing a single `.`; every line in it is written verbatim,
/// so a caller constructing one must not emit a bare `.` line of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(String),
    Err(String),
    Block(Vec<String>),
}

impl Response {
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        match self {
            Response::Ok(text) => writeln!(w, "OK {text}"),
            Response::Err(text) => writeln!(w, "ERR {text}"),
            Response::Block(lines) => {
                for line in lines {
                    writeln!(w, "{line}")?;
                }
                writeln!(w, ".")
            }
        }
    }
}

pub const HELP_TEXT: &str = "commands: help shutdown reload stats stats-json";

/// Reads one response from a stream in the shape [`Response::write_to`]
/// produces: an `OK `/`ERR ` line is a single `Response`; any other first
/// line starts a block that continues until a bare `.` line. Used by
/// `ipv6-dhcpdctl`, which talks the same protocol without depending on
/// this crate (the protocol is simple enough to not be worth sharing a
/// dependency for).
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed before a complete response arrived")]
    Truncated,
}

pub fn read_response<R: BufRead>(mut r: R) -> Result<Response, ReadError> {
    let mut first = String::new();
    if r.read_line(&mut first)? == 0 {
        return Err(ReadError::Truncated);
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
            return Err(ReadError::Truncated);
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line == "." {
            return Ok(Response::Block(lines));
        }
        lines.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(Command::parse("stats\n").unwrap(), Command::Stats);
        assert_eq!(Command::parse("  reload  ").unwrap(), Command::Reload);
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(matches!(
            Command::parse("frobnicate"),
            Err(ControlError::UnknownCommand(_))
        ));
    }

    #[test]
    fn ok_response_round_trips() {
        let mut buf = Vec::new();
        Response::Ok("reloaded".into()).write_to(&mut buf).unwrap();
        let resp = read_response(io::BufReader::new(&buf[..])).unwrap();
        assert_eq!(resp, Response::Ok("reloaded".into()));
    }

    #[test]
    fn err_response_round_trips() {
        let mut buf = Vec::new();
        Response::Err("unknown command".into()).write_to(&mut buf).unwrap();
        let resp = read_response(io::BufReader::new(&buf[..])).unwrap();
        assert_eq!(resp, Response::Err("unknown command".into()));
    }

    #[test]
    fn block_response_round_trips() {
        let mut buf = Vec::new();
        let lines = vec!["received 10".to_string(), "responded 9".to_string()];
        Response::Block(lines.clone()).write_to(&mut buf).unwrap();
        let resp = read_response(io::BufReader::new(&buf[..])).unwrap();
        assert_eq!(resp, Response::Block(lines));
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let resp = read_response(io::BufReader::new(&b""[..]));
        assert!(matches!(resp, Err(ReadError::Truncated)));
    }
}
