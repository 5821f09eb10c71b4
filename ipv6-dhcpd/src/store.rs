//! Pluggable leasequery store and the CSV-backed static assignment
//! source the `StaticAssign` handler reads from.
//!
//! The store contract doesn't mandate SQL; the built-in implementation
//! uses `rusqlite`, consistent with `dhcproto`'s own
//! preference for light, embeddable dependencies over a network database
//! client.

use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::path::Path;

use dhcproto::v6::Duid;
use rusqlite::{params, Connection};

use crate::error::StoreError;

/// One recorded binding, written in `post` for successful Replies and read
/// back by the leasequery handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseRecord {
    pub client_duid: Vec<u8>,
    pub link_address: Ipv6Addr,
    pub iaid: u32,
    pub assigned: AssignedResource,
    pub preferred_lifetime: u32,
    pub valid_lifetime: u32,
    pub last_client_txn_time: u32,
    pub remote_id: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedResource {
    Address(Ipv6Addr),
    Prefix(Ipv6Addr, u8),
}

/// A filter passed to [`LeaseStore::query`]; leasequery requests narrow by
/// client DUID or by link-address (RFC 5007 §3.1).
#[derive(Debug, Clone, Default)]
pub struct LeaseFilter {
    pub client_duid: Option<Vec<u8>>,
    pub link_address: Option<Ipv6Addr>,
}

/// The contract any leasequery backend must satisfy. Workers hold one
/// instance each, opened in `worker_init` after privilege drop -- the
/// store implementation owns its own concurrency.
pub trait LeaseStore: Send {
    fn record(&mut self, record: LeaseRecord) -> Result<(), StoreError>;
    fn query(&self, filter: &LeaseFilter) -> Result<Vec<LeaseRecord>, StoreError>;
}

/// SQLite-backed store, one connection per worker.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS leases (
                client_duid BLOB NOT NULL,
                link_address TEXT NOT NULL,
                iaid INTEGER NOT NULL,
                kind TEXT NOT NULL,
                address TEXT NOT NULL,
                prefix_len INTEGER,
                preferred_lifetime INTEGER NOT NULL,
                valid_lifetime INTEGER NOT NULL,
                last_client_txn_time INTEGER NOT NULL,
                remote_id BLOB,
                PRIMARY KEY (client_duid, iaid)
            );",
        )?;
        Ok(Self { conn })
    }
}

impl LeaseStore for SqliteStore {
    fn record(&mut self, record: LeaseRecord) -> Result<(), StoreError> {
        let (kind, address, prefix_len) = match record.assigned {
            AssignedResource::Address(addr) => ("addr", addr.to_string(), None),
            AssignedResource::Prefix(addr, len) => ("prefix", addr.to_string(), Some(len)),
        };
        self.conn.execute(
            "INSERT INTO leases (client_duid, link_address, iaid, kind, address, prefix_len,
                preferred_lifetime, valid_lifetime, last_client_txn_time, remote_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(client_duid, iaid) DO UPDATE SET
                link_address = excluded.link_address,
                kind = excluded.kind,
                address = excluded.address,
                prefix_len = excluded.prefix_len,
                preferred_lifetime = excluded.preferred_lifetime,
                valid_lifetime = excluded.valid_lifetime,
                last_client_txn_time = excluded.last_client_txn_time,
                remote_id = excluded.remote_id",
            params![
                record.client_duid,
                record.link_address.to_string(),
                record.iaid,
                kind,
                address,
                prefix_len,
                record.preferred_lifetime,
                record.valid_lifetime,
                record.last_client_txn_time,
                record.remote_id,
            ],
        )?;
        Ok(())
    }

    fn query(&self, filter: &LeaseFilter) -> Result<Vec<LeaseRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT client_duid, link_address, iaid, kind, address, prefix_len,
                    preferred_lifetime, valid_lifetime, last_client_txn_time, remote_id
             FROM leases
             WHERE (?1 IS NULL OR client_duid = ?1)
               AND (?2 IS NULL OR link_address = ?2)",
        )?;
        let rows = stmt.query_map(
            params![
                filter.client_duid,
                filter.link_address.map(|a| a.to_string())
            ],
            |row| {
                let kind: String = row.get(3)?;
                let address: String = row.get(4)?;
                let prefix_len: Option<u8> = row.get(5)?;
                let link_address: String = row.get(1)?;
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    link_address,
                    row.get::<_, u32>(2)?,
                    kind,
                    address,
                    prefix_len,
                    row.get::<_, u32>(6)?,
                    row.get::<_, u32>(7)?,
                    row.get::<_, u32>(8)?,
                    row.get::<_, Option<Vec<u8>>>(9)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for row in rows {
            let (duid, link, iaid, kind, address, prefix_len, pref, valid, txn, remote) = row?;
            let assigned = if kind == "prefix" {
                AssignedResource::Prefix(
                    address.parse().map_err(|_| {
                        StoreError::Io(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "stored prefix address is not valid ipv6",
                        ))
                    })?,
                    prefix_len.unwrap_or(64),
                )
            } else {
                AssignedResource::Address(address.parse().map_err(|_| {
                    StoreError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "stored address is not valid ipv6",
                    ))
                })?)
            };
            out.push(LeaseRecord {
                client_duid: duid,
                link_address: link.parse().unwrap_or(Ipv6Addr::UNSPECIFIED),
                iaid,
                assigned,
                preferred_lifetime: pref,
                valid_lifetime: valid,
                last_client_txn_time: txn,
                remote_id: remote,
            });
        }
        Ok(out)
    }
}

/// One row of the static-assignment CSV: `duid,address` or
/// `duid,prefix/len`, keyed by the client's hex-colon DUID.
#[derive(Debug, Clone)]
pub enum StaticEntry {
    Address(Ipv6Addr),
    Prefix(Ipv6Addr, u8),
}

#[derive(Debug, Clone, Default)]
pub struct StaticAssignments {
    by_duid: HashMap<Vec<u8>, StaticEntry>,
}

impl StaticAssignments {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        let mut by_duid = HashMap::new();
        for result in rdr.records() {
            let record = result?;
            if record.len() < 2 {
                continue;
            }
            let duid = parse_hex_duid(record.get(0).unwrap_or_default());
            let value = record.get(1).unwrap_or_default();
            let entry = if let Some((addr, len)) = value.split_once('/') {
                match (addr.parse(), len.parse()) {
                    (Ok(addr), Ok(len)) => StaticEntry::Prefix(addr, len),
                    _ => continue,
                }
            } else {
                match value.parse() {
                    Ok(addr) => StaticEntry::Address(addr),
                    Err(_) => continue,
                }
            };
            by_duid.insert(duid, entry);
        }
        Ok(Self { by_duid })
    }

    pub fn lookup(&self, duid: &Duid) -> Option<&StaticEntry> {
        self.by_duid.get(duid.as_ref())
    }
}

/// Parses a colon- or dash-separated hex octet string into raw bytes, used
/// for both the static-assignment CSV and a config's `server_duid` string.
pub(crate) fn parse_hex_duid(s: &str) -> Vec<u8> {
    s.split(|c| c == ':' || c == '-')
        .filter_map(|part| u8::from_str_radix(part, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_hex_duid_colon_separated() {
        let duid = parse_hex_duid("00:03:00:01:00:24:36:ef:1d:89");
        assert_eq!(duid, vec![0x00, 0x03, 0x00, 0x01, 0x00, 0x24, 0x36, 0xef, 0x1d, 0x89]);
    }

    #[test]
    fn loads_address_and_prefix_rows() -> anyhow::Result<()> {
        let mut f = tempfile::NamedTempFile::new()?;
        writeln!(f, "00:03:00:01:00:24:36:ef:1d:89,2001:db8::42")?;
        writeln!(f, "00:03:00:01:aa:bb:cc:dd:ee:ff,2001:db8:1::/64")?;
        let assignments = StaticAssignments::load(f.path())?;
        assert_eq!(assignments.by_duid.len(), 2);
        Ok(())
    }
}
