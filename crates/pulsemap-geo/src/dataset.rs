//! Dataset rows and the in-memory prefix table.

use std::net::IpAddr;

use pulsemap_types::Attributes;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// One row of the enrichment dataset file.
///
/// The file is a JSON array of these rows. `network` is either a CIDR prefix
/// (`"81.2.69.0/24"`) or a bare address (treated as a host prefix). Missing
/// city/country labels fall back to `"Unknown"` when the table is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoEntry {
    /// CIDR prefix or bare address this row covers.
    pub network: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// City label. Optional in the file.
    #[serde(default)]
    pub city: Option<String>,
    /// Country label. Optional in the file.
    #[serde(default)]
    pub country: Option<String>,
}

/// A parsed network prefix: address bits plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Prefix {
    addr: IpAddr,
    len: u8,
}

impl Prefix {
    /// Parses `"addr/len"` or a bare address (full-length host prefix).
    pub(crate) fn parse(s: &str) -> Result<Self, GeoError> {
        let (addr_part, len_part) = match s.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| GeoError::InvalidPrefix(s.to_string()))?;
        let max_len: u8 = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let len = match len_part {
            Some(raw) => raw
                .parse::<u8>()
                .ok()
                .filter(|len| *len <= max_len)
                .ok_or_else(|| GeoError::InvalidPrefix(s.to_string()))?,
            None => max_len,
        };
        Ok(Self { addr, len })
    }

    pub(crate) fn len(&self) -> u8 {
        self.len
    }

    /// True when `ip` falls inside this prefix. Address families never match
    /// across each other.
    pub(crate) fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                if self.len == 0 {
                    return true;
                }
                let mask = u32::MAX << (32 - u32::from(self.len));
                (u32::from(net) & mask) == (u32::from(ip) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                if self.len == 0 {
                    return true;
                }
                let mask = u128::MAX << (128 - u32::from(self.len));
                (u128::from(net) & mask) == (u128::from(ip) & mask)
            }
            _ => false,
        }
    }
}

/// The loaded lookup table. Read-only after construction.
#[derive(Debug)]
pub(crate) struct GeoTable {
    entries: Vec<(Prefix, Attributes)>,
}

impl GeoTable {
    /// Builds the table from parsed dataset rows.
    ///
    /// Fails on the first invalid prefix so a broken dataset is rejected as
    /// a whole rather than silently half-loaded.
    pub(crate) fn from_rows(rows: Vec<GeoEntry>) -> Result<Self, GeoError> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let prefix = Prefix::parse(&row.network)?;
            let attributes = Attributes::Located {
                lat: row.lat,
                lon: row.lon,
                city: row
                    .city
                    .unwrap_or_else(|| Attributes::UNKNOWN_LABEL.to_string()),
                country: row
                    .country
                    .unwrap_or_else(|| Attributes::UNKNOWN_LABEL.to_string()),
            };
            entries.push((prefix, attributes));
        }
        Ok(Self { entries })
    }

    /// Longest-prefix match over the table.
    pub(crate) fn lookup(&self, ip: IpAddr) -> Option<&Attributes> {
        self.entries
            .iter()
            .filter(|(prefix, _)| prefix.contains(ip))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, attributes)| attributes)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
