//! Address and interface list parsing
//!
//! Lists arrive either as one `;`-delimited string (legacy) or as a list of
//! strings (modern). Address entries are resolved one by one; an entry that
//! does not resolve is logged and dropped without affecting its siblings.
//! Interface names are kept verbatim.

use std::net::{IpAddr, ToSocketAddrs};
use tracing::warn;

/// Separator of the legacy delimited form
pub const LIST_SEPARATOR: char = ';';

/// Resolves address text to an IP address
pub trait AddressResolver: Send + Sync {
    /// `None` if the text is neither a literal nor a locally resolvable name
    fn resolve(&self, text: &str) -> Option<IpAddr>;
}

/// Literal parse, then the local name-resolution mechanism
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl AddressResolver for SystemResolver {
    fn resolve(&self, text: &str) -> Option<IpAddr> {
        if let Some(addr) = LiteralResolver.resolve(text) {
            return Some(addr);
        }
        if text.is_empty() {
            return None;
        }
        // May block briefly on the system resolver; no retry
        (text, 0)
            .to_socket_addrs()
            .ok()?
            .next()
            .map(|socket_addr| socket_addr.ip())
    }
}

/// IP literals only, never consults a name service
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralResolver;

impl AddressResolver for LiteralResolver {
    fn resolve(&self, text: &str) -> Option<IpAddr> {
        let unbracketed = text
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(text);
        unbracketed.parse().ok()
    }
}

/// Entries that survived parsing, plus how many were dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedList<T> {
    pub entries: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for ParsedList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            dropped: 0,
        }
    }
}

impl<T> ParsedList<T> {
    /// Unwrap the surviving entries
    pub fn into_entries(self) -> Vec<T> {
        self.entries
    }

    /// Number of surviving entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry survived
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split the legacy delimited form, discarding empty segments
pub fn split_delimited(text: &str) -> Vec<String> {
    text.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve each entry independently; unresolvable entries are dropped
pub fn parse_addresses<I, S>(items: I, resolver: &dyn AddressResolver) -> ParsedList<IpAddr>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedList::default();
    for item in items {
        let text = item.as_ref();
        match resolver.resolve(text) {
            Some(addr) => parsed.entries.push(addr),
            None => {
                warn!(entry = %text, "Invalid address, will not use it as allowed/blocked");
                parsed.dropped += 1;
            }
        }
    }
    parsed
}

/// Interface names are not validated
pub fn parse_interfaces<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
