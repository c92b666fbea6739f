//! Multi-value response header mapping and the line-by-line capture protocol.
//!
//! # Design
//! Transports hand over raw header lines one at a time, usually before the
//! body has arrived. `capture_line` parses one line into the mapping and
//! returns the number of bytes it was given, which is what libcurl's header
//! callback must return for the transfer to continue. Lines that are not
//! `name: value` pairs (status lines, the blank terminator, garbage) are
//! skipped but still acknowledged.

use std::collections::HashMap;

/// Response headers keyed by lowercased name.
///
/// Each name maps to its values in arrival order, because HTTP allows a header
/// to repeat (`Set-Cookie` being the usual case).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: HashMap<String, Vec<String>>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw header line and return its length in bytes.
    pub fn capture_line(&mut self, line: &[u8]) -> usize {
        let text = String::from_utf8_lossy(line);
        match text.split_once(':') {
            Some((name, value)) => self.append(name, value),
            None => {
                if !text.trim().is_empty() {
                    tracing::trace!(line = %text.trim_end(), "ignoring header line without a colon");
                }
            }
        }
        line.len()
    }

    /// Append `value` under `name`, normalizing both.
    pub fn append(&mut self, name: &str, value: &str) {
        let name = name.trim().to_lowercase();
        let value = value.trim().to_string();
        self.entries.entry(name).or_default().push(value);
    }

    /// First value received for `name`.
    ///
    /// The mapping holds every header line the transport saw during the call,
    /// NTLM challenges and redirect hops included, so the first value may
    /// belong to an intermediate response. Use `last` for the value the final
    /// response sent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Last value received for `name`; for a header every response sends,
    /// this is the final response's value.
    pub fn last(&self, name: &str) -> Option<&str> {
        self.get_all(name).last().map(String::as_str)
    }

    /// Every value received for `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn into_map(self) -> HashMap<String, Vec<String>> {
        self.entries
    }
}
