//! Network address type
//!
//! A [`NetworkAddress`] is whatever a lookup provider reported as the
//! caller's public address. The only guarantee is that it is non-empty;
//! providers are trusted to return IPv4 or IPv6 text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::{Error, Result};

/// Caller's public network address as reported by a lookup provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkAddress(String);

impl NetworkAddress {
    /// Create an address from provider output
    ///
    /// Surrounding whitespace is trimmed. Empty input is rejected with
    /// [`Error::InvalidInput`].
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("Network address cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The address text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The address parsed as an IP, if it is one
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NetworkAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for NetworkAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for NetworkAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NetworkAddress> for String {
    fn from(address: NetworkAddress) -> Self {
        address.0
    }
}

impl From<IpAddr> for NetworkAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}
