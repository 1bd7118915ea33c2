use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

/// Opaque correlation token embedded in an outgoing message and echoed back
/// in its reply.
///
/// Only equality is meaningful. The value `0` is reserved for "no cookie"
/// and is never produced by [`CookieSource`](crate::cookie::CookieSource).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct Cookie(pub u64);

impl Cookie {
    /// The reserved "no cookie" value.
    pub const NONE: Cookie = Cookie(0);

    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Cookie {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Cookie> for u64 {
    fn from(cookie: Cookie) -> Self {
        cookie.0
    }
}

impl Display for Cookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl FromStr for Cookie {
    type Err = ParseIntError;

    /// Accepts `0x`-prefixed hexadecimal or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };
        Ok(Cookie(value))
    }
}

impl Serialize for Cookie {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Cookie {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Cookie)
    }
}

/// Strongly typed request identifier backed by ULID.
///
/// Attached to every inbound [`Request`](crate::server::Request) so that log
/// lines from the dispatcher and the matched handler can be correlated.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn from_ulid(id: ulid::Ulid) -> Self {
        Self(id)
    }

    /// Attempt to parse from a header string; if invalid, generate a new one.
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(RequestId(id))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_display_is_fixed_width_hex() {
        assert_eq!(Cookie(0x2a).to_string(), "0x000000000000002a");
        assert_eq!(Cookie(u64::MAX).to_string(), "0xffffffffffffffff");
    }

    #[test]
    fn test_cookie_from_str_accepts_hex_and_decimal() {
        assert_eq!("0x2a".parse::<Cookie>().unwrap(), Cookie(42));
        assert_eq!("0X2A".parse::<Cookie>().unwrap(), Cookie(42));
        assert_eq!("42".parse::<Cookie>().unwrap(), Cookie(42));
        assert!("forty-two".parse::<Cookie>().is_err());
    }

    #[test]
    fn test_cookie_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Cookie(7)).unwrap();
        assert_eq!(json, "7");
        let back: Cookie = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Cookie(7));
    }

    #[test]
    fn test_cookie_none_is_zero() {
        assert!(Cookie::NONE.is_none());
        assert!(!Cookie::new(1).is_none());
        assert_eq!(Cookie::default(), Cookie::NONE);
    }

    #[test]
    fn test_request_id_from_header_or_new() {
        let id = RequestId::new();
        let parsed = RequestId::from_header_or_new(Some(&id.to_string()));
        assert_eq!(parsed, id);

        let fresh = RequestId::from_header_or_new(Some("not-a-ulid"));
        assert_ne!(fresh, id);
    }
}
