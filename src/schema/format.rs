//! String format sniffing
//!
//! Classifies a string example into one of the OpenAPI string formats. Detectors
//! run in a fixed order and the first match wins, so the same input always maps
//! to the same format even where the patterns overlap.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv6Addr;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap()
});

// scheme://authority[rest], the authority must not be empty
static URI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#@]+(@[^\s/?#]+)?([/?#]\S*)?$").unwrap()
});

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap()
});

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])T([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
    )
    .unwrap()
});

/// Value format tag attached to a primitive schema.
///
/// Everything except [`Format::Float`] is produced by [`sniff`]; `float` is the
/// tag given to non-integral numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Email,
    Uuid,
    Uri,
    Ipv4,
    Ipv6,
    Date,
    DateTime,
    Float,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Uuid => "uuid",
            Format::Uri => "uri",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Float => "float",
        }
    }

    /// Parse a format tag as found in an existing OpenAPI document.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "email" => Some(Format::Email),
            "uuid" => Some(Format::Uuid),
            "uri" => Some(Format::Uri),
            "ipv4" => Some(Format::Ipv4),
            "ipv6" => Some(Format::Ipv6),
            "date" => Some(Format::Date),
            "date-time" => Some(Format::DateTime),
            "float" => Some(Format::Float),
            _ => None,
        }
    }
}

/// Detect the format of a string example.
///
/// Priority order: email, uuid, uri, ipv4, ipv6, date, date-time. Returns `None`
/// for a plain string.
pub fn sniff(value: &str) -> Option<Format> {
    let len = value.len();
    if len == 0 {
        return None;
    }

    // Cheap byte checks gate every regex
    if len > 5 && value.contains('@') && is_email(value) {
        return Some(Format::Email);
    }

    if len == 36 && value.as_bytes()[8] == b'-' && is_uuid(value) {
        return Some(Format::Uuid);
    }

    if value.contains("://") && is_uri(value) {
        return Some(Format::Uri);
    }

    if len < 16 && value.contains('.') && is_ipv4(value) {
        return Some(Format::Ipv4);
    }

    if value.contains(':') && is_ipv6(value) {
        return Some(Format::Ipv6);
    }

    if len == 10 && is_iso_date(value) {
        return Some(Format::Date);
    }

    if len >= 19 && value.as_bytes()[10] == b'T' && is_iso_datetime(value) {
        return Some(Format::DateTime);
    }

    None
}

fn is_email(s: &str) -> bool {
    EMAIL_REGEX.is_match(s)
}

fn is_uuid(s: &str) -> bool {
    UUID_REGEX.is_match(s)
}

fn is_uri(s: &str) -> bool {
    URI_REGEX.is_match(s)
}

fn is_ipv4(s: &str) -> bool {
    if !IPV4_REGEX.is_match(s) {
        return false;
    }

    s.split('.').all(|part| part.parse::<u8>().is_ok())
}

fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

fn is_iso_date(s: &str) -> bool {
    ISO_DATE_REGEX.is_match(s)
}

fn is_iso_datetime(s: &str) -> bool {
    ISO_DATETIME_REGEX.is_match(s)
}
