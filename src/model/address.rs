//! Sender address normalization for `From` headers.

use crate::error::GmailCtrlError;

/// Grouping key used for every message whose sender could not be parsed.
///
/// Contains no `@`, so it can never collide with a real normalized address.
pub const UNKNOWN_SENDER: &str = "(unknown sender)";

/// A normalized sender: display name plus lower-cased address.
///
/// # Examples
/// - `"Juan García <Juan@Ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare, lower-cased email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Outcome of parsing a raw `From` header.
///
/// Parsing is total: anything without a usable address lands in `Fallback`
/// and keeps the raw text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderKey {
    /// An address-like token was found.
    Parsed(EmailAddress),
    /// No token containing `@` was found.
    Fallback { raw: String },
}

impl SenderKey {
    /// Parse a raw `From` header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        // "Display Name <address>" or "<address>"
        if let (Some(angle_start), Some(angle_end)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if angle_end > angle_start {
                let addr = trimmed[angle_start + 1..angle_end].trim();
                if is_address_like(addr) {
                    return Self::Parsed(EmailAddress {
                        display_name: strip_quotes(&trimmed[..angle_start]),
                        address: addr.to_lowercase(),
                    });
                }
            }
        }

        // Bare address, possibly with stray punctuation or text around it
        let token = trimmed
            .split_whitespace()
            .map(|t| t.trim_matches(is_wrapping_punctuation))
            .find(|t| is_address_like(t));

        match token {
            Some(addr) => Self::Parsed(EmailAddress {
                display_name: String::new(),
                address: addr.to_lowercase(),
            }),
            None => Self::Fallback {
                raw: trimmed.to_string(),
            },
        }
    }

    /// Grouping key: the normalized address, or [`UNKNOWN_SENDER`].
    pub fn key(&self) -> &str {
        match self {
            Self::Parsed(addr) => &addr.address,
            Self::Fallback { .. } => UNKNOWN_SENDER,
        }
    }

    /// Display name, empty for fallbacks.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Parsed(addr) => &addr.display_name,
            Self::Fallback { .. } => "",
        }
    }
}

/// Parse a `From` header, failing when no address-like token exists.
pub fn normalize_sender(raw: &str) -> Result<EmailAddress, GmailCtrlError> {
    match SenderKey::parse(raw) {
        SenderKey::Parsed(addr) => Ok(addr),
        SenderKey::Fallback { raw } => Err(GmailCtrlError::MalformedSender { raw }),
    }
}

fn is_wrapping_punctuation(c: char) -> bool {
    matches!(c, '<' | '>' | '"' | '\'' | ',' | ';' | '(' | ')')
}

fn is_address_like(s: &str) -> bool {
    match s.find('@') {
        Some(at) => at > 0 && at + 1 < s.len() && !s.contains(char::is_whitespace),
        None => false,
    }
}

/// Strip one pair of surrounding double or single quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    ['"', '\'']
        .iter()
        .find_map(|&q| trimmed.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}
