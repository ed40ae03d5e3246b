//! Trusted issuer patterns
//!
//! A deployment trusts a fixed set of identity provider URLs. Patterns are
//! either an exact issuer (`https://auth.example.com`) or contain a single `*`
//! standing for exactly one DNS label (`https://*.clerk.accounts.dev`), which
//! covers providers that issue one subdomain per tenant.

use crate::error::{Error, Result};
use std::str::FromStr;

/// Pattern an issuer URL must match to be trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuerPattern {
    /// The issuer must equal this value
    Exact(String),
    /// The issuer must be `prefix`, one DNS label, then `suffix`
    Wildcard { prefix: String, suffix: String },
}

impl IssuerPattern {
    /// Parse a pattern, allowing at most one `*` inside the host
    pub fn parse(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        let invalid = |reason: &str| {
            Error::ConfigurationInvalid(format!("issuer pattern '{pattern}': {reason}"))
        };

        let Some((scheme, rest)) = pattern.split_once("://") else {
            return Err(invalid("missing scheme"));
        };
        if scheme != "https" && scheme != "http" {
            return Err(invalid("scheme must be http or https"));
        }
        if rest.is_empty() {
            return Err(invalid("missing host"));
        }
        if pattern.ends_with('/') {
            return Err(invalid("must not end with '/'"));
        }

        match pattern.matches('*').count() {
            0 => Ok(IssuerPattern::Exact(pattern.to_string())),
            1 => {
                let host_end = rest.find('/').unwrap_or(rest.len());
                let host = &rest[..host_end];
                let Some(star) = host.find('*') else {
                    return Err(invalid("wildcard is only allowed in the host"));
                };
                // The wildcard must be a whole label followed by a fixed domain
                if star != 0 || !host[1..].starts_with('.') || host[2..].is_empty() {
                    return Err(invalid("wildcard must be the leftmost label, as in '*.example.com'"));
                }

                let (prefix, suffix) = pattern
                    .split_once('*')
                    .ok_or_else(|| invalid("wildcard missing"))?;
                Ok(IssuerPattern::Wildcard {
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                })
            }
            _ => Err(invalid("at most one wildcard is allowed")),
        }
    }

    /// Whether `issuer` matches this pattern
    pub fn matches(&self, issuer: &str) -> bool {
        match self {
            IssuerPattern::Exact(expected) => issuer == expected,
            IssuerPattern::Wildcard { prefix, suffix } => {
                let Some(label) = issuer
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(suffix.as_str()))
                else {
                    return false;
                };
                is_dns_label(label)
            }
        }
    }
}

impl FromStr for IssuerPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for IssuerPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssuerPattern::Exact(issuer) => f.write_str(issuer),
            IssuerPattern::Wildcard { prefix, suffix } => write!(f, "{prefix}*{suffix}"),
        }
    }
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let pattern = IssuerPattern::parse("https://auth.example.com").unwrap();
        assert_eq!(
            pattern,
            IssuerPattern::Exact("https://auth.example.com".into())
        );
        assert!(pattern.matches("https://auth.example.com"));
        assert!(!pattern.matches("https://auth.example.com.evil.io"));
        assert!(!pattern.matches("http://auth.example.com"));
    }

    #[test]
    fn test_wildcard() {
        let pattern: IssuerPattern = "https://*.clerk.accounts.dev".parse().unwrap();
        assert!(pattern.matches("https://happy-cat-12.clerk.accounts.dev"));
        assert!(pattern.matches("https://clerk.clerk.accounts.dev"));

        assert!(!pattern.matches("https://clerk.accounts.dev"));
        assert!(!pattern.matches("https://.clerk.accounts.dev"));
        assert!(!pattern.matches("https://a.b.clerk.accounts.dev"));
        assert!(!pattern.matches("https://evil.io/x.clerk.accounts.dev"));
        assert!(!pattern.matches("https://evil.io#.clerk.accounts.dev"));
        assert!(!pattern.matches("https://user@evil.clerk.accounts.dev"));
        assert!(!pattern.matches("https://-bad.clerk.accounts.dev"));
        assert_eq!(pattern.to_string(), "https://*.clerk.accounts.dev");
    }

    #[test]
    fn test_wildcard_with_path() {
        let pattern = IssuerPattern::parse("https://*.auth.example.com/realms/main").unwrap();
        assert!(pattern.matches("https://tenant.auth.example.com/realms/main"));
        assert!(!pattern.matches("https://tenant.auth.example.com/realms/other"));
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in [
            "",
            "auth.example.com",
            "ftp://auth.example.com",
            "https://",
            "https://auth.example.com/",
            "https://*.*.example.com",
            "https://auth.example.com/*",
            "https://a*.example.com",
            "https://*example.com",
            "https://*.",
        ] {
            assert!(
                matches!(
                    IssuerPattern::parse(pattern),
                    Err(Error::ConfigurationInvalid(_))
                ),
                "{pattern:?} should be rejected"
            );
        }
    }
}
