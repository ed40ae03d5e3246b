use crate::claims::Claims;

/// Identity asserted by a fully verified bearer credential
///
/// Only [`TokenVerifier`](crate::TokenVerifier) constructs this type, and only
/// after every check passed. Handlers receive it as an explicit value rather
/// than reading a "current user" from shared request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    subject: String,
    issuer: String,
    email: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    expires_at: Option<i64>,
}

impl VerifiedIdentity {
    pub(crate) fn from_claims(claims: Claims, issuer: String) -> Self {
        Self {
            subject: claims.subject,
            issuer,
            email: claims.email,
            name: claims.name,
            given_name: claims.given_name,
            family_name: claims.family_name,
            expires_at: claims.expiration,
        }
    }

    /// Subject identifier (sub)
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer that signed the credential (iss)
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn given_name(&self) -> Option<&str> {
        self.given_name.as_deref()
    }

    pub fn family_name(&self) -> Option<&str> {
        self.family_name.as_deref()
    }

    /// Best available display name: `name`, then given and family name, then email
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            (Some(given), None) => Some(given.clone()),
            (None, Some(family)) => Some(family.clone()),
            (None, None) => self.email.clone(),
        }
    }

    /// Expiry (exp) the credential carried, if any
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }
}
