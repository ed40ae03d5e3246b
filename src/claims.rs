//! Credential claims
//!
//! Only the claims the verifier and [`VerifiedIdentity`](crate::VerifiedIdentity)
//! need are decoded; unknown claims are ignored.

use crate::error::{Error, Result};
use crate::limits::MAX_CLAIM_STRING_LENGTH;
use miniserde::Deserialize;

/// Claims carried by a bearer credential
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject (sub) - the user the credential was issued to
    #[serde(rename = "sub")]
    pub subject: String,

    /// Issuer (iss) - URL of the identity provider
    #[serde(rename = "iss")]
    pub issuer: Option<String>,

    /// Expiration Time (exp) - seconds since Unix epoch
    #[serde(rename = "exp")]
    pub expiration: Option<i64>,

    /// Issued At (iat) - seconds since Unix epoch
    #[serde(rename = "iat")]
    pub issued_at: Option<i64>,

    /// Authorized party (azp) - the client the credential was issued for
    #[serde(rename = "azp")]
    pub authorized_party: Option<String>,

    pub email: Option<String>,

    pub name: Option<String>,

    pub given_name: Option<String>,

    pub family_name: Option<String>,
}

impl Claims {
    /// Bound claim string lengths
    pub(crate) fn validate_string_lengths(&self) -> Result<()> {
        validate_claim_string("sub", Some(&self.subject))?;
        validate_claim_string("iss", self.issuer.as_deref())?;
        validate_claim_string("azp", self.authorized_party.as_deref())?;
        validate_claim_string("email", self.email.as_deref())?;
        validate_claim_string("name", self.name.as_deref())?;
        validate_claim_string("given_name", self.given_name.as_deref())?;
        validate_claim_string("family_name", self.family_name.as_deref())?;
        Ok(())
    }
}

fn validate_claim_string(claim: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) if value.len() > MAX_CLAIM_STRING_LENGTH => {
            Err(Error::MalformedCredential(format!(
                "claim '{claim}' too long: {} bytes (maximum: {MAX_CLAIM_STRING_LENGTH} bytes)",
                value.len()
            )))
        }
        _ => Ok(()),
    }
}
