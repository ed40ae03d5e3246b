use miniserde::Deserialize;

/// Credential header
///
/// Names the signing algorithm and the key used to sign.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    /// Algorithm used for signing
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Key ID (for key set lookup)
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    /// Media type, usually "JWT"
    #[serde(rename = "typ")]
    pub token_type: Option<String>,
}
