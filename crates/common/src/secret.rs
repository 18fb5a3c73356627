//! Secret types for values that must never reach a log line.
//!
//! Re-exports [`secrecy`] so every crate in the workspace shares one secret
//! vocabulary. Participant auth tokens minted by the credential service are
//! carried as [`SecretString`]; any struct deriving `Debug` around one prints
//! a redacted placeholder instead of the token.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Grant {
//!     participant: String,
//!     auth_token: SecretString,
//! }
//!
//! let grant = Grant {
//!     participant: "viewer-1".to_string(),
//!     auth_token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! assert!(!format!("{grant:?}").contains("eyJhbGciOi"));
//! assert_eq!(grant.auth_token.expose_secret(), "eyJhbGciOi...");
//! ```
//!
//! Reading the value requires an explicit `expose_secret()` call, which keeps
//! every place a token leaves its wrapper easy to find.

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_auth_token_debug_is_redacted() {
        let token = SecretString::from("rtk-auth-token");
        let debug_str = format!("{token:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("rtk-auth-token"));
    }

    #[test]
    fn test_grant_payload_deserializes_into_secret() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Grant {
            id: String,
            auth_token: SecretString,
        }

        let json = r#"{"id": "p-1", "authToken": "token-value"}"#;
        let grant: Grant = serde_json::from_str(json).expect("deserialize");

        assert_eq!(grant.auth_token.expose_secret(), "token-value");
        assert!(!format!("{grant:?}").contains("token-value"));
    }
}
