//! Verification code generation.
//!
//! Codes look like `PYR-4F1C-09AB`: the configured prefix followed by two
//! groups of four uppercase hex digits drawn from a v4 UUID. Uniqueness is
//! enforced by the issuer against the store, not by the generator.

use uuid::Uuid;

/// A caller-supplied code generator. Receives the configured prefix; its
/// output is normalized before use.
pub type CodeSource = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Generate a fresh random code under `prefix`.
pub fn random_code(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{}-{}-{}", prefix, &hex[..4], &hex[4..8])
}

/// Normalize user-typed codes: surrounding whitespace dropped, uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
