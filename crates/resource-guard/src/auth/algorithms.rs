//! Binding of signature algorithms to JWK metadata.
//!
//! A token's `alg` header is untrusted. The algorithms a key may verify are
//! derived from the key itself:
//!
//! | `kty` | `crv`   | permitted                        |
//! |-------|---------|----------------------------------|
//! | RSA   |         | RS256/384/512, PS256/384/512     |
//! | EC    | P-256   | ES256                            |
//! | EC    | P-384   | ES384                            |
//! | OKP   | Ed25519 | EdDSA                            |
//!
//! A declared JWK `alg` narrows the set to that one algorithm and must be a
//! member of it. Symmetric (`oct`) keys, unknown key types, and keys whose
//! `use` is not `sig` permit nothing, so HMAC algorithms are never accepted.

use crate::auth::jwks::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey};
use std::str::FromStr;

const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Parse a header `alg` value. `none` and unknown names yield `None`.
#[must_use]
pub fn parse_algorithm(alg: &str) -> Option<Algorithm> {
    Algorithm::from_str(alg).ok()
}

/// Algorithms the key permits, derived from its metadata.
#[must_use]
pub fn allowed_algorithms(jwk: &Jwk) -> Vec<Algorithm> {
    if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
        return Vec::new();
    }

    let family: &[Algorithm] = match (jwk.kty.as_str(), jwk.crv.as_deref()) {
        ("RSA", _) => RSA_ALGORITHMS,
        ("EC", Some("P-256")) => &[Algorithm::ES256],
        ("EC", Some("P-384")) => &[Algorithm::ES384],
        ("OKP", Some("Ed25519")) => &[Algorithm::EdDSA],
        _ => &[],
    };

    match jwk.alg.as_deref() {
        None => family.to_vec(),
        Some(declared) => parse_algorithm(declared)
            .filter(|alg| family.contains(alg))
            .into_iter()
            .collect(),
    }
}

/// Build the verification key for `alg` from the JWK's public components.
///
/// Returns `None` if a component is missing or not valid base64url, or if
/// `alg` is not an asymmetric algorithm.
#[must_use]
pub fn decoding_key(jwk: &Jwk, alg: Algorithm) -> Option<DecodingKey> {
    match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => {
            let (n, e) = (jwk.n.as_deref()?, jwk.e.as_deref()?);
            DecodingKey::from_rsa_components(n, e).ok()
        }
        Algorithm::ES256 | Algorithm::ES384 => {
            let (x, y) = (jwk.x.as_deref()?, jwk.y.as_deref()?);
            DecodingKey::from_ec_components(x, y).ok()
        }
        Algorithm::EdDSA => DecodingKey::from_ed_components(jwk.x.as_deref()?).ok(),
        // HMAC
        _ => None,
    }
}
