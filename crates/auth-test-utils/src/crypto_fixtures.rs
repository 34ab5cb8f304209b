//! Cryptographic fixtures for signing test tokens
//!
//! Provides signing keys for every key family the resource guard verifies,
//! together with the matching public JWK:
//! - Ed25519: deterministic from a seed
//! - ECDSA P-256: freshly generated with ring
//! - RSA 2048: fixed PEM fixture (ring cannot generate RSA keys)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// RSA test private key (PKCS#1 PEM). Test use only.
pub const RSA_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/rsa_private.pem");

/// Public half of [`RSA_PRIVATE_KEY_PEM`] (SPKI PEM).
pub const RSA_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/rsa_public.pem");

/// Base64url modulus of the RSA fixture key.
pub const RSA_MODULUS_B64: &str = "ueZ4lXIAOKxZwetut0Ck6dtbbkNvrybRvqUFjyqYeZCbNLYUBW_jVeBI18t3mGN8jfqKkrZPdr8BB_Aedsxns9QkgsJOZy9YnL-hel6N1VPT4c_s509PXYyeHjj58RGYJySImrqC_G_H6si3QxZvr8hjR2RgzCovxPaXX2gXwwag4fSYxgBK-yCUHVwGCes4wG9iSMakLxIK13B8fr1Qf6l1UZDQYBBo5xexhlxPAh5TrgS2YSvLDxPgsM3Eecqavs9d106gIS8dOyf-0AJ-ZAjLHIRYlJ8EiFv25gVERz7kQF0ls34WbE6ML9NiSWXo7hnNC-q0VMWTblExU4Va5w";

/// Base64url public exponent of the RSA fixture key.
pub const RSA_EXPONENT_B64: &str = "AQAB";

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// Generate a deterministic Ed25519 keypair for testing.
///
/// The same seed always produces the same keypair.
///
/// # Returns
/// * `Ok((public_key_bytes, private_key_pkcs8))`
pub fn test_ed25519_keypair(seed: u8) -> Result<(Vec<u8>, Vec<u8>), FixtureError> {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[0] = seed;
    for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }

    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;

    Ok((
        key_pair.public_key().as_ref().to_vec(),
        build_pkcs8_from_seed(&seed_bytes),
    ))
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// ring does not expose PKCS#8 for a seeded Ed25519 key, so it is built here.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::with_capacity(48);

    // SEQUENCE (46 bytes)
    pkcs8.extend_from_slice(&[0x30, 0x2e]);
    // version INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    // AlgorithmIdentifier SEQUENCE { OID 1.3.101.112 }
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    // privateKey OCTET STRING { OCTET STRING seed }
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}

/// A signing key plus the public JWK a JWKS endpoint would publish for it.
///
/// # Example
/// ```rust,ignore
/// let key = TestSigningKey::rsa("rsa-key-01");
/// let jwks = serde_json::json!({ "keys": [key.jwk()] });
/// let token = key.sign(&TestTokenBuilder::new().build());
/// ```
#[derive(Clone)]
pub struct TestSigningKey {
    kid: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    jwk: serde_json::Value,
}

impl TestSigningKey {
    /// Deterministic Ed25519 key (`OKP`/`Ed25519`, `EdDSA`).
    pub fn ed25519(seed: u8, kid: &str) -> Self {
        let (public_key, pkcs8) =
            test_ed25519_keypair(seed).expect("Ed25519 fixture generation failed");

        Self {
            kid: kid.to_string(),
            algorithm: Algorithm::EdDSA,
            encoding_key: EncodingKey::from_ed_der(&pkcs8),
            jwk: json!({
                "kty": "OKP",
                "kid": kid,
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(public_key),
                "alg": "EdDSA",
                "use": "sig"
            }),
        }
    }

    /// Fresh ECDSA P-256 key (`EC`/`P-256`, `ES256`).
    pub fn ec_p256(kid: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("P-256 key generation failed");
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .expect("P-256 key parsing failed");

        // Uncompressed point: 0x04 || x (32 bytes) || y (32 bytes)
        let point = key_pair.public_key().as_ref();
        let x = point.get(1..33).expect("P-256 point x coordinate");
        let y = point.get(33..65).expect("P-256 point y coordinate");

        Self {
            kid: kid.to_string(),
            algorithm: Algorithm::ES256,
            encoding_key: EncodingKey::from_ec_der(pkcs8.as_ref()),
            jwk: json!({
                "kty": "EC",
                "kid": kid,
                "crv": "P-256",
                "x": URL_SAFE_NO_PAD.encode(x),
                "y": URL_SAFE_NO_PAD.encode(y),
                "alg": "ES256",
                "use": "sig"
            }),
        }
    }

    /// Fixed RSA 2048 key (`RSA`, `RS256`).
    pub fn rsa(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            algorithm: Algorithm::RS256,
            encoding_key: EncodingKey::from_rsa_pem(RSA_PRIVATE_KEY_PEM.as_bytes())
                .expect("RSA fixture PEM is valid"),
            jwk: json!({
                "kty": "RSA",
                "kid": kid,
                "n": RSA_MODULUS_B64,
                "e": RSA_EXPONENT_B64,
                "alg": "RS256",
                "use": "sig"
            }),
        }
    }

    /// Sign with a different algorithm of the same key family
    /// (e.g. `PS256` with the RSA key). The published JWK drops its `alg`
    /// so the key family decides what is permitted.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        if let Some(obj) = self.jwk.as_object_mut() {
            obj.remove("alg");
        }
        self
    }

    /// Key ID.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Algorithm used by [`TestSigningKey::sign`].
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public JWK for this key.
    pub fn jwk(&self) -> serde_json::Value {
        self.jwk.clone()
    }

    /// Sign claims with this key's algorithm and `kid`.
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());
        self.sign_with_header(&header, claims)
    }

    /// Sign claims with a caller-built header.
    pub fn sign_with_header<T: Serialize>(&self, header: &Header, claims: &T) -> String {
        encode(header, claims, &self.encoding_key).expect("Failed to sign test token")
    }
}

/// Sign claims with HMAC, using `secret` as the shared key.
///
/// For alg-confusion tests, where the "secret" is a public key the attacker
/// knows.
pub fn sign_hs256<T: Serialize>(kid: &str, secret: &[u8], claims: &T) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret)).expect("Failed to sign HS256 token")
}
