//! Signature schemes for signed live-stream peak hashes.
//!
//! The live tree signs its peak hashes every N chunks so clients can verify
//! data they have not yet connected the whole hash path for back to a root
//! (see `swift-live-tree`). This crate only supplies the `Sign`/`Verify`
//! primitive behind that protocol; which bytes get signed and how often is
//! the live tree's business.
//!
//! Algorithm identifiers follow the DNSSEC algorithm numbers libswift reused
//! (<http://www.iana.org/assignments/dns-sec-alg-numbers>), since a live
//! swarm's id is an algorithm byte followed by its DNSSEC-encoded public key.

use rand_core::OsRng;
use signature::{Signer, Verifier};

/// A signature algorithm, identified the way libswift identifies it (DNSSEC
/// algorithm numbers), plus a zero-crypto `Dummy` scheme for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SignatureAlgorithm {
    /// RSASHA1.
    RsaSha1 = 5,
    /// ECDSAP256SHA256.
    EcdsaP256Sha256 = 13,
    /// ECDSAP384SHA384.
    EcdsaP384Sha384 = 14,
    /// No content-integrity protection: a fixed-length all-equal-bytes
    /// "signature", used only in tests.
    Dummy = 253,
}

impl SignatureAlgorithm {
    /// Decode the algorithm byte prefixing a swarm id.
    pub fn from_byte(b: u8) -> Option<SignatureAlgorithm> {
        match b {
            5 => Some(SignatureAlgorithm::RsaSha1),
            13 => Some(SignatureAlgorithm::EcdsaP256Sha256),
            14 => Some(SignatureAlgorithm::EcdsaP384Sha384),
            253 => Some(SignatureAlgorithm::Dummy),
            _ => None,
        }
    }
}

/// A signature over some signed peak hash bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Signature(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex encoding, for logging.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// Errors signing or verifying.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The underlying crypto backend rejected the key or signature.
    #[error("signature operation failed: {0}")]
    Backend(String),
}

/// A key pair (or, for a verifying-only client, just a public key) able to
/// sign and/or verify live peak hashes.
///
/// A live source holds a full `KeyPair` and signs; a live client typically
/// holds only a public key and only ever calls [`KeyPair::verify`] — callers
/// that construct a verify-only instance should panic or error from
/// `sign`, matching a client never being asked to sign.
pub trait KeyPair: Send + Sync {
    /// Which algorithm this key pair uses.
    fn algorithm(&self) -> SignatureAlgorithm;

    /// The DNSSEC-encoded public key bytes (no algorithm byte prefix).
    fn public_key_bytes(&self) -> Vec<u8>;

    /// Sign `data` with the private key.
    fn sign(&self, data: &[u8]) -> Result<Signature, SigningError>;

    /// Verify that `sig` is a valid signature over `data` for the public key.
    fn verify(&self, data: &[u8], sig: &Signature) -> bool;

    /// The swarm id for a live stream signed with this key: an algorithm
    /// byte followed by the public key bytes.
    fn swarm_id(&self) -> Vec<u8> {
        let mut id = vec![self.algorithm() as u8];
        id.extend(self.public_key_bytes());
        id
    }
}

/// Length, in bytes, of the dummy "public key" (repeated key byte).
pub const DUMMY_KEY_LEN: usize = 21;
/// Length, in bytes, of the dummy "signature".
pub const DUMMY_SIG_LEN: usize = 20;

/// The zero-crypto scheme used when content-integrity protection is
/// disabled: the private key is one random byte, the public key is that
/// byte repeated [`DUMMY_KEY_LEN`] times, and a "signature" is the private
/// key byte repeated [`DUMMY_SIG_LEN`] times. It authenticates nothing; it
/// exists so the rest of the live-tree protocol can run unconditionally in
/// tests without a real crypto backend.
pub struct DummyKeyPair {
    key_byte: u8,
}

impl DummyKeyPair {
    /// Generate a fresh dummy key.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut byte = [0u8; 1];
        OsRng.fill_bytes(&mut byte);
        DummyKeyPair { key_byte: byte[0] }
    }

    /// Reconstruct a verify-only dummy "key pair" from its public bytes.
    pub fn from_public_key_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != DUMMY_KEY_LEN || !bytes.iter().all(|&b| b == bytes[0]) {
            return None;
        }
        Some(DummyKeyPair {
            key_byte: bytes[0],
        })
    }
}

impl KeyPair for DummyKeyPair {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Dummy
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        vec![self.key_byte; DUMMY_KEY_LEN]
    }

    fn sign(&self, _data: &[u8]) -> Result<Signature, SigningError> {
        Ok(Signature(vec![self.key_byte; DUMMY_SIG_LEN]))
    }

    fn verify(&self, _data: &[u8], sig: &Signature) -> bool {
        sig.0.len() == DUMMY_SIG_LEN && sig.0.iter().all(|&b| b == self.key_byte)
    }
}

/// ECDSA over NIST P-256 with SHA-256, the default live-sig algorithm
/// (chosen upstream for its short swarm ids).
pub struct EcdsaP256KeyPair {
    signing_key: Option<p256::ecdsa::SigningKey>,
    verifying_key: p256::ecdsa::VerifyingKey,
}

impl EcdsaP256KeyPair {
    /// Generate a fresh signing key pair.
    pub fn generate() -> Self {
        let signing_key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let verifying_key = *signing_key.verifying_key();
        EcdsaP256KeyPair {
            signing_key: Some(signing_key),
            verifying_key,
        }
    }

    /// Reconstruct a verify-only key pair from its (SEC1-encoded) public
    /// key bytes.
    pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        Ok(EcdsaP256KeyPair {
            signing_key: None,
            verifying_key,
        })
    }
}

impl KeyPair for EcdsaP256KeyPair {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaP256Sha256
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(true).as_bytes().to_vec()
    }

    fn sign(&self, data: &[u8]) -> Result<Signature, SigningError> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| SigningError::Backend("no private key: verify-only key pair".into()))?;
        let sig: p256::ecdsa::Signature = signing_key.sign(data);
        Ok(Signature(sig.to_bytes().to_vec()))
    }

    fn verify(&self, data: &[u8], sig: &Signature) -> bool {
        let Ok(signature) = p256::ecdsa::Signature::from_slice(sig.as_bytes()) else {
            return false;
        };
        self.verifying_key.verify(data, &signature).is_ok()
    }
}

/// ECDSA over NIST P-384 with SHA-384.
pub struct EcdsaP384KeyPair {
    signing_key: Option<p384::ecdsa::SigningKey>,
    verifying_key: p384::ecdsa::VerifyingKey,
}

impl EcdsaP384KeyPair {
    /// Generate a fresh signing key pair.
    pub fn generate() -> Self {
        let signing_key = p384::ecdsa::SigningKey::random(&mut OsRng);
        let verifying_key = *signing_key.verifying_key();
        EcdsaP384KeyPair {
            signing_key: Some(signing_key),
            verifying_key,
        }
    }

    /// Reconstruct a verify-only key pair from its (SEC1-encoded) public
    /// key bytes.
    pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        Ok(EcdsaP384KeyPair {
            signing_key: None,
            verifying_key,
        })
    }
}

impl KeyPair for EcdsaP384KeyPair {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaP384Sha384
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(true).as_bytes().to_vec()
    }

    fn sign(&self, data: &[u8]) -> Result<Signature, SigningError> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| SigningError::Backend("no private key: verify-only key pair".into()))?;
        let sig: p384::ecdsa::Signature = signing_key.sign(data);
        Ok(Signature(sig.to_bytes().to_vec()))
    }

    fn verify(&self, data: &[u8], sig: &Signature) -> bool {
        let Ok(signature) = p384::ecdsa::Signature::from_slice(sig.as_bytes()) else {
            return false;
        };
        self.verifying_key.verify(data, &signature).is_ok()
    }
}

/// RSASHA1, kept for wire compatibility with older swarm ids; not
/// recommended for new swarms (see libswift's `DEFAULT_LIVE_SIG_ALG`, which
/// is already ECDSA P-256).
pub struct RsaKeyPair {
    private_key: Option<rsa::RsaPrivateKey>,
    public_key: rsa::RsaPublicKey,
}

impl RsaKeyPair {
    /// Generate a fresh key pair with the given modulus size in bits.
    pub fn generate(bits: usize) -> Result<Self, SigningError> {
        let private_key = rsa::RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        let public_key = private_key.to_public_key();
        Ok(RsaKeyPair {
            private_key: Some(private_key),
            public_key,
        })
    }

    /// Reconstruct a verify-only key pair from its DER-encoded public key.
    pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        use rsa::pkcs8::DecodePublicKey;
        let public_key = rsa::RsaPublicKey::from_public_key_der(bytes)
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        Ok(RsaKeyPair {
            private_key: None,
            public_key,
        })
    }
}

impl KeyPair for RsaKeyPair {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::RsaSha1
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        use rsa::pkcs8::EncodePublicKey;
        self.public_key
            .to_public_key_der()
            .expect("RSA public key always re-encodes")
            .into_vec()
    }

    fn sign(&self, data: &[u8]) -> Result<Signature, SigningError> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or_else(|| SigningError::Backend("no private key: verify-only key pair".into()))?;
        let digest = swift_hash::Hash::of_data(data);
        let scheme = rsa::Pkcs1v15Sign::new::<sha1::Sha1>();
        let sig = private_key
            .sign(scheme, digest.as_bytes())
            .map_err(|e| SigningError::Backend(e.to_string()))?;
        Ok(Signature(sig))
    }

    fn verify(&self, data: &[u8], sig: &Signature) -> bool {
        let digest = swift_hash::Hash::of_data(data);
        let scheme = rsa::Pkcs1v15Sign::new::<sha1::Sha1>();
        self.public_key
            .verify(scheme, digest.as_bytes(), sig.as_bytes())
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_sign_verify_roundtrip() {
        let kp = DummyKeyPair::generate();
        let sig = kp.sign(b"peak-hashes").unwrap();
        assert!(kp.verify(b"peak-hashes", &sig));
        assert!(kp.verify(b"different-data", &sig)); // dummy scheme authenticates nothing
    }

    #[test]
    fn dummy_reconstructed_from_public_key() {
        let kp = DummyKeyPair::generate();
        let pub_bytes = kp.public_key_bytes();
        let reconstructed = DummyKeyPair::from_public_key_bytes(&pub_bytes).unwrap();
        let sig = kp.sign(b"data").unwrap();
        assert!(reconstructed.verify(b"data", &sig));
    }

    #[test]
    fn ecdsa_p256_sign_verify_roundtrip() {
        let kp = EcdsaP256KeyPair::generate();
        let sig = kp.sign(b"peak-hashes").unwrap();
        assert!(kp.verify(b"peak-hashes", &sig));
        assert!(!kp.verify(b"tampered", &sig));
    }

    #[test]
    fn ecdsa_p256_verify_only_from_public_key() {
        let kp = EcdsaP256KeyPair::generate();
        let pub_bytes = kp.public_key_bytes();
        let verify_only = EcdsaP256KeyPair::from_public_key_bytes(&pub_bytes).unwrap();
        let sig = kp.sign(b"data").unwrap();
        assert!(verify_only.verify(b"data", &sig));
        assert!(verify_only.sign(b"data").is_err());
    }

    #[test]
    fn swarm_id_is_algorithm_byte_plus_public_key() {
        let kp = DummyKeyPair::generate();
        let id = kp.swarm_id();
        assert_eq!(id[0], SignatureAlgorithm::Dummy as u8);
        assert_eq!(&id[1..], kp.public_key_bytes().as_slice());
    }
}
