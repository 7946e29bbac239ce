use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use zeroize::Zeroizing;

use crate::Error;

/// Ed25519 public key of a wallet
#[derive(Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Checks that `signature` is a valid signature of `message` for this key. Malformed keys
    /// and signatures are reported as invalid.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = <[u8; 64]>::try_from(signature) else {
            return false;
        };

        VerifyingKey::from_bytes(&self.0)
            .map(|key| key.verify(message, &Signature::from_bytes(&signature)).is_ok())
            .unwrap_or(false)
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.trim_start_matches("0x"))
            .ok()
            .and_then(|x| <[u8; 32]>::try_from(x).ok())
            .map(Self)
            .ok_or(Error::InvalidKey(format!("{} is not a 32 bytes hex public key", s)))
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// Ed25519 key pair. The secret seed is wiped from memory when the pair is dropped.
pub struct KeyPair {
    secret: Zeroizing<[u8; 32]>,
    public: PublicKey,
}

impl KeyPair {
    /// The pair takes ownership of the zeroizing seed
    pub fn from_seed(secret: Zeroizing<[u8; 32]>) -> Self {
        let public = PublicKey(SigningKey::from_bytes(&secret).verifying_key().to_bytes());

        Self { secret, public }
    }

    /// Builds the pair from a hex encoded 32 bytes seed
    pub fn from_hex(seed: &str) -> Result<Self, Error> {
        let bytes = Zeroizing::new(hex::decode(seed.trim_start_matches("0x")).map_err(|_| Error::InvalidKey("secret key is not hex encoded".to_string()))?);
        if bytes.len() != 32 {
            return Err(Error::InvalidKey(format!("secret key must be 32 bytes, got {}", bytes.len())));
        }

        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&bytes);

        Ok(Self::from_seed(seed))
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Signs `message`. The expanded signing key only lives for the duration of the call.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let signing_key = SigningKey::from_bytes(&self.secret);
        signing_key.sign(message).to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        self.public.verify(message, signature)
    }

    /// Consumes the pair, wiping the secret seed
    pub fn dispose(self) {
        drop(self)
    }
}

impl Debug for KeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}
