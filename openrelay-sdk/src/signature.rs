//! Order signature parsing and maker recovery.
//!
//! Orders carry a packed signature of the form:
//!
//! ```text
//! v (1 byte) || r (32 bytes) || s (32 bytes) || type (1 byte)
//! ```
//!
//! Two signing schemes are accepted:
//!
//! * **EIP-712** (type `0x02`): the signature is over the order's content
//!   hash directly.
//! * **EthSign** (type `0x03`): the signature is over the EIP-191
//!   `"\x19Ethereum Signed Message:\n32"`-prefixed content hash, as
//!   produced by wallet `eth_sign` calls.
//!
//! Recovery yields the signing address; admission requires it to equal the
//! order's maker.

use crate::objects::order::Order;
use alloy_primitives::{eip191_hash_message, Address, Signature, B256, U256};
use thiserror::Error;

/// Packed signature length: v + r + s + type.
pub const SIGNATURE_LENGTH: usize = 66;

/// Signature scheme tag, the trailing byte of the packed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    Eip712,
    EthSign,
}

impl SignatureType {
    /// The wire value of this scheme tag.
    pub fn as_byte(self) -> u8 {
        match self {
            SignatureType::Eip712 => 0x02,
            SignatureType::EthSign => 0x03,
        }
    }
}

/// Errors produced by signature parsing and recovery.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature must be {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("unsupported signature type: {0:#04x}")]
    UnsupportedType(u8),
    #[error("invalid recovery byte: {0:#04x}")]
    InvalidRecovery(u8),
    #[error("recovery failed: {0}")]
    Recovery(#[from] alloy_primitives::SignatureError),
}

/// A parsed order signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub sig_type: SignatureType,
}

impl OrderSignature {
    /// Parse the packed wire form.
    pub fn parse(raw: &[u8]) -> Result<Self, SignatureError> {
        if raw.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(raw.len()));
        }
        let sig_type = match raw[65] {
            0x02 => SignatureType::Eip712,
            0x03 => SignatureType::EthSign,
            other => return Err(SignatureError::UnsupportedType(other)),
        };
        Ok(Self {
            v: raw[0],
            r: B256::from_slice(&raw[1..33]),
            s: B256::from_slice(&raw[33..65]),
            sig_type,
        })
    }

    /// Re-pack into the wire form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[0] = self.v;
        out[1..33].copy_from_slice(self.r.as_slice());
        out[33..65].copy_from_slice(self.s.as_slice());
        out[65] = self.sig_type.as_byte();
        out
    }

    /// Recover the signing address for the given content hash.
    pub fn recover(&self, order_hash: B256) -> Result<Address, SignatureError> {
        let parity = match self.v {
            27 => false,
            28 => true,
            other => return Err(SignatureError::InvalidRecovery(other)),
        };
        let prehash = match self.sig_type {
            SignatureType::Eip712 => order_hash,
            SignatureType::EthSign => eip191_hash_message(order_hash),
        };
        let signature = Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            parity,
        );
        Ok(signature.recover_address_from_prehash(&prehash)?)
    }
}

/// Recover the address that signed an order.
pub fn recover_signer(order: &Order) -> Result<Address, SignatureError> {
    OrderSignature::parse(&order.signature)?.recover(order.hash())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use k256::ecdsa::SigningKey;

    fn test_key() -> (SigningKey, Address) {
        let key = SigningKey::from_slice(&[0x11; 32]).unwrap();
        let point = key.verifying_key().to_encoded_point(false);
        let address = Address::from_slice(&keccak256(&point.as_bytes()[1..])[12..]);
        (key, address)
    }

    fn sign(key: &SigningKey, prehash: B256, sig_type: SignatureType) -> OrderSignature {
        let (sig, recid) = key.sign_prehash_recoverable(prehash.as_slice()).unwrap();
        let bytes = sig.to_bytes();
        OrderSignature {
            v: 27 + recid.to_byte(),
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..]),
            sig_type,
        }
    }

    #[test]
    fn recovers_eip712_signer() {
        let (key, address) = test_key();
        let hash = keccak256(b"order");
        let sig = sign(&key, hash, SignatureType::Eip712);
        assert_eq!(sig.recover(hash).unwrap(), address);
    }

    #[test]
    fn recovers_ethsign_signer() {
        let (key, address) = test_key();
        let hash = keccak256(b"order");
        let sig = sign(&key, eip191_hash_message(hash), SignatureType::EthSign);
        assert_eq!(sig.recover(hash).unwrap(), address);
    }

    #[test]
    fn tampered_signature_does_not_recover_signer() {
        let (key, address) = test_key();
        let hash = keccak256(b"order");
        let mut sig = sign(&key, hash, SignatureType::Eip712);
        let mut r = sig.r.0;
        r[31] ^= 0x01;
        sig.r = B256::from(r);
        assert!(sig.recover(hash).map(|a| a != address).unwrap_or(true));
    }

    #[test]
    fn parse_round_trip() {
        let (key, _) = test_key();
        let sig = sign(&key, keccak256(b"order"), SignatureType::EthSign);
        assert_eq!(OrderSignature::parse(&sig.to_bytes()).unwrap(), sig);
    }

    #[test]
    fn rejects_bad_length_and_type() {
        assert!(matches!(
            OrderSignature::parse(&[0u8; 65]),
            Err(SignatureError::InvalidLength(65))
        ));
        let mut raw = [0u8; SIGNATURE_LENGTH];
        raw[65] = 0x07;
        assert!(matches!(
            OrderSignature::parse(&raw),
            Err(SignatureError::UnsupportedType(0x07))
        ));
    }
}
