//! Canonical binary codec and content hashing for orders.
//!
//! The relayed form of an order is an RLP list of 19 items: the fifteen
//! canonical fields (with two zero-filled 20-byte slots kept for layout
//! compatibility with the on-chain encoding), the signature, the pool tag,
//! and the two mutable fill-state words. 256-bit quantities are encoded as
//! 32-byte big-endian strings with leading zeros preserved, matching what
//! the exchange contract hashes.
//!
//! The content hash is the keccak-256 of the fixed-width concatenation of
//! the canonical fields, with the variable-length asset-data fields folded
//! in by their own keccak-256 hashes. The signature, the pool tag, and the
//! fill-state tail are excluded, so the hash survives re-pooling and
//! reprocessing.

use crate::objects::order::Order;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header};
use thiserror::Error;

/// Errors produced while decoding an order payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload is not a well-formed canonical order list.
    #[error("malformed binary order")]
    MalformedBinary,
    /// The payload is not a well-formed JSON order.
    #[error("malformed JSON order: {0}")]
    MalformedJson(String),
}

fn word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

fn unword(value: B256) -> U256 {
    U256::from_be_bytes(value.0)
}

impl Order {
    /// Encode the canonical binary form.
    pub fn to_bytes(&self) -> Bytes {
        let words = [
            word(self.maker_asset_amount),
            word(self.taker_asset_amount),
            word(self.maker_fee),
            word(self.taker_fee),
            word(self.expiration_timestamp_seconds),
            word(self.salt),
        ];
        let filled = word(self.taker_asset_amount_filled);
        let cancelled = word(self.taker_asset_amount_cancelled);

        let payload_length = self.maker_address.length()
            + self.taker_address.length()
            + self.fee_recipient_address.length()
            + self.sender_address.length()
            + self.maker_asset_data.length()
            + self.taker_asset_data.length()
            + Address::ZERO.length() * 2
            + self.exchange_address.length()
            + words.iter().map(Encodable::length).sum::<usize>()
            + self.signature.length()
            + self.pool_id.length()
            + filled.length()
            + cancelled.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.maker_address.encode(&mut out);
        self.taker_address.encode(&mut out);
        self.fee_recipient_address.encode(&mut out);
        self.sender_address.encode(&mut out);
        self.maker_asset_data.encode(&mut out);
        self.taker_asset_data.encode(&mut out);
        Address::ZERO.encode(&mut out);
        self.exchange_address.encode(&mut out);
        Address::ZERO.encode(&mut out);
        for w in &words {
            w.encode(&mut out);
        }
        self.signature.encode(&mut out);
        self.pool_id.encode(&mut out);
        filled.encode(&mut out);
        cancelled.encode(&mut out);
        out.into()
    }

    /// Decode the canonical binary form.
    ///
    /// Fails with [`CodecError::MalformedBinary`] on anything other than a
    /// single well-formed order list: wrong item count, wrong field widths,
    /// or trailing bytes.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, CodecError> {
        let mut rest = buf;
        let header = Header::decode(&mut rest).map_err(|_| CodecError::MalformedBinary)?;
        if !header.list || rest.len() != header.payload_length {
            return Err(CodecError::MalformedBinary);
        }
        let items = &mut rest;

        let maker_address = decode_item::<Address>(items)?;
        let taker_address = decode_item::<Address>(items)?;
        let fee_recipient_address = decode_item::<Address>(items)?;
        let sender_address = decode_item::<Address>(items)?;
        let maker_asset_data = decode_item::<Bytes>(items)?;
        let taker_asset_data = decode_item::<Bytes>(items)?;
        let _unused = decode_item::<Address>(items)?;
        let exchange_address = decode_item::<Address>(items)?;
        let _reserved = decode_item::<Address>(items)?;
        let maker_asset_amount = unword(decode_item::<B256>(items)?);
        let taker_asset_amount = unword(decode_item::<B256>(items)?);
        let maker_fee = unword(decode_item::<B256>(items)?);
        let taker_fee = unword(decode_item::<B256>(items)?);
        let expiration_timestamp_seconds = unword(decode_item::<B256>(items)?);
        let salt = unword(decode_item::<B256>(items)?);
        let signature = decode_item::<Bytes>(items)?;
        let pool_id = decode_item::<B256>(items)?;
        let taker_asset_amount_filled = unword(decode_item::<B256>(items)?);
        let taker_asset_amount_cancelled = unword(decode_item::<B256>(items)?);

        if !items.is_empty() {
            return Err(CodecError::MalformedBinary);
        }

        Ok(Self {
            maker_address,
            taker_address,
            fee_recipient_address,
            sender_address,
            maker_asset_data,
            taker_asset_data,
            exchange_address,
            maker_asset_amount,
            taker_asset_amount,
            maker_fee,
            taker_fee,
            expiration_timestamp_seconds,
            salt,
            signature,
            pool_id,
            taker_asset_amount_filled,
            taker_asset_amount_cancelled,
        })
    }

    /// Decode the public JSON form.
    pub fn from_json(buf: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(buf).map_err(|e| CodecError::MalformedJson(e.to_string()))
    }

    /// Encode the public JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(|e| CodecError::MalformedJson(e.to_string()))
    }

    /// Content hash: keccak-256 over the canonical fields.
    ///
    /// Excludes the signature, the pool tag, and the mutable fill-state
    /// tail. Equal hashes imply equal canonical fields.
    pub fn hash(&self) -> B256 {
        let mut preimage = Vec::with_capacity(356);
        preimage.extend_from_slice(self.exchange_address.as_slice());
        preimage.extend_from_slice(self.maker_address.as_slice());
        preimage.extend_from_slice(self.taker_address.as_slice());
        preimage.extend_from_slice(self.fee_recipient_address.as_slice());
        preimage.extend_from_slice(self.sender_address.as_slice());
        preimage.extend_from_slice(&self.maker_asset_amount.to_be_bytes::<32>());
        preimage.extend_from_slice(&self.taker_asset_amount.to_be_bytes::<32>());
        preimage.extend_from_slice(&self.maker_fee.to_be_bytes::<32>());
        preimage.extend_from_slice(&self.taker_fee.to_be_bytes::<32>());
        preimage.extend_from_slice(&self.expiration_timestamp_seconds.to_be_bytes::<32>());
        preimage.extend_from_slice(&self.salt.to_be_bytes::<32>());
        preimage.extend_from_slice(keccak256(&self.maker_asset_data).as_slice());
        preimage.extend_from_slice(keccak256(&self.taker_asset_data).as_slice());
        keccak256(&preimage)
    }
}

fn decode_item<T: Decodable>(buf: &mut &[u8]) -> Result<T, CodecError> {
    T::decode(buf).map_err(|_| CodecError::MalformedBinary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    fn sample_order() -> Order {
        Order {
            maker_address: address!("627306090abab3a6e1400e9345bc60c78a8bef57"),
            fee_recipient_address: address!("1dad4783cf3fe3085c1426157ab175a6119a04ba"),
            sender_address: address!("05d090b51c40b020eab3bfcb6a2dff130df22e9c"),
            maker_asset_data: bytes!(
                "f47261b00000000000000000000000001dad4783cf3fe3085c1426157ab175a6119a04ba"
            ),
            taker_asset_data: bytes!(
                "f47261b000000000000000000000000005d090b51c40b020eab3bfcb6a2dff130df22e9c"
            ),
            exchange_address: address!("90fe2af704b34e0224bf2299c838e04d4dcf1364"),
            maker_asset_amount: U256::from(50_000_000_000_000_000_000u128),
            taker_asset_amount: U256::from(1_000_000_000_000_000_000u128),
            expiration_timestamp_seconds: U256::from(5_797_808_836u64),
            salt: U256::from(1_759_938_172_362u64),
            signature: bytes!("1b0203"),
            ..Order::default()
        }
    }

    #[test]
    fn binary_round_trip() {
        let order = sample_order();
        let encoded = order.to_bytes();
        let decoded = Order::from_bytes(&encoded).unwrap();
        assert_eq!(decoded, order);
        assert_eq!(decoded.to_bytes(), encoded);
    }

    #[test]
    fn binary_round_trip_with_fill_state() {
        let mut order = sample_order();
        order.taker_asset_amount_filled = U256::from(7u64);
        order.taker_asset_amount_cancelled = U256::from(11u64);
        let decoded = Order::from_bytes(&order.to_bytes()).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn json_round_trip() {
        let order = sample_order();
        let decoded = Order::from_json(&order.to_json().unwrap()).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn hash_is_deterministic_across_encoding() {
        let order = sample_order();
        let reparsed = Order::from_bytes(&order.to_bytes()).unwrap();
        assert_eq!(order.hash(), reparsed.hash());
    }

    #[test]
    fn hash_ignores_signature_pool_and_fill_state() {
        let order = sample_order();
        let mut other = order.clone();
        other.signature = bytes!("deadbeef");
        other.pool_id = B256::repeat_byte(0x42);
        other.taker_asset_amount_filled = U256::from(3u64);
        other.taker_asset_amount_cancelled = U256::from(9u64);
        assert_eq!(order.hash(), other.hash());
    }

    #[test]
    fn hash_covers_canonical_fields() {
        let order = sample_order();
        let mut other = order.clone();
        other.salt = order.salt + U256::from(1u64);
        assert_ne!(order.hash(), other.hash());
    }

    #[test]
    fn rejects_truncated_payload() {
        let encoded = sample_order().to_bytes();
        let truncated = &encoded[..encoded.len() - 4];
        assert_eq!(
            Order::from_bytes(truncated),
            Err(CodecError::MalformedBinary)
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut encoded = sample_order().to_bytes().to_vec();
        encoded.push(0x00);
        assert_eq!(
            Order::from_bytes(&encoded),
            Err(CodecError::MalformedBinary)
        );
    }

    #[test]
    fn rejects_non_list_payload() {
        assert_eq!(
            Order::from_bytes(&[0x80; 16]),
            Err(CodecError::MalformedBinary)
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Order::from_json(b"bad json"),
            Err(CodecError::MalformedJson(_))
        ));
    }
}
