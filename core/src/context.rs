//! Context: the three-field record carried across every RPC boundary
//! between a compensable caller and a compensable provider.
//!
//! Constructed at ROOT begin, deserialized at PROVIDER entry. Immutable
//! after construction except `status`, which only ever advances
//! TRYING -> CONFIRMING or TRYING -> CANCELLING.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The phase a transaction is currently driving towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxStatus {
    Trying = 1,
    Confirming = 2,
    Cancelling = 3,
}

impl TxStatus {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Trying),
            2 => Some(Self::Confirming),
            3 => Some(Self::Cancelling),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextCodecError {
    #[error("context wire payload must be exactly {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },
    #[error("unrecognized status byte: {0}")]
    BadStatus(u8),
}

/// Fixed wire width: 16-byte xid + 16-byte branch_id + 1-byte status.
pub const WIRE_LEN: usize = 33;

/// Carries a global transaction id, a branch id, and the in-flight phase
/// across a process boundary. Transports (HTTP header, RPC metadata,
/// message envelope) may wrap this further but MUST round-trip it
/// bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub xid: Uuid,
    pub branch_id: Uuid,
    pub status: TxStatus,
}

impl Context {
    pub fn new(xid: Uuid, branch_id: Uuid, status: TxStatus) -> Self {
        Self {
            xid,
            branch_id,
            status,
        }
    }

    pub fn to_bytes(&self) -> [u8; WIRE_LEN] {
        let mut buf = [0u8; WIRE_LEN];
        buf[0..16].copy_from_slice(self.xid.as_bytes());
        buf[16..32].copy_from_slice(self.branch_id.as_bytes());
        buf[32] = self.status as u8;
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContextCodecError> {
        if bytes.len() != WIRE_LEN {
            return Err(ContextCodecError::BadLength {
                expected: WIRE_LEN,
                actual: bytes.len(),
            });
        }
        let xid = Uuid::from_slice(&bytes[0..16]).expect("slice is exactly 16 bytes");
        let branch_id = Uuid::from_slice(&bytes[16..32]).expect("slice is exactly 16 bytes");
        let status =
            TxStatus::from_u8(bytes[32]).ok_or(ContextCodecError::BadStatus(bytes[32]))?;
        Ok(Self {
            xid,
            branch_id,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_bit_exact() {
        let ctx = Context::new(Uuid::new_v4(), Uuid::new_v4(), TxStatus::Confirming);
        let bytes = ctx.to_bytes();
        assert_eq!(bytes.len(), WIRE_LEN);
        assert_eq!(Context::from_bytes(&bytes).unwrap(), ctx);
    }

    #[test]
    fn serde_round_trip() {
        let ctx = Context::new(Uuid::new_v4(), Uuid::new_v4(), TxStatus::Cancelling);
        let json = serde_json::to_string(&ctx).unwrap();
        let back: Context = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, back);
    }

    #[test]
    fn rejects_bad_length() {
        let err = Context::from_bytes(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            ContextCodecError::BadLength {
                expected: WIRE_LEN,
                actual: 10
            }
        );
    }

    #[test]
    fn rejects_bad_status_byte() {
        let mut bytes = [0u8; WIRE_LEN];
        bytes[32] = 9;
        assert_eq!(
            Context::from_bytes(&bytes).unwrap_err(),
            ContextCodecError::BadStatus(9)
        );
    }
}
