//! Participant: a single party's confirm/cancel invocation descriptors
//! plus its per-branch identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (target, method, args) descriptor for one phase invocation. `args`
/// is a `serde_json::Value` so it can be captured by value and carried
/// through the Repository unchanged — the crate never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationDescriptor {
    pub target: String,
    pub method: String,
    pub args: serde_json::Value,
}

impl InvocationDescriptor {
    pub fn new(
        target: impl Into<String>,
        method: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    Enlisted,
    Invoked,
}

/// A pair of confirm/cancel invocations enlisted into a Transaction during
/// its TRY phase. Once enlisted, the invocations are immutable: a
/// Participant holds no back-pointer to its owning Transaction, keeping
/// Transaction -> Participant a strict tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub xid: Uuid,
    pub branch_id: Uuid,
    pub confirm_invocation: InvocationDescriptor,
    pub cancel_invocation: InvocationDescriptor,
    pub status: ParticipantStatus,
}

impl Participant {
    pub fn new(
        xid: Uuid,
        branch_id: Uuid,
        confirm_invocation: InvocationDescriptor,
        cancel_invocation: InvocationDescriptor,
    ) -> Self {
        Self {
            xid,
            branch_id,
            confirm_invocation,
            cancel_invocation,
            status: ParticipantStatus::Enlisted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_participant_is_enlisted() {
        let p = Participant::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            InvocationDescriptor::new("acct-svc", "confirmDebit", serde_json::json!({"amount": 50})),
            InvocationDescriptor::new("acct-svc", "cancelDebit", serde_json::json!({"amount": 50})),
        );
        assert_eq!(p.status, ParticipantStatus::Enlisted);
        assert_eq!(p.confirm_invocation.method, "confirmDebit");
    }
}
