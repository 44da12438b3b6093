//! Transaction: the aggregate root driven through TRYING -> CONFIRMING|CANCELLING.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::TxStatus;
use crate::participant::Participant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Root,
    Branch,
}

/// Identity, status, participant list and timestamps for one logical
/// transaction (root or branch). `version` is bumped by the `Repository`
/// on every successful `update` — callers never set it directly, they
/// only ever read it back from what the repository returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub xid: Uuid,
    pub branch_id: Option<Uuid>,
    pub kind: TransactionType,
    pub status: TxStatus,
    pub retried_count: u32,
    pub create_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    pub version: u64,
    /// Insertion order == enlistment order == invocation order during
    /// commit.
    pub participants: Vec<Participant>,
    pub attachments: HashMap<String, serde_json::Value>,
}

impl Transaction {
    pub fn new_root(xid: Uuid) -> Self {
        Self::new(xid, None, TransactionType::Root)
    }

    pub fn new_branch(xid: Uuid, branch_id: Uuid) -> Self {
        Self::new(xid, Some(branch_id), TransactionType::Branch)
    }

    fn new(xid: Uuid, branch_id: Option<Uuid>, kind: TransactionType) -> Self {
        let now = Utc::now();
        Self {
            xid,
            branch_id,
            kind,
            status: TxStatus::Trying,
            retried_count: 0,
            create_time: now,
            last_update_time: now,
            version: 1,
            participants: Vec::new(),
            attachments: HashMap::new(),
        }
    }

    pub fn enlist(&mut self, participant: Participant) {
        self.participants.push(participant);
        self.touch();
    }

    pub fn set_status(&mut self, status: TxStatus) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_update_time = Utc::now();
    }

    /// Age of the record since its last update, used by recovery to decide
    /// whether a TRYING transaction should be treated as abandoned.
    pub fn age_since_update(&self) -> chrono::Duration {
        Utc::now() - self.last_update_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::InvocationDescriptor;

    #[test]
    fn new_root_starts_trying_at_version_one() {
        let tx = Transaction::new_root(Uuid::new_v4());
        assert_eq!(tx.kind, TransactionType::Root);
        assert_eq!(tx.status, TxStatus::Trying);
        assert_eq!(tx.version, 1);
        assert!(tx.participants.is_empty());
        assert!(tx.branch_id.is_none());
    }

    #[test]
    fn new_branch_carries_branch_id() {
        let xid = Uuid::new_v4();
        let branch_id = Uuid::new_v4();
        let tx = Transaction::new_branch(xid, branch_id);
        assert_eq!(tx.kind, TransactionType::Branch);
        assert_eq!(tx.branch_id, Some(branch_id));
        assert_eq!(tx.xid, xid);
    }

    #[test]
    fn enlist_preserves_insertion_order() {
        let xid = Uuid::new_v4();
        let branch_id = Uuid::new_v4();
        let mut tx = Transaction::new_root(xid);
        for i in 0..3 {
            tx.enlist(Participant::new(
                xid,
                branch_id,
                InvocationDescriptor::new("svc", format!("confirm{i}"), serde_json::Value::Null),
                InvocationDescriptor::new("svc", format!("cancel{i}"), serde_json::Value::Null),
            ));
        }
        let methods: Vec<_> = tx
            .participants
            .iter()
            .map(|p| p.confirm_invocation.method.clone())
            .collect();
        assert_eq!(methods, vec!["confirm0", "confirm1", "confirm2"]);
    }
}
