//! Method Context: resolves which role an intercepted call plays —
//! ROOT, PROVIDER, or NORMAL — from its propagation policy, whether a
//! transaction is already active on this call chain, and whether an
//! inbound `Context` arrived with the call.

use uuid::Uuid;

use crate::annotation::{Propagation, UniqueIdentitySource};

/// Namespace used to derive a stable root-transaction xid from a
/// business-supplied idempotence key, so the same key always maps to
/// the same `Uuid` across retries without a lookup table.
const UNIQUE_IDENTITY_NAMESPACE: Uuid = Uuid::from_bytes([
    0x7c, 0x1a, 0x8e, 0x41, 0x9b, 0x2d, 0x4f, 0x6a, 0x8b, 0x3e, 0x5d, 0x0c, 0x2a, 0x91, 0x6f, 0x44,
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRole {
    Root,
    Provider,
    Normal,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MethodContextError {
    #[error("no active transaction while propagation is MANDATORY")]
    MandatoryWithoutActiveTransaction,
}

/// Propagation x (active transaction?) x (inbound context?) -> role,
/// exactly as tabulated for the interceptor: REQUIRES_NEW always opens
/// its own root regardless of ambient state; REQUIRED and MANDATORY
/// differ only in how they react to having neither an active
/// transaction nor an inbound context.
pub fn resolve_role(
    propagation: Propagation,
    active_transaction: bool,
    inbound_context: bool,
) -> Result<MethodRole, MethodContextError> {
    use Propagation::*;

    match propagation {
        RequiresNew => Ok(MethodRole::Root),
        Required => match (active_transaction, inbound_context) {
            (true, _) => Ok(MethodRole::Normal),
            (false, true) => Ok(MethodRole::Provider),
            (false, false) => Ok(MethodRole::Root),
        },
        Mandatory => match (active_transaction, inbound_context) {
            (true, _) => Ok(MethodRole::Normal),
            (false, true) => Ok(MethodRole::Provider),
            (false, false) => Err(MethodContextError::MandatoryWithoutActiveTransaction),
        },
    }
}

/// Resolve the idempotence key for a root `begin`, deriving a stable
/// `Uuid` from whichever business key the annotation designates.
/// `first_argument`/`named_fields` stand in for whatever argument
/// inspection a real call-site binding would perform.
pub fn resolve_unique_identity(
    source: Option<&UniqueIdentitySource>,
    first_argument: Option<&serde_json::Value>,
    named_fields: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Option<Uuid> {
    let key = match source? {
        UniqueIdentitySource::FirstArgument => first_argument?.to_string(),
        UniqueIdentitySource::NamedField(name) => named_fields?.get(name)?.to_string(),
    };
    Some(Uuid::new_v5(&UNIQUE_IDENTITY_NAMESPACE, key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_with_no_context_and_no_active_tx_is_root() {
        assert_eq!(
            resolve_role(Propagation::Required, false, false).unwrap(),
            MethodRole::Root
        );
    }

    #[test]
    fn required_with_inbound_context_is_provider() {
        assert_eq!(
            resolve_role(Propagation::Required, false, true).unwrap(),
            MethodRole::Provider
        );
    }

    #[test]
    fn required_with_active_tx_is_normal_regardless_of_context() {
        assert_eq!(
            resolve_role(Propagation::Required, true, false).unwrap(),
            MethodRole::Normal
        );
        assert_eq!(
            resolve_role(Propagation::Required, true, true).unwrap(),
            MethodRole::Normal
        );
    }

    #[test]
    fn requires_new_is_always_root() {
        assert_eq!(
            resolve_role(Propagation::RequiresNew, true, true).unwrap(),
            MethodRole::Root
        );
        assert_eq!(
            resolve_role(Propagation::RequiresNew, false, false).unwrap(),
            MethodRole::Root
        );
    }

    #[test]
    fn mandatory_without_anything_active_is_an_error() {
        assert_eq!(
            resolve_role(Propagation::Mandatory, false, false).unwrap_err(),
            MethodContextError::MandatoryWithoutActiveTransaction
        );
    }

    #[test]
    fn mandatory_with_inbound_context_is_provider() {
        assert_eq!(
            resolve_role(Propagation::Mandatory, false, true).unwrap(),
            MethodRole::Provider
        );
    }

    #[test]
    fn unique_identity_is_stable_across_calls_with_the_same_key() {
        let source = UniqueIdentitySource::NamedField("orderId".into());
        let mut fields = serde_json::Map::new();
        fields.insert("orderId".into(), serde_json::json!("order-42"));

        let first = resolve_unique_identity(Some(&source), None, Some(&fields));
        let second = resolve_unique_identity(Some(&source), None, Some(&fields));
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn unique_identity_is_none_without_a_configured_source() {
        assert_eq!(resolve_unique_identity(None, None, None), None);
    }
}
