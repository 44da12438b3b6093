//! The narrow boundary between the manager and whatever actually owns a
//! participant's compensable business method.
//!
//! Resolving an [`InvocationDescriptor`] to a live method call — local
//! dispatch table, RPC client, whatever the host wires up — is outside
//! this crate's scope; it only needs a place to call through. Grounded
//! on the teacher's `Synapse` trait: a minimal async boundary to an
//! external system that the core neither knows nor cares is local or
//! remote.

use async_trait::async_trait;

use tyloo_core::participant::InvocationDescriptor;

#[async_trait]
pub trait ParticipantInvoker: Send + Sync + 'static {
    /// Invoke the described confirm or cancel method. `Err` means the
    /// call did not succeed (the callee threw, the RPC failed, etc.);
    /// the phase executor maps that into a `Confirming`/`Cancelling`
    /// error and leaves the transaction record for recovery.
    async fn invoke(&self, descriptor: &InvocationDescriptor) -> Result<(), String>;
}
