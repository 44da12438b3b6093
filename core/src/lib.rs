//! # tyloo-core
//!
//! Data model and persistence contract for a Try-Confirm-Cancel
//! distributed transaction coordinator: `Context` (the wire record),
//! `Participant` (one party's confirm/cancel descriptors), `Transaction`
//! (the aggregate root), and the `Repository` trait every storage
//! backend implements.
//!
//! This crate is protocol- and storage-agnostic: it has no opinion on how
//! a `Context` crosses the wire or where a `Transaction` is persisted —
//! see `tyloo-interceptor` and `tyloo-store` for those.

pub mod context;
pub mod error;
pub mod participant;
pub mod repository;
pub mod transaction;

pub mod prelude {
    pub use crate::context::{Context, ContextCodecError, TxStatus};
    pub use crate::error::{RepositoryError, TylooError};
    pub use crate::participant::{InvocationDescriptor, Participant, ParticipantStatus};
    pub use crate::repository::Repository;
    pub use crate::transaction::{Transaction, TransactionType};
}
