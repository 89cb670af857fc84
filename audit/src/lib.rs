// Copyright (c) 2018-2025 The Botho Foundation

//! The audit authority: private record store and trapdoor access.
//!
//! Nothing in the report verification path depends on this crate.

mod error;
mod store;
mod trapdoor;

pub use crate::{
    error::AuditError,
    store::{AuditStore, InMemoryAuditStore},
    trapdoor::{AuditReport, AuditTrapdoor},
};
