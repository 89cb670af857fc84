// Copyright (c) 2018-2025 The Botho Foundation

//! Linkable ring signatures over task rings.
//!
//! A vehicle signs a report on behalf of the task's ring with its task key.
//! Verifiers learn that some ring member signed, plus a link tag that is
//! stable for that member within the task.

#![allow(non_snake_case)]
#![deny(unsafe_code)]

pub mod domain_separators;

mod ring;
mod ring_signature;
mod scheme;

pub use crate::{
    ring::{PublicKeyRing, RingId, RingRegistry},
    ring_signature::{Error, KeyImage, LinkTag, Lsag, Scalar},
    scheme::{LinkableRingScheme, LsagScheme, RingSignature, RingSignatureKind},
};
