// Copyright (c) 2018-2025 The Botho Foundation

//! LSAG signatures with key images and link tags.

mod error;
mod key_image;
mod lsag;

pub use self::{
    error::Error,
    key_image::{KeyImage, LinkTag},
    lsag::Lsag,
};
pub use curve25519_dalek::scalar::Scalar;
