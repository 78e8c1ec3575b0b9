//! Collected infrastructure snapshots and their cross-reference resolution

mod crypto;
mod model;
mod resolve;

pub use crypto::{CryptoAssessment, SUPPORTED_PARAMS_URL, assess_tunnel};
pub use model::*;
pub use resolve::{
    DanglingReference, IpsecLinks, Resolution, ValidatedSnapshot, VolumeGroupLinks, resolve,
};
