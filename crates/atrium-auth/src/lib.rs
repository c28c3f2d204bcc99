// SPDX-License-Identifier: Apache-2.0
//! Session tokens and credential verification.
//!
//! The access gate trusts a signed, tamper-evident token envelope: claims
//! carry the caller's identity, active organization, role, and the full
//! effective permission set resolved at mint time. Role changes take effect
//! at the next mint — the hot path never re-reads the permissions table.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::AccessClaims;
pub use token::{random_opaque_token, TokenCodec, TokenError};
