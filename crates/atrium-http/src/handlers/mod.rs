// SPDX-License-Identifier: Apache-2.0
//! Route handlers, grouped by surface.

pub mod audit;
pub mod auth;
pub mod editor;
pub mod media;
pub mod org;
pub mod venues;
