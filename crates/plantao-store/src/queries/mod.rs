// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per logical store.

pub mod buffer;
pub mod idempotency;
pub mod locks;
pub mod pending;
pub mod sessions;
