// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits: the seams between the engine and its collaborators.

pub mod backend;
pub mod llm;
pub mod store;

pub use backend::ShiftBackend;
pub use llm::LlmGateway;
pub use store::{BufferOrder, SessionStore};
