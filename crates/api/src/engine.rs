// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The registration engine: every rule about who may enter which game,
//! alone or in a team, lives here. Handlers parse input and map errors;
//! adapters in [`crate::store`] persist rows. Each operation validates
//! fully before mutating, and every mutation is atomic in the adapter.

pub mod accounts;
pub mod certificates;
pub mod codes;
pub mod error;
pub mod registration;
pub mod roster;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::RegistrationError;
