// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

use crate::store::StoreError;

/// Everything the registration engine can refuse to do. All variants are
/// user-facing and recoverable; the messages double as display text at
/// the API boundary.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("already registered for a game")]
    AlreadyRegistered,
    #[error("this game does not accept that kind of registration")]
    InvalidGameType,
    #[error("no slots available")]
    NoSlotsAvailable,
    #[error("no team matches this code")]
    TeamNotFound,
    #[error("this team is full")]
    TeamFull,
    #[error("user not found")]
    UserNotFound,
    #[error("this phone is already registered")]
    DuplicatePhone,
    #[error("phone number is not whitelisted")]
    PhoneNotWhitelisted,
    #[error("game not found")]
    GameNotFound,
    #[error("certificates are not available yet")]
    CertificatesDisabled,
    #[error("not registered for any game")]
    NotRegistered,
    #[error(transparent)]
    Store(#[from] StoreError),
}
