// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod accounts;
pub mod admin;
pub mod certificates;
pub mod games;
pub mod sessions;
pub mod teams;
