// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use rand::Rng;

use crate::engine::RegistrationError;
use crate::store::RegistrationStore;

pub const TEAM_CODE_LEN: usize = 6;

const TEAM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..TEAM_CODE_LEN)
        .map(|_| TEAM_CODE_ALPHABET[rng.gen_range(0..TEAM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Draw codes until one is unused. The unique constraint on
/// `teams.team_code` backstops the race between check and insert.
pub async fn generate_team_code<S: RegistrationStore>(
    store: &S,
) -> Result<String, RegistrationError> {
    loop {
        let code = random_code();
        if !store.team_code_exists(&code).await? {
            return Ok(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_uppercase_alphanumerics() {
        for _ in 0..64 {
            let code = random_code();
            assert_eq!(code.len(), TEAM_CODE_LEN);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }
}
