// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use uuid::Uuid;

use crate::db::models::{NewUser, User, UserRole};
use crate::engine::RegistrationError;
use crate::store::{RegistrationStore, StoreError, UserProfileChanges};

/// Self-service signup. The phone must be whitelisted and unused; the
/// password arrives here already hashed (argon2 at the API boundary).
pub struct Signup {
    pub phone: String,
    pub display_name: String,
    pub class_section: Option<String>,
    pub password_hash: String,
}

pub async fn sign_up<S: RegistrationStore>(
    store: &S,
    signup: Signup,
) -> Result<User, RegistrationError> {
    if !store.whitelist_contains(&signup.phone).await? {
        return Err(RegistrationError::PhoneNotWhitelisted);
    }
    if store.user_by_phone(&signup.phone).await?.is_some() {
        return Err(RegistrationError::DuplicatePhone);
    }
    let result = store
        .insert_user(NewUser {
            phone: signup.phone,
            display_name: signup.display_name,
            class_section: signup.class_section,
            password_hash: signup.password_hash,
            role: UserRole::Participant,
        })
        .await;
    match result {
        Ok(user) => Ok(user),
        // Unique-phone backstop for a signup racing this one.
        Err(StoreError::Conflict) => Err(RegistrationError::DuplicatePhone),
        Err(e) => Err(e.into()),
    }
}

/// Admin provisioning bypasses the whitelist and may grant any role.
pub async fn provision_user<S: RegistrationStore>(
    store: &S,
    new_user: NewUser,
) -> Result<User, RegistrationError> {
    match store.insert_user(new_user).await {
        Ok(user) => Ok(user),
        Err(StoreError::Conflict) => Err(RegistrationError::DuplicatePhone),
        Err(e) => Err(e.into()),
    }
}

/// Bulk whitelist import: phone numbers separated by commas or
/// newlines, trimmed, duplicates skipped. Returns how many entries
/// were actually new.
pub async fn whitelist_phones<S: RegistrationStore>(
    store: &S,
    raw: &str,
) -> Result<usize, RegistrationError> {
    let mut seen = std::collections::HashSet::new();
    let mut added = 0;
    for phone in raw.split([',', '\n']) {
        let phone = phone.trim();
        if phone.is_empty() || !seen.insert(phone) {
            continue;
        }
        if store.add_whitelist_phone(phone).await? {
            added += 1;
        }
    }
    Ok(added)
}

/// Admin edit of a participant's profile fields.
pub async fn update_profile<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
    changes: UserProfileChanges,
) -> Result<(), RegistrationError> {
    if !store.update_user_profile(user_id, changes).await? {
        return Err(RegistrationError::UserNotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::participant;
    use crate::store::MemStore;

    fn signup_for(phone: &str) -> Signup {
        Signup {
            phone: phone.to_string(),
            display_name: "Asha".to_string(),
            class_section: Some("10-A".to_string()),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_requires_whitelisted_phone() {
        let store = MemStore::new();
        let err = sign_up(&store, signup_for("9000000001")).await.unwrap_err();
        assert!(matches!(err, RegistrationError::PhoneNotWhitelisted));

        store.add_whitelist_phone("9000000001").await.unwrap();
        let user = sign_up(&store, signup_for("9000000001")).await.unwrap();
        assert_eq!(user.role, UserRole::Participant);
        assert!(user.game_id.is_none());
    }

    #[tokio::test]
    async fn signup_rejects_taken_phones() {
        let store = MemStore::new();
        store.add_whitelist_phone("9000000001").await.unwrap();
        sign_up(&store, signup_for("9000000001")).await.unwrap();

        let err = sign_up(&store, signup_for("9000000001")).await.unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicatePhone));
    }

    #[tokio::test]
    async fn bulk_whitelist_trims_dedupes_and_counts_new_entries() {
        let store = MemStore::new();
        store.add_whitelist_phone("9000000001").await.unwrap();

        let added = whitelist_phones(
            &store,
            "9000000001, 9000000002\n9000000002\n\n 9000000003 ,",
        )
        .await
        .unwrap();

        assert_eq!(added, 2);
        let listed = store.list_whitelist().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(store.whitelist_contains("9000000003").await.unwrap());
    }

    #[tokio::test]
    async fn profile_updates_leave_other_fields_alone() {
        let store = MemStore::new();
        let user = participant(&store, "9000000001", "Asha").await;

        update_profile(
            &store,
            user.id,
            UserProfileChanges {
                display_name: Some("Asha R".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.display_name, "Asha R");
        assert_eq!(updated.class_section.as_deref(), Some("10-A"));

        let err = update_profile(&store, uuid::Uuid::now_v7(), UserProfileChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UserNotFound));
    }
}
