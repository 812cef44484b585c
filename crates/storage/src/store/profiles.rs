#![forbid(unsafe_code)]

use super::entity::Tx;
use super::error::{RecordKind, StoreError};
use super::SqliteStore;
use folio_core::ids::ProfileId;
use folio_core::{ConnectionProfile, NewProfile, ProfilePatch, Validate};
use rusqlite::{OptionalExtension, params};

// `is_default` is written only by the statements in this module.

fn current_default_tx(tx: &Tx<'_>) -> Result<Option<ProfileId>, StoreError> {
    Ok(tx
        .conn()
        .query_row(
            "SELECT id FROM profiles WHERE is_default = 1 LIMIT 1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .map(ProfileId::new))
}

fn claim_default_tx(tx: &Tx<'_>, id: ProfileId) -> Result<ConnectionProfile, StoreError> {
    let target = tx.get::<ConnectionProfile>(id)?;
    if target.is_default {
        return Ok(target);
    }
    let cleared = tx.conn().execute(
        "UPDATE profiles SET is_default = 0, updated_at_ms = ?1 WHERE is_default = 1 AND id <> ?2",
        params![tx.now_ms(), id.get()],
    )?;
    tx.conn().execute(
        "UPDATE profiles SET is_default = 1, updated_at_ms = ?1 WHERE id = ?2",
        params![tx.now_ms(), id.get()],
    )?;
    log::debug!("profile {id} is now the default (cleared {cleared})");
    tx.get::<ConnectionProfile>(id)
}

fn release_default_tx(tx: &Tx<'_>, id: ProfileId) -> Result<ConnectionProfile, StoreError> {
    let target = tx.get::<ConnectionProfile>(id)?;
    if !target.is_default {
        return Ok(target);
    }
    tx.conn().execute(
        "UPDATE profiles SET is_default = 0, updated_at_ms = ?1 WHERE id = ?2",
        params![tx.now_ms(), id.get()],
    )?;
    tx.get::<ConnectionProfile>(id)
}

impl SqliteStore {
    /// Creates a profile. With `want_default`, the create and the default
    /// claim share one transaction, and an existing default is never
    /// displaced: the call fails with [`StoreError::MultipleDefaultsNotAllowed`].
    pub fn create_profile(
        &mut self,
        draft: &NewProfile,
        want_default: bool,
    ) -> Result<ConnectionProfile, StoreError> {
        draft.validate()?;
        self.run_in_transaction("create_profile", |tx| {
            if want_default && current_default_tx(tx)?.is_some() {
                return Err(StoreError::MultipleDefaultsNotAllowed);
            }
            let created = tx.create::<ConnectionProfile>(draft)?;
            if want_default {
                return claim_default_tx(tx, created.id);
            }
            Ok(created)
        })
    }

    /// Promotes `id` to the single default, clearing any previous holder in
    /// the same transaction. Promoting the current default changes nothing.
    pub fn set_default_profile(&mut self, id: ProfileId) -> Result<ConnectionProfile, StoreError> {
        self.run_in_transaction("set_default_profile", |tx| claim_default_tx(tx, id))
    }

    /// Idempotent: clearing a profile that is not the default is a no-op.
    pub fn clear_default_profile(
        &mut self,
        id: ProfileId,
    ) -> Result<ConnectionProfile, StoreError> {
        self.run_in_transaction("clear_default_profile", |tx| release_default_tx(tx, id))
    }

    pub fn get_default_profile(&mut self) -> Result<ConnectionProfile, StoreError> {
        self.read("get_default_profile", |tx| match current_default_tx(tx)? {
            Some(id) => tx.get::<ConnectionProfile>(id),
            None => Err(StoreError::NotFound {
                kind: RecordKind::Profile,
                id: None,
            }),
        })
    }

    pub fn get_profile(&mut self, id: ProfileId) -> Result<ConnectionProfile, StoreError> {
        self.read("get_profile", |tx| tx.get::<ConnectionProfile>(id))
    }

    pub fn list_profiles(&mut self) -> Result<Vec<ConnectionProfile>, StoreError> {
        self.read("list_profiles", |tx| tx.list::<ConnectionProfile>(&[]))
    }

    /// Applies only the fields present in `patch`. `set_as_default` routes
    /// through the same claim/release path as the dedicated operations, after
    /// the field merge and inside the same transaction.
    pub fn update_profile(
        &mut self,
        id: ProfileId,
        patch: &ProfilePatch,
    ) -> Result<ConnectionProfile, StoreError> {
        self.run_in_transaction("update_profile", |tx| {
            let updated = tx.update::<ConnectionProfile, _>(id, patch)?;
            match patch.set_as_default {
                Some(true) => claim_default_tx(tx, id),
                Some(false) => release_default_tx(tx, id),
                None => Ok(updated),
            }
        })
    }

    pub fn delete_profile(&mut self, id: ProfileId) -> Result<(), StoreError> {
        self.run_in_transaction("delete_profile", |tx| {
            tx.delete::<ConnectionProfile>(id)
        })
    }
}
