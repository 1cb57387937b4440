//! Channel registry: create, update and lookup.
//!
//! # Responsibilities
//! - Reject reserved ids and duplicate ids on create
//! - Authorize updates against the stored password
//! - Persist full records through the injected store
//!
//! # Design Decisions
//! - Create is a single `insert_if_absent`; two racing creates cannot both win
//! - Update reads, authorizes, then writes with `replace_if` keyed on the
//!   password it read, so a concurrent password change fails the write
//! - Update replaces the whole record; omitted optional fields revert to
//!   their defaults

use std::sync::Arc;

use super::validation::ChannelForm;
use super::{credentials_match, generate_password, is_reserved, ChannelRecord};
use crate::error::{ChannelError, ChannelResult};
use crate::observability::metrics;
use crate::resilience::{run_read, run_write, StorePolicy};
use crate::store::{CasOutcome, RecordStore};

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub channel_id: String,
    /// The password now required for updates.
    pub password: String,
}

/// Owns validation-after-parsing, creation, update and lookup of channels.
pub struct ChannelRegistry {
    store: Arc<dyn RecordStore>,
    policy: StorePolicy,
}

impl ChannelRegistry {
    pub fn new(store: Arc<dyn RecordStore>, policy: StorePolicy) -> Self {
        Self { store, policy }
    }

    /// Register a new channel.
    ///
    /// An empty password is replaced with a generated one, which is returned
    /// since it cannot be recovered later.
    pub async fn create(&self, form: ChannelForm) -> ChannelResult<Created> {
        if is_reserved(&form.channel_id) {
            tracing::info!(channel_id = %form.channel_id, "Rejected reserved channel id");
            metrics::record_mutation("create", "reserved");
            return Err(ChannelError::ReservedIdentifier);
        }

        let (channel_id, mut record) = form.into_record();
        let generated = record.password.is_empty();
        if generated {
            record.password = generate_password();
        }
        let password = record.password.clone();

        let inserted = run_write(
            "insert_if_absent",
            &self.policy,
            self.store.insert_if_absent(&channel_id, record),
        )
        .await
        .map_err(|e| {
            metrics::record_mutation("create", "store_error");
            ChannelError::from(e)
        })?;

        if !inserted {
            tracing::info!(channel_id = %channel_id, "Channel already exists");
            metrics::record_mutation("create", "exists");
            return Err(ChannelError::AlreadyExists);
        }

        tracing::info!(
            channel_id = %channel_id,
            generated_password = generated,
            "Channel created"
        );
        metrics::record_mutation("create", "ok");
        Ok(Created {
            channel_id,
            password,
        })
    }

    /// Replace an existing channel's record. The form's password must match
    /// the stored one and becomes the stored password again.
    pub async fn update(&self, form: ChannelForm) -> ChannelResult<()> {
        let current = self.fetch(&form.channel_id).await?.ok_or_else(|| {
            metrics::record_mutation("update", "not_found");
            ChannelError::NotFound
        })?;

        if !credentials_match(&current.password, &form.password) {
            tracing::warn!(channel_id = %form.channel_id, "Update rejected: wrong password");
            metrics::record_mutation("update", "unauthorized");
            return Err(ChannelError::Unauthorized("Unauthorized"));
        }

        let (channel_id, record) = form.into_record();
        let outcome = run_write(
            "replace_if",
            &self.policy,
            self.store.replace_if(&channel_id, &current.password, record),
        )
        .await
        .map_err(|e| {
            metrics::record_mutation("update", "store_error");
            ChannelError::from(e)
        })?;

        match outcome {
            CasOutcome::Replaced => {
                tracing::info!(channel_id = %channel_id, "Channel updated");
                metrics::record_mutation("update", "ok");
                Ok(())
            }
            CasOutcome::Missing => {
                metrics::record_mutation("update", "not_found");
                Err(ChannelError::NotFound)
            }
            // The password changed between our read and write, so the one the
            // caller presented is no longer current.
            CasOutcome::Mismatch => {
                tracing::warn!(
                    channel_id = %channel_id,
                    "Update lost a race with a password change"
                );
                metrics::record_mutation("update", "unauthorized");
                Err(ChannelError::Unauthorized("Unauthorized"))
            }
        }
    }

    /// Read-only lookup.
    pub async fn lookup(&self, channel_id: &str) -> ChannelResult<Option<ChannelRecord>> {
        self.fetch(channel_id).await
    }

    async fn fetch(&self, channel_id: &str) -> ChannelResult<Option<ChannelRecord>> {
        let store = &self.store;
        let record = run_read("get", &self.policy, move || store.get(channel_id)).await?;
        Ok(record)
    }
}
