//! Reservation toggler
//!
//! Moves an item between available and reserved-by-user. Each transition
//! is one unconditioned UPDATE: there is no version check, so concurrent
//! reserve/unreserve calls on the same item are last-write-wins.

use std::sync::Arc;

use async_trait::async_trait;
use onehand_core::{ReservationPolicy, ReservationState};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repos::{DbError, ItemRepo, ReservedItem};
use crate::notify::{self, EmailMessage, Notifier};

/// The signed-in user performing a reservation change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("must be logged in")]
    NotLoggedIn,

    #[error("item '{0}' not found")]
    NotFound(Uuid),

    #[error("item '{0}' is not reserved by you")]
    NotHolder(Uuid),

    /// Store errors are passed through with their original message
    #[error(transparent)]
    Store(#[from] DbError),
}

/// Storage seam for the two reservation writes
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Set the item reserved by `actor`; `None` if the item does not exist.
    async fn mark_reserved(&self, item: Uuid, actor: Uuid) -> Result<Option<ReservedItem>, DbError>;

    /// Set the item available. `holder = Some(u)` only matches rows reserved
    /// by `u`. Returns rows affected.
    async fn mark_available(&self, item: Uuid, holder: Option<Uuid>) -> Result<u64, DbError>;
}

/// Postgres-backed store
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn mark_reserved(&self, item: Uuid, actor: Uuid) -> Result<Option<ReservedItem>, DbError> {
        ItemRepo::new(&self.pool).mark_reserved(item, actor).await
    }

    async fn mark_available(&self, item: Uuid, holder: Option<Uuid>) -> Result<u64, DbError> {
        ItemRepo::new(&self.pool).mark_available(item, holder).await
    }
}

/// Outcome of a successful reserve
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Reserved {
    pub item_id: Uuid,
    #[serde(flatten)]
    pub state: ReservationState,
}

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    notifier: Arc<dyn Notifier>,
    policy: ReservationPolicy,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        notifier: Arc<dyn Notifier>,
        policy: ReservationPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Reserve `item_id` for the actor and notify the owner in the background.
    pub async fn reserve(
        &self,
        item_id: Uuid,
        actor: Option<&Actor>,
    ) -> Result<Reserved, ReservationError> {
        let actor = actor.ok_or(ReservationError::NotLoggedIn)?;

        let reserved = self
            .store
            .mark_reserved(item_id, actor.id)
            .await?
            .ok_or(ReservationError::NotFound(item_id))?;

        tracing::info!(item = %item_id, user = %actor.id, "item reserved");

        if !reserved.owner_email.eq_ignore_ascii_case(&actor.email) {
            notify::dispatch(
                Arc::clone(&self.notifier),
                EmailMessage::item_reserved(&reserved.owner_email, &reserved.description, &actor.email),
            );
        }

        Ok(Reserved {
            item_id,
            state: ReservationState::Available.reserve(actor.id),
        })
    }

    /// Release `item_id`. On success returns the id the caller should drop
    /// from its displayed collection.
    ///
    /// Under the open policy the write is not conditioned on who holds the
    /// reservation, and a missing item still counts as released.
    pub async fn unreserve(
        &self,
        item_id: Uuid,
        actor: Option<&Actor>,
    ) -> Result<Uuid, ReservationError> {
        let actor = actor.ok_or(ReservationError::NotLoggedIn)?;

        let holder = self.policy.required_holder(actor.id);
        let affected = self.store.mark_available(item_id, holder).await?;
        if affected == 0 && holder.is_some() {
            return Err(ReservationError::NotHolder(item_id));
        }

        tracing::info!(item = %item_id, user = %actor.id, policy = %self.policy, "item unreserved");
        Ok(item_id)
    }
}
