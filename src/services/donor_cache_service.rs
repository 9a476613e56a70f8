use crate::entities::{donation_entity as donations, donor_cache_entity as donor_caches};
use crate::error::AppResult;
use crate::models::{DonationStats, TransactionState};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, Set,
};

/// Maintains the derived per-donor aggregates. Every method recomputes
/// from the completed-donation ledger; nothing here is incremental, so a
/// redundant call is always safe.
pub struct DonorCacheService {
    pool: DatabaseConnection,
}

impl DonorCacheService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Recompute one cache row: the donor's aggregate for `event_id`, or
    /// the global (all-events) row for `None`. Returns the row, or None
    /// when the donor has no completed donations in scope and the row
    /// was dropped.
    pub async fn recompute(
        &self,
        donor_id: i64,
        event_id: Option<i64>,
    ) -> AppResult<Option<donor_caches::Model>> {
        Self::recompute_tx(&self.pool, donor_id, event_id).await
    }

    /// Recompute both rows a donation mutation touches: the event-scoped
    /// aggregate and the global one. Two independent upserts.
    pub async fn recompute_for_donor(&self, donor_id: i64, event_id: i64) -> AppResult<()> {
        Self::recompute_for_donor_tx(&self.pool, donor_id, event_id).await
    }

    pub(crate) async fn recompute_for_donor_tx<C: ConnectionTrait>(
        db: &C,
        donor_id: i64,
        event_id: i64,
    ) -> AppResult<()> {
        Self::recompute_tx(db, donor_id, Some(event_id)).await?;
        Self::recompute_tx(db, donor_id, None).await?;
        Ok(())
    }

    pub(crate) async fn recompute_tx<C: ConnectionTrait>(
        db: &C,
        donor_id: i64,
        event_id: Option<i64>,
    ) -> AppResult<Option<donor_caches::Model>> {
        let mut query = donations::Entity::find()
            .filter(donations::Column::DonorId.eq(donor_id))
            .filter(donations::Column::State.eq(TransactionState::Completed));
        if let Some(event_id) = event_id {
            query = query.filter(donations::Column::EventId.eq(event_id));
        }
        let completed = query.all(db).await?;
        let stats = DonationStats::from_amounts(completed.iter().map(|d| d.amount));

        let existing = donor_caches::Entity::find()
            .filter(donor_caches::Column::DonorId.eq(donor_id))
            .filter(match event_id {
                Some(id) => donor_caches::Column::EventId.eq(id),
                None => donor_caches::Column::EventId.is_null(),
            })
            .one(db)
            .await?;

        // Derived data must not accumulate empty rows.
        if stats.is_empty() {
            if let Some(row) = existing {
                log::info!(
                    "donor {} has no completed donations left (event {:?}), dropping cache row",
                    donor_id,
                    event_id
                );
                row.delete(db).await?;
            }
            return Ok(None);
        }

        let updated = match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.donation_total = Set(stats.total);
                am.donation_count = Set(stats.count);
                am.donation_max = Set(stats.max);
                am.donation_avg = Set(stats.avg);
                am.update(db).await?
            }
            None => {
                donor_caches::ActiveModel {
                    donor_id: Set(donor_id),
                    event_id: Set(event_id),
                    donation_total: Set(stats.total),
                    donation_count: Set(stats.count),
                    donation_max: Set(stats.max),
                    donation_avg: Set(stats.avg),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        Ok(Some(updated))
    }
}
