use std::collections::HashSet;

use crate::entities::{
    bid_entity as bids, donation_bid_entity as donation_bids, donation_entity as donations,
    event_entity as events,
};
use crate::error::{AppError, AppResult};
use crate::models::{BidState, TransactionState};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

/// Keeps bid aggregates and states consistent across the parent/child
/// tree. Totals are derived: a bid's total is its own completed
/// allocations plus its children's totals, so recomputation always walks
/// from the changed bid up to the root.
pub struct BidService {
    pool: DatabaseConnection,
}

impl BidService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Recompute `total`/`count` for a bid and every ancestor above it.
    /// Returns the bid itself, freshly updated.
    pub async fn recompute_total(&self, bid_id: i64) -> AppResult<bids::Model> {
        let txn = self.pool.begin().await?;
        let updated = Self::recompute_total_tx(&txn, bid_id).await?;
        txn.commit().await?;
        Ok(updated)
    }

    pub(crate) async fn recompute_total_tx<C: ConnectionTrait>(
        db: &C,
        bid_id: i64,
    ) -> AppResult<bids::Model> {
        let mut target: Option<bids::Model> = None;
        let mut current_id = Some(bid_id);

        while let Some(id) = current_id {
            let bid = bids::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("bid {id}")))?;
            let children = bids::Entity::find()
                .filter(bids::Column::ParentId.eq(id))
                .all(db)
                .await?;
            let allocations = donation_bids::Entity::find()
                .filter(donation_bids::Column::BidId.eq(id))
                .all(db)
                .await?;

            // Only completed donations count toward totals.
            let donation_ids: Vec<i64> = allocations.iter().map(|a| a.donation_id).collect();
            let completed_ids: HashSet<i64> = if donation_ids.is_empty() {
                HashSet::new()
            } else {
                donations::Entity::find()
                    .filter(donations::Column::Id.is_in(donation_ids))
                    .filter(donations::Column::State.eq(TransactionState::Completed))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|d| d.id)
                    .collect()
            };

            let mut total = Decimal::ZERO;
            let mut count = 0i32;
            for alloc in &allocations {
                if completed_ids.contains(&alloc.donation_id) {
                    total += alloc.amount;
                    count += 1;
                }
            }
            for child in &children {
                total += child.total;
                count += child.count;
            }

            let parent_id = bid.parent_id;
            let mut am = bid.into_active_model();
            am.total = Set(total);
            am.count = Set(count);
            let updated = am.update(db).await?;

            if target.is_none() {
                target = Some(updated);
            }
            current_id = parent_id;
        }

        target.ok_or_else(|| AppError::InternalError("bid recompute updated nothing".to_string()))
    }

    /// Change a bid's state and propagate it down the subtree. Locked
    /// events refuse without elevated privilege, and an option cannot
    /// open under a parent that is not itself open.
    pub async fn set_state(
        &self,
        bid_id: i64,
        new_state: BidState,
        elevated: bool,
    ) -> AppResult<bids::Model> {
        let txn = self.pool.begin().await?;

        let bid = bids::Entity::find_by_id(bid_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("bid {bid_id}")))?;
        let event = events::Entity::find_by_id(bid.event_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {}", bid.event_id)))?;

        if event.locked && !elevated {
            return Err(AppError::PermissionDenied);
        }

        if new_state == BidState::Opened
            && let Some(parent_id) = bid.parent_id
        {
            let parent = bids::Entity::find_by_id(parent_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("bid {parent_id}")))?;
            if parent.state != BidState::Opened {
                return Err(AppError::ValidationError(format!(
                    "cannot open '{}' under parent '{}' in state {}",
                    bid.name, parent.name, parent.state
                )));
            }
        }

        let mut am = bid.into_active_model();
        am.state = Set(new_state.clone());
        let updated = am.update(&txn).await?;

        // Children mirror the new state.
        let mut frontier = vec![bid_id];
        while let Some(id) = frontier.pop() {
            let children = bids::Entity::find()
                .filter(bids::Column::ParentId.eq(id))
                .all(&txn)
                .await?;
            for child in children {
                frontier.push(child.id);
                let mut child_am = child.into_active_model();
                child_am.state = Set(new_state.clone());
                child_am.update(&txn).await?;
            }
        }

        txn.commit().await?;
        log::info!("bid {} state set to {}", updated.id, updated.state);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CommentLanguage, CommentState, DonationDomain, ReadState,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn bid(id: i64, parent_id: Option<i64>, total: Decimal, count: i32) -> bids::Model {
        bids::Model {
            id,
            event_id: 1,
            speedrun_id: None,
            parent_id,
            name: format!("bid-{id}"),
            description: String::new(),
            goal: Some(dec!(500.00)),
            is_target: parent_id.is_some(),
            allow_user_options: false,
            state: BidState::Opened,
            total,
            count,
        }
    }

    fn allocation(id: i64, donation_id: i64, bid_id: i64, amount: Decimal) -> donation_bids::Model {
        donation_bids::Model {
            id,
            donation_id,
            bid_id,
            amount,
        }
    }

    fn completed_donation(id: i64) -> donations::Model {
        donations::Model {
            id,
            donor_id: Some(1),
            event_id: 1,
            domain: DonationDomain::PayPal,
            domain_id: format!("txn-{id}"),
            state: TransactionState::Completed,
            amount: dec!(100.00),
            fee: dec!(0.00),
            currency: "USD".to_string(),
            time_received: Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap(),
            comment: String::new(),
            comment_state: CommentState::Absent,
            comment_language: CommentLanguage::Unknown,
            read_state: ReadState::Ready,
            test_donation: false,
            mod_comments: String::new(),
        }
    }

    #[tokio::test]
    async fn test_recompute_walks_up_to_parent() {
        let leaf_updated = bids::Model {
            total: dec!(25.00),
            count: 1,
            ..bid(10, Some(1), dec!(0.00), 0)
        };
        let parent_updated = bids::Model {
            total: dec!(40.00),
            count: 2,
            ..bid(1, None, dec!(0.00), 0)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // leaf pass: bid, children, allocations, completed donations, update
            .append_query_results([vec![bid(10, Some(1), dec!(0.00), 0)]])
            .append_query_results([Vec::<bids::Model>::new()])
            .append_query_results([vec![
                allocation(100, 500, 10, dec!(25.00)),
                allocation(101, 501, 10, dec!(99.00)),
            ]])
            .append_query_results([vec![completed_donation(500)]])
            .append_query_results([vec![leaf_updated.clone()]])
            // parent pass: bid, children (leaf + sibling), allocations, update
            .append_query_results([vec![bid(1, None, dec!(0.00), 0)]])
            .append_query_results([vec![
                leaf_updated.clone(),
                bids::Model {
                    total: dec!(15.00),
                    count: 1,
                    ..bid(11, Some(1), dec!(15.00), 1)
                },
            ]])
            .append_query_results([Vec::<donation_bids::Model>::new()])
            .append_query_results([vec![parent_updated.clone()]])
            .into_connection();

        let service = BidService::new(db);
        let out = service.recompute_total(10).await.unwrap();
        // the uncompleted donation 501 contributed nothing
        assert_eq!(out, leaf_updated);
    }

    #[tokio::test]
    async fn test_set_state_refused_on_locked_event() {
        let event = events::Model {
            id: 1,
            short: "agdq2024".to_string(),
            name: "Awesome Games Done Quick 2024".to_string(),
            receiver_name: "Prevent Cancer Foundation".to_string(),
            target_amount: dec!(1000000.00),
            minimum_donation: dec!(1.00),
            paypal_currency: "USD".to_string(),
            datetime: Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap(),
            locked: true,
            prize_accept_deadline_delta: 14,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![bid(10, None, dec!(0.00), 0)]])
            .append_query_results([vec![event]])
            .into_connection();

        let service = BidService::new(db);
        let err = service
            .set_state(10, BidState::Closed, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_option_cannot_open_under_closed_parent() {
        let event = events::Model {
            id: 1,
            short: "agdq2024".to_string(),
            name: "Awesome Games Done Quick 2024".to_string(),
            receiver_name: "Prevent Cancer Foundation".to_string(),
            target_amount: dec!(1000000.00),
            minimum_donation: dec!(1.00),
            paypal_currency: "USD".to_string(),
            datetime: Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap(),
            locked: false,
            prize_accept_deadline_delta: 14,
        };
        let closed_parent = bids::Model {
            state: BidState::Closed,
            ..bid(1, None, dec!(0.00), 0)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![bid(10, Some(1), dec!(0.00), 0)]])
            .append_query_results([vec![event]])
            .append_query_results([vec![closed_parent]])
            .into_connection();

        let service = BidService::new(db);
        let err = service
            .set_state(10, BidState::Opened, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
