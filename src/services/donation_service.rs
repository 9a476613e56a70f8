use std::sync::Arc;

use crate::entities::{
    bid_entity as bids, donation_bid_entity as donation_bids, donation_entity as donations,
    donor_entity as donors, prize_entity as prizes, prize_ticket_entity as prize_tickets,
};
use crate::error::{AllocationKind, AppError, AppResult, InvariantError};
use crate::models::{
    BidState, CommentLanguage, CommentState, DonationDomain, PendingBidAllocation,
    TransactionState,
};
use crate::services::{BidService, DonorCacheService};
use crate::utils::{
    derive_domain_id, is_well_formed_domain_id, random_domain_id, round_cents, LanguageDetector,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    NotSet, QueryFilter, QuerySelect, Set, TransactionTrait,
};

/// Normalize and validate a donation against the ledger invariants,
/// returning the corrected row or the first violation. Pure: callers load
/// whatever context the database holds and pass it in.
///
/// `pending_bid` is an allocation being added or edited alongside the
/// donation; when it carries the id of one of `bid_allocations` that row
/// is replaced in the cap check rather than counted twice.
pub(crate) fn clean_donation(
    mut donation: donations::Model,
    bid_allocations: &[donation_bids::Model],
    ticket_allocations: &[prize_tickets::Model],
    pending_bid: Option<&PendingBidAllocation>,
    donor_email: Option<&str>,
    detector: Option<&dyn LanguageDetector>,
) -> AppResult<donations::Model> {
    donation.amount = round_cents(donation.amount);
    donation.fee = round_cents(donation.fee);
    if donation.amount <= Decimal::ZERO {
        return Err(AppError::ValidationError(
            "donation amount must be positive".to_string(),
        ));
    }

    // Hand-entered donations are money already in hand.
    if donation.domain == DonationDomain::Local {
        if donation.donor_id.is_none() {
            return Err(InvariantError::MissingDonor.into());
        }
        donation.state = TransactionState::Completed;
    }

    if donation.state != TransactionState::Pending && donation.donor_id.is_none() {
        return Err(InvariantError::MissingDonor.into());
    }

    if donation.domain_id.is_empty() {
        donation.domain_id = match donor_email {
            Some(email) => derive_domain_id(donation.time_received, email),
            // Local rows never have to dedup against a processor callback.
            None if donation.domain == DonationDomain::Local => random_domain_id(),
            None => return Err(InvariantError::InvalidDomainId.into()),
        };
    }
    if !is_well_formed_domain_id(&donation.domain_id) {
        return Err(InvariantError::InvalidDomainId.into());
    }

    let mut bid_total = Decimal::ZERO;
    for alloc in bid_allocations {
        if pending_bid
            .and_then(|p| p.id)
            .is_some_and(|id| id == alloc.id)
        {
            continue;
        }
        bid_total += alloc.amount;
    }
    if let Some(pending) = pending_bid {
        if pending.amount <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "bid allocation amount must be positive".to_string(),
            ));
        }
        bid_total += pending.amount;
    }
    if bid_total > donation.amount {
        return Err(InvariantError::AllocationExceedsAmount {
            kind: AllocationKind::Bid,
            allocated: bid_total,
            amount: donation.amount,
        }
        .into());
    }

    // The cap checks only hold if every row is positive money.
    let mut ticket_total = Decimal::ZERO;
    for ticket in ticket_allocations {
        if ticket.amount <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "ticket allocation amount must be positive".to_string(),
            ));
        }
        ticket_total += ticket.amount;
    }
    if ticket_total > donation.amount {
        return Err(InvariantError::AllocationExceedsAmount {
            kind: AllocationKind::Ticket,
            allocated: ticket_total,
            amount: donation.amount,
        }
        .into());
    }

    if donation.comment.is_empty() {
        donation.comment_state = CommentState::Absent;
    } else if donation.comment_state == CommentState::Absent {
        donation.comment_state = CommentState::Pending;
    }
    if let Some(detector) = detector
        && !donation.comment.is_empty()
        && donation.comment_language == CommentLanguage::Unknown
        && let Some(lang) = detector.detect(&donation.comment)
    {
        donation.comment_language = lang;
    }

    Ok(donation)
}

/// ActiveModel with every column marked changed, for writes that replace
/// the whole row with a cleaned model.
pub(crate) fn donation_active_model(m: &donations::Model) -> donations::ActiveModel {
    donations::ActiveModel {
        id: Set(m.id),
        donor_id: Set(m.donor_id),
        event_id: Set(m.event_id),
        domain: Set(m.domain.clone()),
        domain_id: Set(m.domain_id.clone()),
        state: Set(m.state.clone()),
        amount: Set(m.amount),
        fee: Set(m.fee),
        currency: Set(m.currency.clone()),
        time_received: Set(m.time_received),
        comment: Set(m.comment.clone()),
        comment_state: Set(m.comment_state.clone()),
        comment_language: Set(m.comment_language.clone()),
        read_state: Set(m.read_state.clone()),
        test_donation: Set(m.test_donation),
        mod_comments: Set(m.mod_comments.clone()),
    }
}

/// Validates and persists donations and their allocations, keeping donor
/// caches and bid totals in step with every write that changes a
/// completed contribution.
pub struct DonationService {
    pool: DatabaseConnection,
    detector: Option<Arc<dyn LanguageDetector>>,
}

impl DonationService {
    pub fn new(pool: DatabaseConnection, detector: Option<Arc<dyn LanguageDetector>>) -> Self {
        Self { pool, detector }
    }

    /// Dry-run a donation (and optionally one allocation change) against
    /// the invariants without writing anything.
    pub async fn validate_donation(
        &self,
        donation: donations::Model,
        pending_bid: Option<PendingBidAllocation>,
    ) -> AppResult<donations::Model> {
        let (bid_allocations, ticket_allocations) = if donation.id != 0 {
            (
                donation_bids::Entity::find()
                    .filter(donation_bids::Column::DonationId.eq(donation.id))
                    .all(&self.pool)
                    .await?,
                prize_tickets::Entity::find()
                    .filter(prize_tickets::Column::DonationId.eq(donation.id))
                    .all(&self.pool)
                    .await?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let donor_email = if donation.domain_id.is_empty()
            && let Some(donor_id) = donation.donor_id
        {
            donors::Entity::find_by_id(donor_id)
                .one(&self.pool)
                .await?
                .map(|d| d.email)
        } else {
            None
        };

        clean_donation(
            donation,
            &bid_allocations,
            &ticket_allocations,
            pending_bid.as_ref(),
            donor_email.as_deref(),
            self.detector.as_deref(),
        )
    }

    /// Clean and persist a donation, creating it when `id` is zero.
    /// Donor caches and bid totals are recomputed inside the same
    /// transaction whenever the completed contribution changed.
    pub async fn save_donation(&self, donation: donations::Model) -> AppResult<donations::Model> {
        let txn = self.pool.begin().await?;

        let existing = if donation.id != 0 {
            Some(
                donations::Entity::find_by_id(donation.id)
                    .lock_exclusive()
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("donation {}", donation.id)))?,
            )
        } else {
            None
        };

        let (bid_allocations, ticket_allocations) = if donation.id != 0 {
            (
                donation_bids::Entity::find()
                    .filter(donation_bids::Column::DonationId.eq(donation.id))
                    .all(&txn)
                    .await?,
                prize_tickets::Entity::find()
                    .filter(prize_tickets::Column::DonationId.eq(donation.id))
                    .all(&txn)
                    .await?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let donor_email = if donation.domain_id.is_empty()
            && let Some(donor_id) = donation.donor_id
        {
            donors::Entity::find_by_id(donor_id)
                .one(&txn)
                .await?
                .map(|d| d.email)
        } else {
            None
        };

        let clean = clean_donation(
            donation,
            &bid_allocations,
            &ticket_allocations,
            None,
            donor_email.as_deref(),
            self.detector.as_deref(),
        )?;

        let saved = match &existing {
            Some(old) => {
                let mut am = donation_active_model(&clean);
                am.id = Set(old.id);
                am.update(&txn).await?
            }
            None => {
                let mut am = donation_active_model(&clean);
                am.id = NotSet;
                am.insert(&txn).await?
            }
        };

        // A cache row depends on (donor, event, amount) of completed
        // donations only; recompute for whoever gained or lost one.
        let before = existing
            .as_ref()
            .filter(|o| o.is_completed())
            .and_then(|o| o.donor_id.map(|d| (d, o.event_id, o.amount)));
        let after = if saved.is_completed() {
            saved.donor_id.map(|d| (d, saved.event_id, saved.amount))
        } else {
            None
        };
        if before != after {
            if let Some((donor_id, event_id, _)) = before {
                DonorCacheService::recompute_for_donor_tx(&txn, donor_id, event_id).await?;
            }
            if let Some((donor_id, event_id, _)) = after
                && before.map(|(d, e, _)| (d, e)) != Some((donor_id, event_id))
            {
                DonorCacheService::recompute_for_donor_tx(&txn, donor_id, event_id).await?;
            }
        }

        let was_completed = existing.as_ref().is_some_and(|o| o.is_completed());
        if was_completed != saved.is_completed() {
            for alloc in &bid_allocations {
                BidService::recompute_total_tx(&txn, alloc.bid_id).await?;
            }
        }

        txn.commit().await?;
        log::info!("donation {} saved in state {}", saved.id, saved.state);
        Ok(saved)
    }

    /// Put part of a donation toward a bid, replacing any previous
    /// allocation to the same bid. Only an OPENED bid takes new money;
    /// the donation's bid cap is enforced before the write, and the bid
    /// chain is recomputed when the donation already counts.
    pub async fn record_bid_allocation(
        &self,
        donation_id: i64,
        bid_id: i64,
        amount: Decimal,
    ) -> AppResult<donation_bids::Model> {
        let amount = round_cents(amount);
        let txn = self.pool.begin().await?;

        let donation = donations::Entity::find_by_id(donation_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donation {donation_id}")))?;
        let bid = bids::Entity::find_by_id(bid_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("bid {bid_id}")))?;

        if bid.event_id != donation.event_id {
            return Err(AppError::ValidationError(format!(
                "bid '{}' belongs to another event",
                bid.name
            )));
        }
        if !bid.is_target {
            return Err(AppError::ValidationError(format!(
                "bid '{}' does not take allocations directly",
                bid.name
            )));
        }
        if bid.state != BidState::Opened {
            return Err(AppError::ValidationError(format!(
                "bid '{}' is not open for new donations",
                bid.name
            )));
        }

        let bid_allocations = donation_bids::Entity::find()
            .filter(donation_bids::Column::DonationId.eq(donation_id))
            .all(&txn)
            .await?;
        let ticket_allocations = prize_tickets::Entity::find()
            .filter(prize_tickets::Column::DonationId.eq(donation_id))
            .all(&txn)
            .await?;

        let existing = bid_allocations.iter().find(|a| a.bid_id == bid_id).cloned();
        let pending = PendingBidAllocation {
            id: existing.as_ref().map(|a| a.id),
            bid_id,
            amount,
        };
        clean_donation(
            donation.clone(),
            &bid_allocations,
            &ticket_allocations,
            Some(&pending),
            None,
            None,
        )?;

        let saved = match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.amount = Set(amount);
                am.update(&txn).await?
            }
            None => {
                donation_bids::ActiveModel {
                    donation_id: Set(donation_id),
                    bid_id: Set(bid_id),
                    amount: Set(amount),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        if donation.is_completed() {
            BidService::recompute_total_tx(&txn, bid_id).await?;
        }

        txn.commit().await?;
        Ok(saved)
    }

    /// Put part of a donation toward a ticket-draw prize, replacing any
    /// previous allocation to the same prize. Ticket totals are read at
    /// draw time, so no recomputation follows the write.
    pub async fn record_ticket_allocation(
        &self,
        donation_id: i64,
        prize_id: i64,
        amount: Decimal,
    ) -> AppResult<prize_tickets::Model> {
        let amount = round_cents(amount);
        let txn = self.pool.begin().await?;

        let donation = donations::Entity::find_by_id(donation_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donation {donation_id}")))?;
        let prize = prizes::Entity::find_by_id(prize_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("prize {prize_id}")))?;

        if !prize.uses_tickets() {
            return Err(AppError::ValidationError(format!(
                "prize '{}' is not drawn by tickets",
                prize.name
            )));
        }
        if prize.event_id != donation.event_id {
            return Err(AppError::ValidationError(format!(
                "prize '{}' belongs to another event",
                prize.name
            )));
        }

        let bid_allocations = donation_bids::Entity::find()
            .filter(donation_bids::Column::DonationId.eq(donation_id))
            .all(&txn)
            .await?;
        let ticket_allocations = prize_tickets::Entity::find()
            .filter(prize_tickets::Column::DonationId.eq(donation_id))
            .all(&txn)
            .await?;

        let existing = ticket_allocations
            .iter()
            .find(|t| t.prize_id == prize_id)
            .cloned();
        let mut effective: Vec<prize_tickets::Model> = ticket_allocations
            .iter()
            .filter(|t| t.prize_id != prize_id)
            .cloned()
            .collect();
        effective.push(prize_tickets::Model {
            id: existing.as_ref().map_or(0, |t| t.id),
            donation_id,
            prize_id,
            amount,
        });
        clean_donation(
            donation.clone(),
            &bid_allocations,
            &effective,
            None,
            None,
            None,
        )?;

        let saved = match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.amount = Set(amount);
                am.update(&txn).await?
            }
            None => {
                prize_tickets::ActiveModel {
                    donation_id: Set(donation_id),
                    prize_id: Set(prize_id),
                    amount: Set(amount),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        Ok(saved)
    }

    /// Move a donation to a new financial state. Same-state calls are
    /// no-ops; leaving PENDING requires a donor; crossing the COMPLETED
    /// boundary in either direction recomputes caches and bid totals.
    pub async fn set_transaction_state(
        &self,
        donation_id: i64,
        new_state: TransactionState,
    ) -> AppResult<donations::Model> {
        let txn = self.pool.begin().await?;

        let donation = donations::Entity::find_by_id(donation_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donation {donation_id}")))?;

        if donation.state == new_state {
            txn.commit().await?;
            return Ok(donation);
        }
        if new_state != TransactionState::Pending && donation.donor_id.is_none() {
            return Err(InvariantError::MissingDonor.into());
        }

        let was_completed = donation.is_completed();
        let donor_id = donation.donor_id;
        let event_id = donation.event_id;
        let mut am = donation.into_active_model();
        am.state = Set(new_state);
        let updated = am.update(&txn).await?;

        if was_completed != updated.is_completed() {
            if let Some(donor_id) = donor_id {
                DonorCacheService::recompute_for_donor_tx(&txn, donor_id, event_id).await?;
            }
            let allocations = donation_bids::Entity::find()
                .filter(donation_bids::Column::DonationId.eq(donation_id))
                .all(&txn)
                .await?;
            for alloc in &allocations {
                BidService::recompute_total_tx(&txn, alloc.bid_id).await?;
            }
        }

        txn.commit().await?;
        log::info!("donation {} moved to {}", updated.id, updated.state);
        Ok(updated)
    }

    /// Remove a donation that never became real money. Only pending rows
    /// with no donor attached qualify; everything else is part of the
    /// permanent ledger.
    pub async fn delete_donation(&self, donation_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let donation = donations::Entity::find_by_id(donation_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("donation {donation_id}")))?;

        if donation.state != TransactionState::Pending || donation.donor_id.is_some() {
            return Err(AppError::ValidationError(
                "only pending donations with no donor attached can be deleted".to_string(),
            ));
        }

        donation_bids::Entity::delete_many()
            .filter(donation_bids::Column::DonationId.eq(donation_id))
            .exec(&txn)
            .await?;
        prize_tickets::Entity::delete_many()
            .filter(prize_tickets::Column::DonationId.eq(donation_id))
            .exec(&txn)
            .await?;
        donation.delete(&txn).await?;

        txn.commit().await?;
        log::info!("donation {donation_id} deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrawMethod, PrizeState, ReadState};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn donation(id: i64, amount: Decimal, state: TransactionState) -> donations::Model {
        donations::Model {
            id,
            donor_id: Some(1),
            event_id: 1,
            domain: DonationDomain::PayPal,
            domain_id: format!("txn-{id}"),
            state,
            amount,
            fee: dec!(0.00),
            currency: "USD".to_string(),
            time_received: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            comment: String::new(),
            comment_state: CommentState::Absent,
            comment_language: CommentLanguage::Unknown,
            read_state: ReadState::Ready,
            test_donation: false,
            mod_comments: String::new(),
        }
    }

    fn bid_alloc(id: i64, donation_id: i64, bid_id: i64, amount: Decimal) -> donation_bids::Model {
        donation_bids::Model {
            id,
            donation_id,
            bid_id,
            amount,
        }
    }

    fn target_bid(id: i64) -> bids::Model {
        bids::Model {
            id,
            event_id: 1,
            speedrun_id: None,
            parent_id: None,
            name: format!("bid-{id}"),
            description: String::new(),
            goal: None,
            is_target: true,
            allow_user_options: false,
            state: BidState::Opened,
            total: dec!(0.00),
            count: 0,
        }
    }

    fn ticket_prize(id: i64) -> prizes::Model {
        prizes::Model {
            id,
            event_id: 1,
            name: format!("prize-{id}"),
            description: String::new(),
            image: String::new(),
            minimum_bid: dec!(5.00),
            maximum_bid: None,
            draw_method: DrawMethod::Tickets,
            auto_tickets: false,
            max_winners: 1,
            max_multi_win: 1,
            requires_shipping: false,
            custom_country_filter: false,
            start_run_id: None,
            end_run_id: None,
            starttime: None,
            endtime: None,
            state: PrizeState::Accepted,
            provider: String::new(),
            accept_email_sent: false,
        }
    }

    struct FrenchDetector;

    impl LanguageDetector for FrenchDetector {
        fn detect(&self, _text: &str) -> Option<CommentLanguage> {
            Some(CommentLanguage::French)
        }
    }

    #[test]
    fn test_clean_rejects_nonpositive_amount() {
        let err = clean_donation(
            donation(0, dec!(0.00), TransactionState::Pending),
            &[],
            &[],
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // sub-cent dust rounds away to nothing
        let err = clean_donation(
            donation(0, dec!(0.004), TransactionState::Pending),
            &[],
            &[],
            None,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_clean_normalizes_amounts_to_cents() {
        let clean = clean_donation(
            donation(0, dec!(10.009), TransactionState::Completed),
            &[],
            &[],
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(clean.amount, dec!(10.01));
    }

    #[test]
    fn test_clean_local_requires_donor_and_forces_completed() {
        let mut d = donation(0, dec!(10.00), TransactionState::Pending);
        d.domain = DonationDomain::Local;
        d.donor_id = None;
        let err = clean_donation(d, &[], &[], None, None, None).unwrap_err();
        assert!(matches!(
            err,
            AppError::Invariant(InvariantError::MissingDonor)
        ));

        let mut d = donation(0, dec!(10.00), TransactionState::Pending);
        d.domain = DonationDomain::Local;
        let clean = clean_donation(d, &[], &[], None, None, None).unwrap();
        assert_eq!(clean.state, TransactionState::Completed);
    }

    #[test]
    fn test_clean_completed_requires_donor() {
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.donor_id = None;
        let err = clean_donation(d, &[], &[], None, None, None).unwrap_err();
        assert!(matches!(
            err,
            AppError::Invariant(InvariantError::MissingDonor)
        ));
    }

    #[test]
    fn test_clean_derives_domain_id_from_time_and_email() {
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.domain_id = String::new();
        let clean =
            clean_donation(d, &[], &[], None, Some("donor@example.com"), None).unwrap();
        assert_eq!(clean.domain_id, "1705320000donor@example.com");
    }

    #[test]
    fn test_clean_local_without_email_gets_random_domain_id() {
        let mut d = donation(0, dec!(10.00), TransactionState::Pending);
        d.domain = DonationDomain::Local;
        d.domain_id = String::new();
        let clean = clean_donation(d, &[], &[], None, None, None).unwrap();
        assert_eq!(clean.domain_id.len(), 32);
        assert!(is_well_formed_domain_id(&clean.domain_id));
    }

    #[test]
    fn test_clean_rejects_missing_domain_id_for_processor_rows() {
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.domain_id = String::new();
        let err = clean_donation(d, &[], &[], None, None, None).unwrap_err();
        assert!(matches!(
            err,
            AppError::Invariant(InvariantError::InvalidDomainId)
        ));
    }

    #[test]
    fn test_clean_rejects_malformed_domain_id() {
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.domain_id = "has whitespace".to_string();
        let err = clean_donation(d, &[], &[], None, None, None).unwrap_err();
        assert!(matches!(
            err,
            AppError::Invariant(InvariantError::InvalidDomainId)
        ));
    }

    #[test]
    fn test_bid_cap_rejects_new_allocation_past_amount() {
        // 50.00 donation with 30.00 already allocated: 25.00 more fails,
        // 20.00 more lands exactly at the cap.
        let d = donation(5, dec!(50.00), TransactionState::Completed);
        let existing = vec![bid_alloc(7, 5, 1, dec!(30.00))];

        let over = PendingBidAllocation::new(2, dec!(25.00));
        let err = clean_donation(d.clone(), &existing, &[], Some(&over), None, None).unwrap_err();
        match err {
            AppError::Invariant(InvariantError::AllocationExceedsAmount {
                kind,
                allocated,
                amount,
            }) => {
                assert_eq!(kind, AllocationKind::Bid);
                assert_eq!(allocated, dec!(55.00));
                assert_eq!(amount, dec!(50.00));
            }
            other => panic!("unexpected error: {other}"),
        }

        let exact = PendingBidAllocation::new(2, dec!(20.00));
        assert!(clean_donation(d, &existing, &[], Some(&exact), None, None).is_ok());
    }

    #[test]
    fn test_bid_cap_replaces_edited_allocation() {
        let d = donation(5, dec!(50.00), TransactionState::Completed);
        let existing = vec![bid_alloc(7, 5, 1, dec!(30.00))];

        // editing row 7 from 30.00 to 45.00 replaces, not adds
        let edit = PendingBidAllocation {
            id: Some(7),
            bid_id: 1,
            amount: dec!(45.00),
        };
        assert!(clean_donation(d.clone(), &existing, &[], Some(&edit), None, None).is_ok());

        let too_far = PendingBidAllocation {
            id: Some(7),
            bid_id: 1,
            amount: dec!(55.00),
        };
        let err = clean_donation(d, &existing, &[], Some(&too_far), None, None).unwrap_err();
        assert!(matches!(
            err,
            AppError::Invariant(InvariantError::AllocationExceedsAmount { .. })
        ));
    }

    #[test]
    fn test_ticket_cap_independent_of_bid_cap() {
        let d = donation(5, dec!(50.00), TransactionState::Completed);
        let bids_at_cap = vec![bid_alloc(7, 5, 1, dec!(50.00))];
        let tickets = vec![prize_tickets::Model {
            id: 1,
            donation_id: 5,
            prize_id: 3,
            amount: dec!(50.00),
        }];
        // both caps full at once is fine, the pools are independent
        assert!(clean_donation(d.clone(), &bids_at_cap, &tickets, None, None, None).is_ok());

        let over = vec![
            prize_tickets::Model {
                id: 1,
                donation_id: 5,
                prize_id: 3,
                amount: dec!(30.00),
            },
            prize_tickets::Model {
                id: 2,
                donation_id: 5,
                prize_id: 4,
                amount: dec!(21.00),
            },
        ];
        let err = clean_donation(d, &[], &over, None, None, None).unwrap_err();
        match err {
            AppError::Invariant(InvariantError::AllocationExceedsAmount { kind, .. }) => {
                assert_eq!(kind, AllocationKind::Ticket)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_clean_rejects_nonpositive_allocations() {
        let d = donation(5, dec!(50.00), TransactionState::Completed);

        let zeroed = PendingBidAllocation::new(2, dec!(0.00));
        let err = clean_donation(d.clone(), &[], &[], Some(&zeroed), None, None).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let negative = PendingBidAllocation::new(2, dec!(-10.00));
        let err = clean_donation(d.clone(), &[], &[], Some(&negative), None, None).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let tickets = vec![prize_tickets::Model {
            id: 1,
            donation_id: 5,
            prize_id: 3,
            amount: dec!(0.00),
        }];
        let err = clean_donation(d, &[], &tickets, None, None, None).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_clean_comment_state_and_language() {
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.comment = "bonne chance a tous".to_string();
        let clean = clean_donation(d, &[], &[], None, None, Some(&FrenchDetector)).unwrap();
        assert_eq!(clean.comment_state, CommentState::Pending);
        assert_eq!(clean.comment_language, CommentLanguage::French);

        // empty comment always collapses back to ABSENT
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.comment_state = CommentState::Approved;
        let clean = clean_donation(d, &[], &[], None, None, None).unwrap();
        assert_eq!(clean.comment_state, CommentState::Absent);
    }

    #[test]
    fn test_clean_keeps_already_classified_language() {
        let mut d = donation(0, dec!(10.00), TransactionState::Completed);
        d.comment = "good luck".to_string();
        d.comment_language = CommentLanguage::English;
        let clean = clean_donation(d, &[], &[], None, None, Some(&FrenchDetector)).unwrap();
        assert_eq!(clean.comment_language, CommentLanguage::English);
    }

    #[tokio::test]
    async fn test_record_bid_allocation_rejects_over_cap() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![target_bid(2)]])
            .append_query_results([vec![bid_alloc(7, 5, 1, dec!(30.00))]])
            .append_query_results([Vec::<prize_tickets::Model>::new()])
            .into_connection();

        let service = DonationService::new(db, None);
        let err = service
            .record_bid_allocation(5, 2, dec!(25.00))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Invariant(InvariantError::AllocationExceedsAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_bid_allocation_rejects_nonpositive_amount() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![target_bid(2)]])
            .append_query_results([Vec::<donation_bids::Model>::new()])
            .append_query_results([Vec::<prize_tickets::Model>::new()])
            // second attempt
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![target_bid(2)]])
            .append_query_results([Vec::<donation_bids::Model>::new()])
            .append_query_results([Vec::<prize_tickets::Model>::new()])
            .into_connection();

        let service = DonationService::new(db, None);
        let err = service
            .record_bid_allocation(5, 2, dec!(-10.00))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // sub-cent dust rounds away to nothing
        let err = service
            .record_bid_allocation(5, 2, dec!(0.004))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_record_bid_allocation_rejects_closed_bid() {
        let closed = bids::Model {
            state: BidState::Closed,
            ..target_bid(2)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![closed]])
            .into_connection();

        let service = DonationService::new(db, None);
        let err = service
            .record_bid_allocation(5, 2, dec!(10.00))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_record_ticket_allocation_rejects_nonpositive_amount() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![ticket_prize(3)]])
            .append_query_results([Vec::<donation_bids::Model>::new()])
            .append_query_results([Vec::<prize_tickets::Model>::new()])
            .into_connection();

        let service = DonationService::new(db, None);
        let err = service
            .record_ticket_allocation(5, 3, dec!(0.00))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_record_bid_allocation_inserts_and_recomputes() {
        let new_row = bid_alloc(100, 5, 2, dec!(20.00));
        let recomputed = bids::Model {
            total: dec!(20.00),
            count: 1,
            ..target_bid(2)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![target_bid(2)]])
            .append_query_results([Vec::<donation_bids::Model>::new()])
            .append_query_results([Vec::<prize_tickets::Model>::new()])
            // insert returns the new allocation
            .append_query_results([vec![new_row.clone()]])
            // bid recompute: bid, children, allocations, completed donations, update
            .append_query_results([vec![target_bid(2)]])
            .append_query_results([Vec::<bids::Model>::new()])
            .append_query_results([vec![new_row.clone()]])
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .append_query_results([vec![recomputed]])
            .into_connection();

        let service = DonationService::new(db, None);
        let saved = service
            .record_bid_allocation(5, 2, dec!(20.00))
            .await
            .unwrap();
        assert_eq!(saved, new_row);
    }

    #[tokio::test]
    async fn test_set_transaction_state_same_state_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Completed)]])
            .into_connection();

        let service = DonationService::new(db, None);
        let out = service
            .set_transaction_state(5, TransactionState::Completed)
            .await
            .unwrap();
        assert_eq!(out.state, TransactionState::Completed);
    }

    #[tokio::test]
    async fn test_delete_refused_once_donor_attached() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![donation(5, dec!(50.00), TransactionState::Pending)]])
            .into_connection();

        let service = DonationService::new(db, None);
        let err = service.delete_donation(5).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_allocations_then_row() {
        let mut d = donation(5, dec!(50.00), TransactionState::Pending);
        d.donor_id = None;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![d]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = DonationService::new(db, None);
        service.delete_donation(5).await.unwrap();
    }
}
