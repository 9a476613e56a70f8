use std::sync::Arc;

use crate::entities::{
    donation_bid_entity as donation_bids, donation_entity as donations, donor_entity as donors,
    event_entity as events,
};
use crate::error::{AppError, AppResult, ReconciliationError};
use crate::models::{
    CommentLanguage, CommentState, DonorVisibility, PaymentNotification, ReadState,
    ReconciliationOutcome, TransactionState,
};
use crate::services::donation_service::{clean_donation, donation_active_model};
use crate::services::{BidService, DonorCacheService};
use crate::utils::LanguageDetector;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, QuerySelect, Set, TransactionTrait,
};

/// What to do with a notification, decided before any write.
#[derive(Debug, PartialEq)]
enum NotificationPlan {
    Ignore { donation_id: i64 },
    Reject(ReconciliationError),
    Flag(ReconciliationError),
    Apply,
}

/// Decide the fate of a notification from the current row and the event.
/// Rule order matters: a cross-event hit is rejected before anything
/// else, and a completed redelivery is ignored before the mismatch
/// checks get a chance to flag it.
fn plan_notification(
    existing: Option<&donations::Model>,
    n: &PaymentNotification,
    event: &events::Model,
) -> NotificationPlan {
    if let Some(existing) = existing {
        if existing.event_id != n.event_id {
            return NotificationPlan::Reject(ReconciliationError::CrossEventConflict {
                domain_id: n.domain_id.clone(),
            });
        }
        if existing.is_completed() && n.state == TransactionState::Completed {
            return NotificationPlan::Ignore {
                donation_id: existing.id,
            };
        }
        if existing.amount != n.amount {
            return NotificationPlan::Flag(ReconciliationError::AmountMismatch {
                got: n.amount,
                expected: existing.amount,
            });
        }
    }
    if n.currency != event.paypal_currency {
        return NotificationPlan::Flag(ReconciliationError::CurrencyMismatch {
            got: n.currency.clone(),
            expected: event.paypal_currency.clone(),
        });
    }
    NotificationPlan::Apply
}

/// The donation a fresh notification would create. The cleaner promotes
/// `comment_state` once it sees a non-empty comment.
fn donation_from_notification(n: &PaymentNotification, donor_id: i64) -> donations::Model {
    donations::Model {
        id: 0,
        donor_id: Some(donor_id),
        event_id: n.event_id,
        domain: n.domain.clone(),
        domain_id: n.domain_id.clone(),
        state: n.state.clone(),
        amount: n.amount,
        fee: n.fee,
        currency: n.currency.clone(),
        time_received: n.time_received,
        comment: n.comment.clone().unwrap_or_default(),
        comment_state: CommentState::Absent,
        comment_language: CommentLanguage::Unknown,
        read_state: ReadState::Pending,
        test_donation: n.test,
        mod_comments: String::new(),
    }
}

/// Applies payment-processor notifications to the ledger. Idempotent
/// under at-least-once delivery keyed by (domain, domainId); conflicts
/// are logged and reported back as outcomes, never raised, so the caller
/// can acknowledge the processor regardless.
pub struct ReconciliationService {
    pool: DatabaseConnection,
    detector: Option<Arc<dyn LanguageDetector>>,
}

impl ReconciliationService {
    pub fn new(pool: DatabaseConnection, detector: Option<Arc<dyn LanguageDetector>>) -> Self {
        Self { pool, detector }
    }

    pub async fn process_notification(
        &self,
        n: PaymentNotification,
    ) -> AppResult<ReconciliationOutcome> {
        let txn = self.pool.begin().await?;

        let existing = donations::Entity::find()
            .filter(donations::Column::Domain.eq(n.domain.clone()))
            .filter(donations::Column::DomainId.eq(n.domain_id.clone()))
            .lock_exclusive()
            .one(&txn)
            .await?;
        let event = events::Entity::find_by_id(n.event_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {}", n.event_id)))?;

        let outcome = match plan_notification(existing.as_ref(), &n, &event) {
            NotificationPlan::Ignore { donation_id } => {
                log::info!(
                    "duplicate {} notification {} ignored",
                    n.domain,
                    n.domain_id
                );
                ReconciliationOutcome::DuplicateIgnored { donation_id }
            }
            NotificationPlan::Reject(reason) => {
                log::warn!("notification {} rejected: {reason}", n.domain_id);
                ReconciliationOutcome::Rejected { reason }
            }
            NotificationPlan::Flag(reason) => self.flag_tx(&txn, existing, &n, reason).await?,
            NotificationPlan::Apply => self.apply_tx(&txn, existing, &n).await?,
        };

        txn.commit().await?;
        Ok(outcome)
    }

    /// Persist the donation FLAGGED with the conflict noted for operators.
    /// A previously counted row that gets flagged falls out of the caches
    /// and bid totals; a fresh mismatch is recorded but never counted.
    async fn flag_tx<C: ConnectionTrait>(
        &self,
        db: &C,
        existing: Option<donations::Model>,
        n: &PaymentNotification,
        reason: ReconciliationError,
    ) -> AppResult<ReconciliationOutcome> {
        let note = format!("reconciliation: {reason}");
        let saved = match existing {
            Some(row) => {
                let was_completed = row.is_completed();
                let donor_id = row.donor_id;
                let event_id = row.event_id;
                let mod_comments = if row.mod_comments.is_empty() {
                    note
                } else {
                    format!("{}\n{note}", row.mod_comments)
                };
                let mut am = row.into_active_model();
                am.state = Set(TransactionState::Flagged);
                am.mod_comments = Set(mod_comments);
                let updated = am.update(db).await?;

                if was_completed {
                    if let Some(donor_id) = donor_id {
                        DonorCacheService::recompute_for_donor_tx(db, donor_id, event_id).await?;
                    }
                    let allocations = donation_bids::Entity::find()
                        .filter(donation_bids::Column::DonationId.eq(updated.id))
                        .all(db)
                        .await?;
                    for alloc in &allocations {
                        BidService::recompute_total_tx(db, alloc.bid_id).await?;
                    }
                }
                updated
            }
            None => {
                let donor = self.resolve_donor_tx(db, n).await?;
                let mut donation = donation_from_notification(n, donor.id);
                donation.state = TransactionState::Flagged;
                donation.mod_comments = note;
                let clean = clean_donation(
                    donation,
                    &[],
                    &[],
                    None,
                    Some(&donor.email),
                    self.detector.as_deref(),
                )?;
                let mut am = donation_active_model(&clean);
                am.id = NotSet;
                am.insert(db).await?
            }
        };
        log::warn!("donation {} flagged: {reason}", saved.id);
        Ok(ReconciliationOutcome::Flagged {
            donation_id: saved.id,
            reason,
        })
    }

    /// Create or update the donation from the notification, then bring
    /// caches and bid totals up to date when the completed contribution
    /// changed.
    async fn apply_tx<C: ConnectionTrait>(
        &self,
        db: &C,
        existing: Option<donations::Model>,
        n: &PaymentNotification,
    ) -> AppResult<ReconciliationOutcome> {
        let donor = self.resolve_donor_tx(db, n).await?;

        let (model, created, was_completed) = match existing {
            Some(row) => {
                let was_completed = row.is_completed();
                let mut updated = row;
                updated.donor_id = Some(donor.id);
                updated.state = n.state.clone();
                updated.amount = n.amount;
                updated.fee = n.fee;
                updated.currency = n.currency.clone();
                updated.time_received = n.time_received;
                if let Some(comment) = &n.comment {
                    updated.comment = comment.clone();
                }
                updated.test_donation = n.test;
                (updated, false, was_completed)
            }
            None => (donation_from_notification(n, donor.id), true, false),
        };

        let clean = clean_donation(
            model,
            &[],
            &[],
            None,
            Some(&donor.email),
            self.detector.as_deref(),
        )?;
        let saved = if created {
            let mut am = donation_active_model(&clean);
            am.id = NotSet;
            am.insert(db).await?
        } else {
            donation_active_model(&clean).update(db).await?
        };

        if was_completed != saved.is_completed() {
            if let Some(donor_id) = saved.donor_id {
                DonorCacheService::recompute_for_donor_tx(db, donor_id, saved.event_id).await?;
            }
            // a row created by this very call has no allocations yet
            if !created {
                let allocations = donation_bids::Entity::find()
                    .filter(donation_bids::Column::DonationId.eq(saved.id))
                    .all(db)
                    .await?;
                for alloc in &allocations {
                    BidService::recompute_total_tx(db, alloc.bid_id).await?;
                }
            }
        }

        log::info!(
            "notification {} applied to donation {} ({})",
            n.domain_id,
            saved.id,
            if created { "created" } else { "updated" }
        );
        Ok(ReconciliationOutcome::Applied {
            donation_id: saved.id,
            created,
        })
    }

    /// Find the donor by normalized email or create a minimal record.
    async fn resolve_donor_tx<C: ConnectionTrait>(
        &self,
        db: &C,
        n: &PaymentNotification,
    ) -> AppResult<donors::Model> {
        let email = n.donor_email.trim().to_lowercase();
        let found = donors::Entity::find()
            .filter(donors::Column::Email.eq(email.clone()))
            .one(db)
            .await?;
        if let Some(donor) = found {
            return Ok(donor);
        }

        let visibility = if n.donor_alias.is_some() {
            DonorVisibility::Alias
        } else {
            DonorVisibility::Anonymous
        };
        let created = donors::ActiveModel {
            email: Set(email),
            alias: Set(n.donor_alias.clone()),
            firstname: Set(String::new()),
            lastname: Set(String::new()),
            paypal_email: Set(None),
            visibility: Set(visibility),
            address_street: Set(String::new()),
            address_city: Set(String::new()),
            address_state: Set(String::new()),
            address_zip: Set(String::new()),
            address_country_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;
        log::info!("created donor {} for notification {}", created.id, n.domain_id);
        Ok(created)
    }
}
