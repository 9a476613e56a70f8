use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entities::{
    country_region_entity as country_regions, donation_entity as donations,
    donor_entity as donors, donor_prize_entry_entity as donor_prize_entries,
    event_allowed_country_entity as event_allowed_countries,
    event_disallowed_region_entity as event_disallowed_regions, prize_entity as prizes,
    prize_allowed_country_entity as prize_allowed_countries,
    prize_disallowed_region_entity as prize_disallowed_regions,
    prize_ticket_entity as prize_tickets, prize_winner_entity as prize_winners,
    speed_run_entity as speed_runs,
};
use crate::error::{AppError, AppResult, DrawingError};
use crate::models::{
    DrawMethod, DrawResult, DrawSummary, EligibleEntrant, ShippingState, TransactionState,
};
use crate::utils::{pick_weighted_index, weight_units};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QuerySelect, Set, TransactionTrait,
};

type DrawWindow = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

/// Start/end of a prize's qualification window. Run anchors take
/// precedence over the explicit times; an anchor pointing at an
/// unscheduled run leaves that side unbounded.
fn resolve_draw_window(prize: &prizes::Model, runs: &[speed_runs::Model]) -> DrawWindow {
    let run = |id: Option<i64>| id.and_then(|id| runs.iter().find(|r| r.id == id));
    let start = match run(prize.start_run_id) {
        Some(r) => r.starttime,
        None => prize.starttime,
    };
    let end = match run(prize.end_run_id) {
        Some(r) => r.endtime,
        None => prize.endtime,
    };
    (start, end)
}

/// Both bounds inclusive.
fn within_window(time: DateTime<Utc>, window: DrawWindow) -> bool {
    let (start, end) = window;
    if let Some(start) = start
        && time < start
    {
        return false;
    }
    if let Some(end) = end
        && time > end
    {
        return false;
    }
    true
}

/// Shipping restrictions resolved to id sets. An empty allowed list means
/// no country restriction; region names match case-insensitively.
struct CountryRules {
    allowed_countries: Option<HashSet<i64>>,
    disallowed_regions: HashSet<(i64, String)>,
}

impl CountryRules {
    fn permits(&self, country_id: Option<i64>, state: &str) -> bool {
        if let Some(allowed) = &self.allowed_countries {
            match country_id {
                Some(id) if allowed.contains(&id) => {}
                _ => return false,
            }
        }
        if let Some(id) = country_id
            && self
                .disallowed_regions
                .contains(&(id, state.to_lowercase()))
        {
            return false;
        }
        true
    }
}

/// Donors barred from another win: their record already holds
/// `maxmultiwin` non-declined offers.
fn blocked_donors(winners: &[prize_winners::Model], max_multi_win: i32) -> HashSet<i64> {
    winners
        .iter()
        .filter(|w| w.counts_toward_limit() >= max_multi_win)
        .map(|w| w.winner_id)
        .collect()
}

/// Sample winners until one survives the late eligibility re-check.
/// Rejected candidates leave the pool; the loop is bounded so a draw can
/// never spin forever.
fn run_selection<R: Rng, F: Fn(i64) -> bool>(
    mut pool: Vec<EligibleEntrant>,
    still_eligible: F,
    rng: &mut R,
    max_attempts: u32,
) -> Result<i64, DrawingError> {
    for _ in 0..max_attempts {
        let weights: Vec<i64> = pool.iter().map(|e| weight_units(e.weight)).collect();
        let Some(idx) = pick_weighted_index(&weights, rng) else {
            return Err(DrawingError::NoEligibleEntrants);
        };
        let candidate = pool[idx].donor_id;
        if still_eligible(candidate) {
            return Ok(candidate);
        }
        pool.remove(idx);
    }
    Err(DrawingError::SelectionRejectedRetriesExceeded {
        attempts: max_attempts,
    })
}

/// Everything a pool computation reads, loaded up front inside the draw
/// transaction so the projection itself stays pure.
struct PoolContext {
    prize: prizes::Model,
    winners: Vec<prize_winners::Model>,
    window: DrawWindow,
    /// COMPLETED, non-test rows; the event's for RANDOM/SUM, the ticket
    /// donations for TICKETS.
    donations: Vec<donations::Model>,
    tickets: Vec<prize_tickets::Model>,
    direct_entries: Vec<donor_prize_entries::Model>,
    country_rules: Option<CountryRules>,
    donor_addresses: HashMap<i64, (Option<i64>, String)>,
}

impl PoolContext {
    /// The eligible pool, ordered by donor id.
    fn eligible_pool(&self) -> Vec<EligibleEntrant> {
        let mut weights: BTreeMap<i64, Decimal> = BTreeMap::new();
        match self.prize.draw_method {
            DrawMethod::Tickets => {
                let donation_donors: HashMap<i64, i64> = self
                    .donations
                    .iter()
                    .filter_map(|d| d.donor_id.map(|donor| (d.id, donor)))
                    .collect();
                for ticket in &self.tickets {
                    if let Some(&donor) = donation_donors.get(&ticket.donation_id) {
                        *weights.entry(donor).or_insert(Decimal::ZERO) += ticket.amount;
                    }
                }
            }
            DrawMethod::Random | DrawMethod::SumDonations => {
                let mut totals: BTreeMap<i64, Decimal> = BTreeMap::new();
                for donation in &self.donations {
                    let Some(donor) = donation.donor_id else {
                        continue;
                    };
                    if !within_window(donation.time_received, self.window) {
                        continue;
                    }
                    *totals.entry(donor).or_insert(Decimal::ZERO) += donation.amount;
                }
                for (donor, total) in totals {
                    if self.prize.accepts_total(total) {
                        let weight = match self.prize.draw_method {
                            DrawMethod::Random => Decimal::ONE,
                            _ => total,
                        };
                        weights.insert(donor, weight);
                    }
                }
                // Direct entries qualify donors the donation fold missed.
                for entry in &self.direct_entries {
                    weights.entry(entry.donor_id).or_insert(entry.weight);
                }
            }
        }

        let blocked = blocked_donors(&self.winners, self.prize.max_multi_win);
        weights
            .into_iter()
            .filter(|(donor, weight)| {
                *weight > Decimal::ZERO
                    && !blocked.contains(donor)
                    && self.country_permits(*donor)
            })
            .map(|(donor_id, weight)| EligibleEntrant { donor_id, weight })
            .collect()
    }

    fn country_permits(&self, donor_id: i64) -> bool {
        let Some(rules) = &self.country_rules else {
            return true;
        };
        let (country, state) = self
            .donor_addresses
            .get(&donor_id)
            .map(|(c, s)| (*c, s.as_str()))
            .unwrap_or((None, ""));
        rules.permits(country, state)
    }

    fn still_eligible(&self, donor_id: i64) -> bool {
        !blocked_donors(&self.winners, self.prize.max_multi_win).contains(&donor_id)
    }
}

/// Draws prize winners. Each draw locks the prize row, computes the pool
/// fresh, samples by weight, and records the winner, all in one
/// transaction; drawing failures ride back inside the `DrawResult` while
/// persistence faults abort the transaction whole.
pub struct DrawingService {
    pool: DatabaseConnection,
    max_selection_attempts: u32,
}

impl DrawingService {
    pub fn new(pool: DatabaseConnection, max_selection_attempts: u32) -> Self {
        Self {
            pool,
            max_selection_attempts,
        }
    }

    /// Draw one winner for a prize. A seed makes the draw reproducible
    /// for audited replays; otherwise the RNG comes from OS entropy.
    pub async fn draw_prize(&self, prize_id: i64, seed: Option<u64>) -> AppResult<DrawResult> {
        let txn = self.pool.begin().await?;

        let prize = prizes::Entity::find_by_id(prize_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("prize {prize_id}")))?;
        let winners = prize_winners::Entity::find()
            .filter(prize_winners::Column::PrizeId.eq(prize.id))
            .all(&txn)
            .await?;

        let current: i32 = winners.iter().map(|w| w.counts_toward_limit()).sum();
        if current >= prize.max_winners {
            return Ok(DrawResult::failed(
                DrawingError::PrizeExhausted {
                    current,
                    max: prize.max_winners,
                },
                0,
            ));
        }

        let ctx = self.load_pool_context(&txn, prize, winners).await?;
        let pool = ctx.eligible_pool();
        let eligible_count = pool.len();
        if pool.is_empty() {
            return Ok(DrawResult::failed(DrawingError::NoEligibleEntrants, 0));
        }

        let mut rng: StdRng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let picked = match run_selection(
            pool,
            |donor| ctx.still_eligible(donor),
            &mut rng,
            self.max_selection_attempts,
        ) {
            Ok(donor_id) => donor_id,
            Err(err) => {
                log::warn!("prize {} draw failed: {err}", ctx.prize.id);
                return Ok(DrawResult::failed(err, eligible_count));
            }
        };

        let winner = self.record_winner_tx(&txn, ctx.prize.id, picked).await?;
        txn.commit().await?;
        log::info!(
            "prize {} drawn: donor {picked} from a pool of {eligible_count}",
            ctx.prize.id
        );
        Ok(DrawResult::won(winner.into(), eligible_count))
    }

    /// Draw repeatedly, stopping at the first failure or after `count`
    /// wins. Each iteration advances the seed so repeat winners stay
    /// possible where `maxmultiwin` allows them.
    pub async fn draw_prize_winners(
        &self,
        prize_id: i64,
        count: Option<u32>,
        seed: Option<u64>,
    ) -> AppResult<DrawSummary> {
        let mut winners = Vec::new();
        let mut error = None;
        let mut iteration: u32 = 0;
        loop {
            if let Some(count) = count
                && iteration >= count
            {
                break;
            }
            let result = self
                .draw_prize(prize_id, seed.map(|s| s.wrapping_add(u64::from(iteration))))
                .await?;
            match result.winner {
                Some(winner) if result.success => winners.push(winner),
                _ => {
                    error = result.error;
                    break;
                }
            }
            iteration += 1;
        }
        Ok(DrawSummary { winners, error })
    }

    /// Read-only pool preview, same projection and ordering a draw uses.
    pub async fn eligible_entrants(&self, prize_id: i64) -> AppResult<Vec<EligibleEntrant>> {
        let prize = prizes::Entity::find_by_id(prize_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("prize {prize_id}")))?;
        let winners = prize_winners::Entity::find()
            .filter(prize_winners::Column::PrizeId.eq(prize.id))
            .all(&self.pool)
            .await?;
        let ctx = self.load_pool_context(&self.pool, prize, winners).await?;
        Ok(ctx.eligible_pool())
    }

    async fn load_pool_context<C: ConnectionTrait>(
        &self,
        db: &C,
        prize: prizes::Model,
        winners: Vec<prize_winners::Model>,
    ) -> AppResult<PoolContext> {
        let mut window = (None, None);
        let mut donation_rows = Vec::new();
        let mut tickets = Vec::new();
        let mut direct_entries = Vec::new();

        match prize.draw_method {
            DrawMethod::Tickets => {
                tickets = prize_tickets::Entity::find()
                    .filter(prize_tickets::Column::PrizeId.eq(prize.id))
                    .all(db)
                    .await?;
                let donation_ids: Vec<i64> = tickets.iter().map(|t| t.donation_id).collect();
                if !donation_ids.is_empty() {
                    donation_rows = donations::Entity::find()
                        .filter(donations::Column::Id.is_in(donation_ids))
                        .filter(donations::Column::State.eq(TransactionState::Completed))
                        .filter(donations::Column::TestDonation.eq(false))
                        .all(db)
                        .await?;
                }
            }
            DrawMethod::Random | DrawMethod::SumDonations => {
                let run_ids: Vec<i64> = prize
                    .start_run_id
                    .into_iter()
                    .chain(prize.end_run_id)
                    .collect();
                let runs = if run_ids.is_empty() {
                    Vec::new()
                } else {
                    speed_runs::Entity::find()
                        .filter(speed_runs::Column::Id.is_in(run_ids))
                        .all(db)
                        .await?
                };
                window = resolve_draw_window(&prize, &runs);
                donation_rows = donations::Entity::find()
                    .filter(donations::Column::EventId.eq(prize.event_id))
                    .filter(donations::Column::State.eq(TransactionState::Completed))
                    .filter(donations::Column::TestDonation.eq(false))
                    .all(db)
                    .await?;
                direct_entries = donor_prize_entries::Entity::find()
                    .filter(donor_prize_entries::Column::PrizeId.eq(prize.id))
                    .all(db)
                    .await?;
            }
        }

        let mut country_rules = None;
        let mut donor_addresses = HashMap::new();
        if prize.requires_shipping {
            let (allowed_ids, region_ids) = if prize.custom_country_filter {
                let allowed: Vec<i64> = prize_allowed_countries::Entity::find()
                    .filter(prize_allowed_countries::Column::PrizeId.eq(prize.id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.country_id)
                    .collect();
                let regions: Vec<i64> = prize_disallowed_regions::Entity::find()
                    .filter(prize_disallowed_regions::Column::PrizeId.eq(prize.id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.region_id)
                    .collect();
                (allowed, regions)
            } else {
                let allowed: Vec<i64> = event_allowed_countries::Entity::find()
                    .filter(event_allowed_countries::Column::EventId.eq(prize.event_id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.country_id)
                    .collect();
                let regions: Vec<i64> = event_disallowed_regions::Entity::find()
                    .filter(event_disallowed_regions::Column::EventId.eq(prize.event_id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.region_id)
                    .collect();
                (allowed, regions)
            };

            let disallowed_regions: HashSet<(i64, String)> = if region_ids.is_empty() {
                HashSet::new()
            } else {
                country_regions::Entity::find()
                    .filter(country_regions::Column::Id.is_in(region_ids))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|r| (r.country_id, r.name.to_lowercase()))
                    .collect()
            };
            country_rules = Some(CountryRules {
                allowed_countries: if allowed_ids.is_empty() {
                    None
                } else {
                    Some(allowed_ids.into_iter().collect())
                },
                disallowed_regions,
            });

            let mut donor_ids: HashSet<i64> = donation_rows
                .iter()
                .filter_map(|d| d.donor_id)
                .collect();
            donor_ids.extend(direct_entries.iter().map(|e| e.donor_id));
            if !donor_ids.is_empty() {
                donor_addresses = donors::Entity::find()
                    .filter(donors::Column::Id.is_in(donor_ids))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|d| (d.id, (d.address_country_id, d.address_state.to_lowercase())))
                    .collect();
            }
        }

        Ok(PoolContext {
            prize,
            winners,
            window,
            donations: donation_rows,
            tickets,
            direct_entries,
            country_rules,
            donor_addresses,
        })
    }

    /// Get-or-create the (prize, donor) winner record and add one pending
    /// offer. Re-rolled donors reuse their row, so the counters keep the
    /// full offer history.
    async fn record_winner_tx<C: ConnectionTrait>(
        &self,
        db: &C,
        prize_id: i64,
        donor_id: i64,
    ) -> AppResult<prize_winners::Model> {
        let existing = prize_winners::Entity::find()
            .filter(prize_winners::Column::PrizeId.eq(prize_id))
            .filter(prize_winners::Column::WinnerId.eq(donor_id))
            .one(db)
            .await?;
        let saved = match existing {
            Some(row) => {
                let pending = row.pending_count + 1;
                let mut am = row.into_active_model();
                am.pending_count = Set(pending);
                am.email_sent = Set(false);
                am.update(db).await?
            }
            None => {
                prize_winners::ActiveModel {
                    winner_id: Set(donor_id),
                    prize_id: Set(prize_id),
                    pending_count: Set(1),
                    accept_count: Set(0),
                    decline_count: Set(0),
                    email_sent: Set(false),
                    accept_email_sent_count: Set(0),
                    accept_deadline: Set(None),
                    shipping_state: Set(ShippingState::Pending),
                    shipping_email_sent: Set(false),
                    tracking_number: Set(String::new()),
                    shipping_cost: Set(None),
                    winner_notes: Set(String::new()),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CommentLanguage, CommentState, DonationDomain, PrizeState, ReadState,
    };
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn prize(draw_method: DrawMethod) -> prizes::Model {
        prizes::Model {
            id: 1,
            event_id: 1,
            name: "Handmade Plush".to_string(),
            description: String::new(),
            image: String::new(),
            minimum_bid: dec!(1.00),
            maximum_bid: None,
            draw_method,
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

    fn donation(id: i64, donor_id: i64, amount: Decimal, hour: u32) -> donations::Model {
        donations::Model {
            id,
            donor_id: Some(donor_id),
            event_id: 1,
            domain: DonationDomain::PayPal,
            domain_id: format!("txn-{id}"),
            state: TransactionState::Completed,
            amount,
            fee: dec!(0.00),
            currency: "USD".to_string(),
            time_received: Utc.with_ymd_and_hms(2024, 1, 10, hour, 0, 0).unwrap(),
            comment: String::new(),
            comment_state: CommentState::Absent,
            comment_language: CommentLanguage::Unknown,
            read_state: ReadState::Ready,
            test_donation: false,
            mod_comments: String::new(),
        }
    }

    fn winner_row(donor_id: i64, pending: i32, accept: i32, decline: i32) -> prize_winners::Model {
        prize_winners::Model {
            id: donor_id * 100,
            winner_id: donor_id,
            prize_id: 1,
            pending_count: pending,
            accept_count: accept,
            decline_count: decline,
            email_sent: false,
            accept_email_sent_count: 0,
            accept_deadline: None,
            shipping_state: ShippingState::Pending,
            shipping_email_sent: false,
            tracking_number: String::new(),
            shipping_cost: None,
            winner_notes: String::new(),
        }
    }

    fn ctx(prize: prizes::Model) -> PoolContext {
        PoolContext {
            prize,
            winners: Vec::new(),
            window: (None, None),
            donations: Vec::new(),
            tickets: Vec::new(),
            direct_entries: Vec::new(),
            country_rules: None,
            donor_addresses: HashMap::new(),
        }
    }

    fn entrant(donor_id: i64, weight: Decimal) -> EligibleEntrant {
        EligibleEntrant { donor_id, weight }
    }

    #[test]
    fn test_single_eligible_donor_always_wins() {
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = run_selection(
                vec![entrant(7, dec!(1.00))],
                |_| true,
                &mut rng,
                5,
            )
            .unwrap();
            assert_eq!(picked, 7);
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_winner() {
        let pool: Vec<EligibleEntrant> =
            (1..=5).map(|d| entrant(d, dec!(1.00))).collect();
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        let a = run_selection(pool.clone(), |_| true, &mut first, 5).unwrap();
        let b = run_selection(pool, |_| true, &mut second, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sum_method_weights_by_total_inside_band() {
        let mut p = prize(DrawMethod::SumDonations);
        p.minimum_bid = dec!(5.00);
        let mut c = ctx(p);
        c.donations = vec![
            donation(1, 1, dec!(2.00), 10),
            donation(2, 1, dec!(2.00), 11),
            donation(3, 2, dec!(20.00), 12),
        ];
        let pool = c.eligible_pool();
        // donor 1 totals 4.00, below the band
        assert_eq!(pool, vec![entrant(2, dec!(20.00))]);
    }

    #[test]
    fn test_random_method_gives_unit_weights() {
        let mut c = ctx(prize(DrawMethod::Random));
        c.donations = vec![
            donation(1, 1, dec!(2.00), 10),
            donation(2, 2, dec!(200.00), 11),
        ];
        let pool = c.eligible_pool();
        assert_eq!(
            pool,
            vec![entrant(1, dec!(1.00)), entrant(2, dec!(1.00))]
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let mut c = ctx(prize(DrawMethod::Random));
        c.window = (Some(start), Some(end));
        c.donations = vec![
            donation(1, 1, dec!(5.00), 9),
            donation(2, 2, dec!(5.00), 10),
            donation(3, 3, dec!(5.00), 12),
            donation(4, 4, dec!(5.00), 13),
        ];
        let pool = c.eligible_pool();
        let donors: Vec<i64> = pool.iter().map(|e| e.donor_id).collect();
        assert_eq!(donors, vec![2, 3]);
    }

    #[test]
    fn test_run_anchor_takes_precedence_over_explicit_time() {
        let mut p = prize(DrawMethod::Random);
        p.start_run_id = Some(4);
        p.starttime = Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap());
        let run = speed_runs::Model {
            id: 4,
            event_id: 1,
            name: "Any%".to_string(),
            category: None,
            order: Some(1),
            starttime: Some(Utc.with_ymd_and_hms(2024, 1, 10, 11, 0, 0).unwrap()),
            endtime: Some(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()),
        };
        let (start, end) = resolve_draw_window(&p, &[run]);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 10, 11, 0, 0).single());
        assert_eq!(end, None);
    }

    #[test]
    fn test_ticket_pool_sums_per_donor_and_skips_uncompleted() {
        let mut c = ctx(prize(DrawMethod::Tickets));
        c.tickets = vec![
            prize_tickets::Model {
                id: 1,
                donation_id: 1,
                prize_id: 1,
                amount: dec!(10.00),
            },
            prize_tickets::Model {
                id: 2,
                donation_id: 2,
                prize_id: 1,
                amount: dec!(5.00),
            },
            // donation 3 is not in the completed set
            prize_tickets::Model {
                id: 3,
                donation_id: 3,
                prize_id: 1,
                amount: dec!(50.00),
            },
        ];
        c.donations = vec![
            donation(1, 1, dec!(10.00), 10),
            donation(2, 1, dec!(5.00), 11),
        ];
        let pool = c.eligible_pool();
        assert_eq!(pool, vec![entrant(1, dec!(15.00))]);
    }

    #[test]
    fn test_direct_entries_extend_but_never_override() {
        let mut c = ctx(prize(DrawMethod::SumDonations));
        c.donations = vec![donation(1, 1, dec!(10.00), 10)];
        c.direct_entries = vec![
            donor_prize_entries::Model {
                id: 1,
                donor_id: 1,
                prize_id: 1,
                weight: dec!(99.00),
            },
            donor_prize_entries::Model {
                id: 2,
                donor_id: 3,
                prize_id: 1,
                weight: dec!(1.00),
            },
        ];
        let pool = c.eligible_pool();
        assert_eq!(
            pool,
            vec![entrant(1, dec!(10.00)), entrant(3, dec!(1.00))]
        );
    }

    #[test]
    fn test_nondeclined_winner_blocked_at_max_multi_win_one() {
        let mut c = ctx(prize(DrawMethod::Random));
        c.donations = vec![
            donation(1, 1, dec!(5.00), 10),
            donation(2, 2, dec!(5.00), 11),
        ];
        c.winners = vec![winner_row(1, 1, 0, 0)];
        let donors: Vec<i64> = c.eligible_pool().iter().map(|e| e.donor_id).collect();
        assert_eq!(donors, vec![2]);

        // a purely declined record re-enters the pool
        c.winners = vec![winner_row(1, 0, 0, 3)];
        let donors: Vec<i64> = c.eligible_pool().iter().map(|e| e.donor_id).collect();
        assert_eq!(donors, vec![1, 2]);
    }

    #[test]
    fn test_higher_max_multi_win_admits_repeats() {
        let mut p = prize(DrawMethod::Random);
        p.max_winners = 5;
        p.max_multi_win = 2;
        let mut c = ctx(p);
        c.donations = vec![donation(1, 1, dec!(5.00), 10)];
        c.winners = vec![winner_row(1, 1, 0, 0)];
        assert_eq!(c.eligible_pool().len(), 1);

        c.winners = vec![winner_row(1, 1, 1, 0)];
        assert!(c.eligible_pool().is_empty());
    }

    #[test]
    fn test_sequential_draws_never_repeat_a_donor() {
        let base = {
            let mut p = prize(DrawMethod::Random);
            p.max_winners = 2;
            p
        };
        for seed in 0..32 {
            let mut c = ctx(base.clone());
            c.donations = (1..=5)
                .map(|d| donation(d, d, dec!(5.00), 10))
                .collect();

            let mut rng = StdRng::seed_from_u64(seed);
            let first =
                run_selection(c.eligible_pool(), |d| c.still_eligible(d), &mut rng, 5).unwrap();

            c.winners = vec![winner_row(first, 1, 0, 0)];
            let second =
                run_selection(c.eligible_pool(), |d| c.still_eligible(d), &mut rng, 5).unwrap();
            assert_ne!(first, second);
        }
    }

    #[test]
    fn test_country_rules() {
        let rules = CountryRules {
            allowed_countries: Some([10].into_iter().collect()),
            disallowed_regions: [(10, "oregon".to_string())].into_iter().collect(),
        };
        assert!(rules.permits(Some(10), "texas"));
        assert!(!rules.permits(Some(10), "Oregon"));
        assert!(!rules.permits(Some(20), "anywhere"));
        assert!(!rules.permits(None, ""));

        let open = CountryRules {
            allowed_countries: None,
            disallowed_regions: HashSet::new(),
        };
        assert!(open.permits(None, ""));
        assert!(open.permits(Some(20), "anywhere"));
    }

    #[test]
    fn test_rejection_loop_is_bounded() {
        let pool: Vec<EligibleEntrant> =
            (1..=6).map(|d| entrant(d, dec!(1.00))).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_selection(pool, |_| false, &mut rng, 5).unwrap_err();
        assert_eq!(
            err,
            DrawingError::SelectionRejectedRetriesExceeded { attempts: 5 }
        );

        // a small pool drains before the cap and reports emptiness instead
        let pool: Vec<EligibleEntrant> = (1..=2).map(|d| entrant(d, dec!(1.00))).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_selection(pool, |_| false, &mut rng, 5).unwrap_err();
        assert_eq!(err, DrawingError::NoEligibleEntrants);
    }

    #[tokio::test]
    async fn test_draw_reports_exhausted_capacity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![prize(DrawMethod::Random)]])
            .append_query_results([vec![winner_row(1, 0, 1, 0)]])
            .into_connection();

        let service = DrawingService::new(db, 5);
        let result = service.draw_prize(1, Some(1)).await.unwrap();
        assert!(!result.success);
        assert_eq!(
            result.error,
            Some(DrawingError::PrizeExhausted { current: 1, max: 1 })
        );
    }

    #[tokio::test]
    async fn test_draw_reports_empty_pool() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![prize(DrawMethod::Random)]])
            .append_query_results([Vec::<prize_winners::Model>::new()])
            .append_query_results([Vec::<donations::Model>::new()])
            .append_query_results([Vec::<donor_prize_entries::Model>::new()])
            .into_connection();

        let service = DrawingService::new(db, 5);
        let result = service.draw_prize(1, Some(1)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error, Some(DrawingError::NoEligibleEntrants));
        assert_eq!(result.eligible_count, 0);
    }

    #[tokio::test]
    async fn test_ticket_draw_records_winner() {
        let inserted = winner_row(5, 1, 0, 0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![prize(DrawMethod::Tickets)]])
            .append_query_results([Vec::<prize_winners::Model>::new()])
            .append_query_results([vec![prize_tickets::Model {
                id: 1,
                donation_id: 100,
                prize_id: 1,
                amount: dec!(10.00),
            }]])
            .append_query_results([vec![donation(100, 5, dec!(10.00), 10)]])
            // get-or-create: no existing row, insert returns it
            .append_query_results([Vec::<prize_winners::Model>::new()])
            .append_query_results([vec![inserted.clone()]])
            .into_connection();

        let service = DrawingService::new(db, 5);
        let result = service.draw_prize(1, Some(9)).await.unwrap();
        assert!(result.success);
        assert_eq!(result.eligible_count, 1);
        let winner = result.winner.unwrap();
        assert_eq!(winner.donor_id, 5);
        assert_eq!(winner.pending_count, 1);
    }

    #[tokio::test]
    async fn test_reroll_bumps_existing_record() {
        let existing = winner_row(5, 0, 0, 1);
        let bumped = winner_row(5, 1, 0, 1);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![prize(DrawMethod::Tickets)]])
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![prize_tickets::Model {
                id: 1,
                donation_id: 100,
                prize_id: 1,
                amount: dec!(10.00),
            }]])
            .append_query_results([vec![donation(100, 5, dec!(10.00), 10)]])
            .append_query_results([vec![existing]])
            .append_query_results([vec![bumped.clone()]])
            .into_connection();

        let service = DrawingService::new(db, 5);
        let result = service.draw_prize(1, Some(9)).await.unwrap();
        assert!(result.success);
        let winner = result.winner.unwrap();
        assert_eq!(winner.pending_count, 1);
        assert_eq!(winner.winner_record_id, bumped.id);
    }
}
