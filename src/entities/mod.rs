pub mod bids;
pub mod countries;
pub mod country_regions;
pub mod donation_bids;
pub mod donations;
pub mod donor_caches;
pub mod donor_prize_entries;
pub mod donors;
pub mod event_allowed_countries;
pub mod event_disallowed_regions;
pub mod events;
pub mod prize_allowed_countries;
pub mod prize_disallowed_regions;
pub mod prize_tickets;
pub mod prize_winners;
pub mod prizes;
pub mod speed_runs;

pub use bids as bid_entity;
pub use countries as country_entity;
pub use country_regions as country_region_entity;
pub use donation_bids as donation_bid_entity;
pub use donations as donation_entity;
pub use donor_caches as donor_cache_entity;
pub use donor_prize_entries as donor_prize_entry_entity;
pub use donors as donor_entity;
pub use event_allowed_countries as event_allowed_country_entity;
pub use event_disallowed_regions as event_disallowed_region_entity;
pub use events as event_entity;
pub use prize_allowed_countries as prize_allowed_country_entity;
pub use prize_disallowed_regions as prize_disallowed_region_entity;
pub use prize_tickets as prize_ticket_entity;
pub use prize_winners as prize_winner_entity;
pub use prizes as prize_entity;
pub use speed_runs as speed_run_entity;
