use rust_decimal::Decimal;
use serde::Serialize;

use crate::entities::prize_winner_entity;
use crate::error::DrawingError;

/// One donor in a prize's eligible pool, with the weight the sampler
/// will use. Pools are ordered by donor id so replays line up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibleEntrant {
    pub donor_id: i64,
    pub weight: Decimal,
}

/// The winner row as the caller sees it right after a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnWinner {
    pub winner_record_id: i64,
    pub donor_id: i64,
    pub prize_id: i64,
    pub pending_count: i32,
}

impl From<prize_winner_entity::Model> for DrawnWinner {
    fn from(m: prize_winner_entity::Model) -> Self {
        DrawnWinner {
            winner_record_id: m.id,
            donor_id: m.winner_id,
            prize_id: m.prize_id,
            pending_count: m.pending_count,
        }
    }
}

/// Outcome of a single draw attempt. Drawing failures ride inside this
/// struct with `success: false`; persistence faults surface as errors
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawResult {
    pub success: bool,
    pub winner: Option<DrawnWinner>,
    pub eligible_count: usize,
    pub error: Option<DrawingError>,
}

impl DrawResult {
    pub fn won(winner: DrawnWinner, eligible_count: usize) -> Self {
        DrawResult {
            success: true,
            winner: Some(winner),
            eligible_count,
            error: None,
        }
    }

    pub fn failed(error: DrawingError, eligible_count: usize) -> Self {
        DrawResult {
            success: false,
            winner: None,
            eligible_count,
            error: Some(error),
        }
    }
}

/// Result of a multi-winner draw loop: everyone drawn before the loop
/// stopped, and the failure that stopped it early, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawSummary {
    pub winners: Vec<DrawnWinner>,
    pub error: Option<DrawingError>,
}

impl DrawSummary {
    pub fn drawn(&self) -> usize {
        self.winners.len()
    }
}
