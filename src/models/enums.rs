use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

/// Lifecycle of a donation's money. Stored as the short uppercase codes
/// the ledger has always used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionState {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "FLAGGED")]
    Flagged,
}

impl Default for TransactionState {
    fn default() -> Self {
        TransactionState::Pending
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Pending => write!(f, "PENDING"),
            TransactionState::Completed => write!(f, "COMPLETED"),
            TransactionState::Cancelled => write!(f, "CANCELLED"),
            TransactionState::Flagged => write!(f, "FLAGGED"),
        }
    }
}

/// Where a donation came from. LOCAL rows are entered by hand at the
/// event; the rest arrive through payment processors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationDomain {
    #[sea_orm(string_value = "LOCAL")]
    Local,
    #[sea_orm(string_value = "CHIPIN")]
    ChipIn,
    #[sea_orm(string_value = "PAYPAL")]
    PayPal,
    #[sea_orm(string_value = "TILTIFY")]
    Tiltify,
}

impl std::fmt::Display for DonationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationDomain::Local => write!(f, "LOCAL"),
            DonationDomain::ChipIn => write!(f, "CHIPIN"),
            DonationDomain::PayPal => write!(f, "PAYPAL"),
            DonationDomain::Tiltify => write!(f, "TILTIFY"),
        }
    }
}

/// Detected language of a donation comment; `un` when unknown or
/// detection is disabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(2))")]
#[serde(rename_all = "lowercase")]
pub enum CommentLanguage {
    #[sea_orm(string_value = "un")]
    Unknown,
    #[sea_orm(string_value = "en")]
    English,
    #[sea_orm(string_value = "fr")]
    French,
    #[sea_orm(string_value = "de")]
    German,
}

impl Default for CommentLanguage {
    fn default() -> Self {
        CommentLanguage::Unknown
    }
}

/// Moderation state of a donation comment. ABSENT when no comment was
/// left at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentState {
    #[sea_orm(string_value = "ABSENT")]
    Absent,
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "DENIED")]
    Denied,
    #[sea_orm(string_value = "FLAGGED")]
    Flagged,
}

impl Default for CommentState {
    fn default() -> Self {
        CommentState::Absent
    }
}

/// Reader-queue state of a donation for the host/announcer screens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadState {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "IGNORED")]
    Ignored,
    #[sea_orm(string_value = "READ")]
    Read,
    #[sea_orm(string_value = "FLAGGED")]
    Flagged,
}

impl Default for ReadState {
    fn default() -> Self {
        ReadState::Ready
    }
}

/// How much of a donor's identity is shown publicly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonorVisibility {
    #[sea_orm(string_value = "FULL")]
    FullName,
    #[sea_orm(string_value = "FIRST")]
    FirstName,
    #[sea_orm(string_value = "ALIAS")]
    Alias,
    #[sea_orm(string_value = "ANON")]
    Anonymous,
}

impl Default for DonorVisibility {
    fn default() -> Self {
        DonorVisibility::FirstName
    }
}

/// Bid lifecycle. PENDING/DENIED cover donor-suggested options awaiting
/// moderation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidState {
    #[sea_orm(string_value = "OPENED")]
    Opened,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "HIDDEN")]
    Hidden,
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "DENIED")]
    Denied,
}

impl Default for BidState {
    fn default() -> Self {
        BidState::Opened
    }
}

impl std::fmt::Display for BidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BidState::Opened => write!(f, "OPENED"),
            BidState::Closed => write!(f, "CLOSED"),
            BidState::Hidden => write!(f, "HIDDEN"),
            BidState::Pending => write!(f, "PENDING"),
            BidState::Denied => write!(f, "DENIED"),
        }
    }
}

/// Moderation state of a contributed prize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrizeState {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "DENIED")]
    Denied,
    #[sea_orm(string_value = "FLAGGED")]
    Flagged,
}

impl Default for PrizeState {
    fn default() -> Self {
        PrizeState::Pending
    }
}

/// How a prize's winner pool is weighted. Replaces the historical trio of
/// sumdonations/randomdraw/ticketdraw booleans with one closed set; a
/// prize awarded by hand simply never reaches the drawing engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawMethod {
    /// Unit weight per qualifying donor.
    #[sea_orm(string_value = "RANDOM")]
    Random,
    /// Weight is the donor's qualifying-donation total in the draw window.
    #[sea_orm(string_value = "SUM")]
    SumDonations,
    /// Weight is the donor's ticket allocation total for the prize.
    #[sea_orm(string_value = "TICKETS")]
    Tickets,
}

impl std::fmt::Display for DrawMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawMethod::Random => write!(f, "RANDOM"),
            DrawMethod::SumDonations => write!(f, "SUM"),
            DrawMethod::Tickets => write!(f, "TICKETS"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingState {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
}

impl Default for ShippingState {
    fn default() -> Self {
        ShippingState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_codes_match_legacy_values() {
        use sea_orm::ActiveEnum;
        assert_eq!(TransactionState::Completed.to_value(), "COMPLETED");
        assert_eq!(DonationDomain::Local.to_value(), "LOCAL");
        assert_eq!(CommentLanguage::Unknown.to_value(), "un");
        assert_eq!(DonorVisibility::Anonymous.to_value(), "ANON");
        assert_eq!(BidState::Opened.to_value(), "OPENED");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TransactionState::default(), TransactionState::Pending);
        assert_eq!(CommentLanguage::default(), CommentLanguage::Unknown);
        assert_eq!(BidState::default(), BidState::Opened);
        assert_eq!(PrizeState::default(), PrizeState::Pending);
    }
}
