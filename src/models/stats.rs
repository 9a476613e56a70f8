use rust_decimal::Decimal;
use serde::Serialize;

/// Sum/count/max/avg over a set of completed-donation amounts. This is
/// the whole content of a donor-cache row; computing it in one fold keeps
/// the cache service trivial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationStats {
    pub total: Decimal,
    pub count: i32,
    pub max: Decimal,
    pub avg: Decimal,
}

impl DonationStats {
    pub fn from_amounts<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let mut total = Decimal::ZERO;
        let mut count = 0i32;
        let mut max = Decimal::ZERO;
        for amount in amounts {
            total += amount;
            count += 1;
            if amount > max {
                max = amount;
            }
        }
        let avg = if count > 0 {
            (total / Decimal::from(count)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        DonationStats {
            total,
            count,
            max,
            avg,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fold_over_amounts() {
        let stats = DonationStats::from_amounts([dec!(10.00), dec!(25.50), dec!(4.50)]);
        assert_eq!(stats.total, dec!(40.00));
        assert_eq!(stats.count, 3);
        assert_eq!(stats.max, dec!(25.50));
        assert_eq!(stats.avg, dec!(13.33));
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let stats = DonationStats::from_amounts([]);
        assert!(stats.is_empty());
        assert_eq!(stats.total, Decimal::ZERO);
        assert_eq!(stats.avg, Decimal::ZERO);
    }

    #[test]
    fn test_single_amount() {
        let stats = DonationStats::from_amounts([dec!(5.00)]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.max, dec!(5.00));
        assert_eq!(stats.avg, dec!(5.00));
    }
}
