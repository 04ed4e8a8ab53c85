//! Coupon tiers, distance bookkeeping and redemption.
//!
//! All balance arithmetic happens inside the database so concurrent uploads
//! and claims for the same user never lose an update.

use tokio_postgres::Client;
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// One eligibility band: a balance at or above `distance` kilometers (and
/// below the next band) redeems a coupon worth `price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub price: i64,
    pub distance: i64,
}

/// Redemption bands in ascending order; the last one is open-ended.
pub const PRICE_AND_DISTANCE: [Tier; 4] = [
    Tier { price: 50, distance: 500 },
    Tier { price: 100, distance: 1000 },
    Tier { price: 150, distance: 1500 },
    Tier { price: 200, distance: 2000 },
];

/// The band a balance is eligible for: the highest tier whose threshold the
/// balance reaches. `None` below the smallest threshold.
pub fn tier_for_distance(distance: i64) -> Option<Tier> {
    PRICE_AND_DISTANCE.iter().rev().find(|t| distance >= t.distance).copied()
}

/// Add `delta` kilometers to the user's balance.
pub async fn accrue(db: &Client, user_id: i32, delta: i64) -> Result<()> {
    let updated = db
        .execute(
            "UPDATE users SET distance = distance + $2 WHERE id = $1",
            &[&user_id, &delta],
        )
        .await?;
    if updated == 0 {
        return Err(AppError::Database(format!("user {user_id} does not exist")));
    }
    info!(user_id, delta, "distance accrued");
    Ok(())
}

/// Debit exactly `amount` kilometers, refusing to drive the balance
/// negative. Returns whether the debit was applied.
pub async fn debit(db: &Client, user_id: i32, amount: i64) -> Result<bool> {
    let updated = db
        .execute(
            "UPDATE users SET distance = distance - $2 WHERE id = $1 AND distance >= $2",
            &[&user_id, &amount],
        )
        .await?;
    Ok(updated == 1)
}

pub async fn balance(db: &Client, user_id: i32) -> Result<i64> {
    let row = db
        .query_opt("SELECT distance FROM users WHERE id = $1", &[&user_id])
        .await?
        .ok_or_else(|| AppError::Database(format!("user {user_id} does not exist")))?;
    Ok(row.get(0))
}

/// A coupon assigned to a user by [`claim_for_user`].
#[derive(Debug, Clone)]
pub struct ClaimedCoupon {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub distance: i64,
}

/// Redeem the user's balance for a coupon of the matching tier.
///
/// Assignment is the atomic boundary: the conditional UPDATE claims one
/// unassigned coupon, and a lost race against a concurrent claim retries
/// with the next candidate. Once assigned the coupon is never taken back;
/// if the balance moved below the debit amount in the meantime the debit
/// is skipped and logged.
pub async fn claim_for_user(db: &Client, user_id: i32) -> Result<ClaimedCoupon> {
    let distance = balance(db, user_id).await?;
    let lowest = PRICE_AND_DISTANCE[0].distance;
    let tier = tier_for_distance(distance).ok_or(AppError::DistanceTooSmall(lowest))?;

    let coupon = loop {
        let row = db
            .query_opt(
                "SELECT id, name, price, distance FROM coupons \
                 WHERE user_id IS NULL AND distance = $1 LIMIT 1",
                &[&tier.distance],
            )
            .await?;
        let Some(row) = row else {
            return Err(AppError::NoCouponsAvailable);
        };
        let id: i32 = row.get(0);
        let claimed = db
            .execute(
                "UPDATE coupons SET user_id = $1 WHERE id = $2 AND user_id IS NULL",
                &[&user_id, &id],
            )
            .await?;
        if claimed == 1 {
            break ClaimedCoupon {
                id,
                name: row.get(1),
                price: row.get(2),
                distance: row.get(3),
            };
        }
        // another claim took this coupon between the select and the update
    };
    info!(user_id, coupon = %coupon.name, "coupon assigned");

    if !debit(db, user_id, coupon.distance).await? {
        warn!(user_id, coupon = %coupon.name, "balance moved below the tier, debit skipped");
    }
    Ok(coupon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_below_the_smallest_threshold_match_nothing() {
        assert_eq!(tier_for_distance(0), None);
        assert_eq!(tier_for_distance(400), None);
        assert_eq!(tier_for_distance(499), None);
    }

    #[test]
    fn each_band_starts_at_its_threshold() {
        assert_eq!(tier_for_distance(500), Some(PRICE_AND_DISTANCE[0]));
        assert_eq!(tier_for_distance(999), Some(PRICE_AND_DISTANCE[0]));
        assert_eq!(tier_for_distance(1000), Some(PRICE_AND_DISTANCE[1]));
        assert_eq!(tier_for_distance(1500), Some(PRICE_AND_DISTANCE[2]));
        assert_eq!(tier_for_distance(1999), Some(PRICE_AND_DISTANCE[2]));
    }

    #[test]
    fn the_top_band_is_open_ended() {
        assert_eq!(tier_for_distance(2000), Some(PRICE_AND_DISTANCE[3]));
        assert_eq!(tier_for_distance(50_000), Some(PRICE_AND_DISTANCE[3]));
    }
}
