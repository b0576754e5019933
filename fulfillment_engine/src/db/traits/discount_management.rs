use chrono::{DateTime, Utc};

use crate::{
    db::traits::StoreError,
    db_types::{DiscountCode, NewDiscountCode},
};

/// Storage for single-use newsletter discount codes. A code is bound to the email address it was issued to. Callers
/// pass emails in lower case; stored addresses are compared case-insensitively.
#[allow(async_fn_in_trait)]
pub trait DiscountManagement {
    async fn insert_discount(&self, discount: NewDiscountCode) -> Result<DiscountCode, StoreError>;

    async fn fetch_discount(&self, code: &str, email: &str) -> Result<Option<DiscountCode>, StoreError>;

    /// Sets `used` and `used_at` if the code is not used yet. Returns `true` if this call changed the record.
    async fn mark_discount_used(&self, code: &str, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Validates and marks the code in one conditional update: the code must match the email, be unused and not
    /// expired at `now`. Returns the redeemed code, or `None` if nothing matched.
    async fn redeem_discount(
        &self,
        code: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DiscountCode>, StoreError>;
}
