use chrono::Utc;
use log::*;

use crate::{
    db::traits::DiscountManagement,
    db_types::DiscountCode,
    fe_api::errors::{DiscountApiError, DiscountRejection},
};

/// Newsletter discount codes. A code is only valid together with the email address it was issued to.
pub struct DiscountApi<B> {
    db: B,
}

impl<B> DiscountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DiscountApi<B>
where B: DiscountManagement
{
    /// Checks that the code exists for this email, has not expired and has not been used. Nothing is written.
    pub async fn validate(&self, code: &str, email: &str) -> Result<DiscountCode, DiscountApiError> {
        validate_discount(&self.db, code, email).await
    }

    /// Marks the code as used. Returns `false` if it was already used, in which case the original `used_at` is kept.
    pub async fn mark_used(&self, code: &str, email: &str) -> Result<bool, DiscountApiError> {
        let (code, email) = normalize(code, email)?;
        let changed = self.db.mark_discount_used(&code, &email, Utc::now()).await?;
        if !changed {
            debug!("🏷️ Discount code {code} for {email} was not changed. It is either unknown or already used");
        }
        Ok(changed)
    }

    /// Validates and marks the code used in one atomic step. Of any number of concurrent calls, at most one succeeds.
    pub async fn redeem(&self, code: &str, email: &str) -> Result<DiscountCode, DiscountApiError> {
        let (code, email) = normalize(code, email)?;
        if let Some(discount) = self.db.redeem_discount(&code, &email, Utc::now()).await? {
            info!("🏷️ Discount code {code} redeemed by {email}");
            return Ok(discount);
        }
        let discount = self.db.fetch_discount(&code, &email).await?.ok_or(DiscountRejection::Invalid)?;
        let reason = match check_usable(&discount) {
            Err(reason) => reason,
            // Another redemption landed between the two statements
            Ok(()) => DiscountRejection::AlreadyUsed,
        };
        debug!("🏷️ Discount code {code} for {email} was rejected: {reason}");
        Err(reason.into())
    }
}

pub(crate) async fn validate_discount<B: DiscountManagement>(
    db: &B,
    code: &str,
    email: &str,
) -> Result<DiscountCode, DiscountApiError> {
    let (code, email) = normalize(code, email)?;
    let discount = db.fetch_discount(&code, &email).await?.ok_or(DiscountRejection::Invalid)?;
    check_usable(&discount)?;
    trace!("🏷️ Discount code {code} is valid for {email}");
    Ok(discount)
}

/// Looks up a code that is about to be spent on a new order. Unlike [`validate_discount`], a code that was redeemed up
/// front is accepted as long as it has not been spent on an order yet.
pub(crate) async fn discount_for_order<B: DiscountManagement>(
    db: &B,
    code: &str,
    email: &str,
) -> Result<DiscountCode, DiscountApiError> {
    let (code, email) = normalize(code, email)?;
    let discount = db.fetch_discount(&code, &email).await?.ok_or(DiscountRejection::Invalid)?;
    check_applicable(&discount)?;
    Ok(discount)
}

fn normalize(code: &str, email: &str) -> Result<(String, String), DiscountApiError> {
    let code = code.trim();
    let email = email.trim().to_lowercase();
    if code.is_empty() || email.is_empty() {
        return Err(DiscountApiError::MissingFields);
    }
    Ok((code.to_string(), email))
}

fn check_usable(discount: &DiscountCode) -> Result<(), DiscountRejection> {
    if discount.used {
        return Err(DiscountRejection::AlreadyUsed);
    }
    if Utc::now() >= discount.expires_at {
        return Err(DiscountRejection::Expired);
    }
    Ok(())
}

fn check_applicable(discount: &DiscountCode) -> Result<(), DiscountRejection> {
    if discount.order_id.is_some() {
        return Err(DiscountRejection::AlreadyUsed);
    }
    if Utc::now() >= discount.expires_at {
        return Err(DiscountRejection::Expired);
    }
    Ok(())
}
