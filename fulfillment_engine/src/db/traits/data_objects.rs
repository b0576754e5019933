use crate::db_types::{Order, PaidOrder};

/// Outcome of the conditional `pending → paid` claim.
#[derive(Debug, Clone)]
pub enum ClaimResult {
    /// This caller moved the order to `paid` and owns the follow-up steps.
    Claimed(Order),
    /// The order was already `paid` before this call. Nothing was written.
    AlreadyPaid(Order),
    /// The order is `failed` or `canceled` and can no longer be paid.
    NotClaimable(Order),
}

#[derive(Debug, Clone)]
pub enum InsertPaidOrderResult {
    Inserted(PaidOrder),
    AlreadyExists(PaidOrder),
}

impl InsertPaidOrderResult {
    pub fn paid_order(&self) -> &PaidOrder {
        match self {
            InsertPaidOrderResult::Inserted(p) | InsertPaidOrderResult::AlreadyExists(p) => p,
        }
    }
}
