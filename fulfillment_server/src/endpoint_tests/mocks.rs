use chrono::{DateTime, Utc};
use fulfillment_engine::{
    db_types::{DiscountCode, NewDiscountCode, Order, PaymentProvider},
    providers::{CheckoutSession, PaymentCheck, PaymentGateway, PaymentProviderError, PaymentVerification},
    DiscountManagement,
    StoreError,
};
use mockall::mock;

mock! {
    pub DiscountStore {}
    impl DiscountManagement for DiscountStore {
        async fn insert_discount(&self, discount: NewDiscountCode) -> Result<DiscountCode, StoreError>;
        async fn fetch_discount(&self, code: &str, email: &str) -> Result<Option<DiscountCode>, StoreError>;
        async fn mark_discount_used(&self, code: &str, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;
        async fn redeem_discount(&self, code: &str, email: &str, now: DateTime<Utc>) -> Result<Option<DiscountCode>, StoreError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        fn provider(&self) -> PaymentProvider;
        async fn create_checkout(&self, order: &Order) -> Result<CheckoutSession, PaymentProviderError>;
    }
    impl PaymentVerification for Gateway {
        async fn verify_payment(&self, reference: &str) -> Result<PaymentCheck, PaymentProviderError>;
    }
}
