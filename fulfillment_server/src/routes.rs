//! Request handler definitions
//!
//! Define each route and it handler here. The payment webhooks live in [`crate::webhook_routes`].
//! Handlers that are more than a line or two MUST go into a separate function. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every call to the order store or to a provider is async, and must
//! stay that way.
//!
//! Handlers are generic over the order store and the providers. The server instantiates them with the SQLite store and
//! the HTTP provider clients; the endpoint tests use mocks and in-memory fakes.
use actix_web::{get, web, HttpResponse, Responder};
use fulfillment_engine::{
    db_types::OrderId,
    providers::{PaymentCheck, PaymentGateway, PaymentVerification, ShippingProvider, SubscriberProvider},
    CheckoutApi,
    DiscountApi,
    DiscountApiError,
    DiscountManagement,
    FulfillmentApi,
    NewOrderRequest,
    OrderApi,
    OrderManagement,
    OrderStore,
};
use log::*;

use crate::{
    data_objects::{
        CheckoutRequest,
        CheckoutResponse,
        DiscountRequest,
        DiscountValidation,
        JsonResponse,
        PayPalCaptureRequest,
        PaymentVerificationResponse,
        VerifyPaymentRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/api/orders" impl OrderStore);
/// Stores a `pending` order for the cart. Totals are always computed here, never taken from the client.
pub async fn create_order<B: OrderStore>(
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST new order with {} line item(s)", request.items.len());
    let created = api.create_order(request).await.map_err(|e| {
        debug!("💻️ Order was not created. {e}");
        ServerError::from(e)
    })?;
    info!("💻️ Order {} created for {}", created.order.id, created.totals.total);
    Ok(HttpResponse::Created().json(created))
}

route!(fetch_order => Get "/api/orders/{id}" impl OrderStore);
pub async fn fetch_order<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ GET order {order_id}");
    let order = api
        .fetch_order(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Discounts  ----------------------------------------------------
route!(validate_discount => Post "/api/validate-discount" impl DiscountManagement);
/// Rejected codes are reported as `400 {"valid": false, "message": ...}` so the storefront can show the reason.
pub async fn validate_discount<B: DiscountManagement>(
    body: web::Json<DiscountRequest>,
    api: web::Data<DiscountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let DiscountRequest { code, email } = body.into_inner();
    debug!("💻️ POST validate discount code {code} for {email}");
    match api.validate(&code, &email).await {
        Ok(discount) => Ok(HttpResponse::Ok().json(DiscountValidation::valid(discount))),
        Err(e @ (DiscountApiError::Rejected(_) | DiscountApiError::MissingFields)) => {
            debug!("💻️ Discount code {code} is not valid for {email}. {e}");
            Ok(HttpResponse::BadRequest().json(DiscountValidation::invalid(e)))
        },
        Err(e) => Err(e.into()),
    }
}

route!(mark_discount_used => Post "/api/mark-discount-used" impl DiscountManagement);
/// Validates and marks the code used in one step. Of two concurrent requests for the same code, one is rejected.
/// A code redeemed here can still be spent on exactly one order with `POST /api/orders`; a code that has already been
/// spent on an order is rejected.
pub async fn mark_discount_used<B: DiscountManagement>(
    body: web::Json<DiscountRequest>,
    api: web::Data<DiscountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let DiscountRequest { code, email } = body.into_inner();
    debug!("💻️ POST mark discount code {code} used for {email}");
    match api.redeem(&code, &email).await {
        Ok(discount) => {
            info!("💻️ Discount code {} redeemed by {}", discount.code, discount.email);
            Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Discount code {} redeemed", discount.code))))
        },
        Err(e @ (DiscountApiError::Rejected(_) | DiscountApiError::MissingFields)) => {
            debug!("💻️ Discount code {code} was not redeemed. {e}");
            Ok(HttpResponse::BadRequest().json(JsonResponse::failure(e)))
        },
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(stripe_checkout_session => Post "/api/stripe/checkout-session" impl OrderManagement, PaymentGateway);
pub async fn stripe_checkout_session<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    start_checkout(body.into_inner(), api.as_ref()).await
}

route!(paypal_create_order => Post "/api/paypal/orders" impl OrderManagement, PaymentGateway);
pub async fn paypal_create_order<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    start_checkout(body.into_inner(), api.as_ref()).await
}

route!(coinbase_create_charge => Post "/api/coinbase/charges" impl OrderManagement, PaymentGateway);
pub async fn coinbase_create_charge<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    start_checkout(body.into_inner(), api.as_ref()).await
}

async fn start_checkout<B, G>(request: CheckoutRequest, api: &CheckoutApi<B, G>) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    let order_id = request.order_id;
    debug!("💻️ POST checkout for order {order_id}");
    let session = api.start_checkout(&order_id).await.map_err(|e| {
        warn!("💻️ Could not start checkout for order {order_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(CheckoutResponse { order_id, session }))
}

//----------------------------------------------   Payment confirmation  ----------------------------------------------
route!(stripe_verify_payment => Post "/api/stripe/verify-payment"
    impl OrderManagement, ShippingProvider, SubscriberProvider, PaymentVerification);
/// Called by the storefront's success page. Stripe also sends a webhook for the same session; whichever arrives second
/// gets the recorded result without repeating any side effects.
pub async fn stripe_verify_payment<B, S, N, V>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<FulfillmentApi<B, S, N>>,
    verifier: web::Data<V>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    S: ShippingProvider,
    N: SubscriberProvider,
    V: PaymentVerification,
{
    let session_id = body.into_inner().session_id;
    if session_id.trim().is_empty() {
        return Err(ServerError::ValidationError("Session ID is required".into()));
    }
    debug!("💻️ POST verify Stripe session {session_id}");
    match verifier.verify_payment(&session_id).await? {
        PaymentCheck::Paid(confirmation) => {
            let result = api.process_payment_confirmed(confirmation).await?;
            Ok(HttpResponse::Ok().json(PaymentVerificationResponse::paid(result)))
        },
        PaymentCheck::NotPaid { status } => {
            info!("💻️ Stripe session {session_id} is {status}. Nothing to fulfill yet");
            Ok(HttpResponse::Ok().json(PaymentVerificationResponse::not_paid(status)))
        },
    }
}

route!(paypal_capture => Post "/api/paypal/capture"
    impl OrderManagement, ShippingProvider, SubscriberProvider, PaymentVerification);
/// Captures an approved PayPal order and fulfills it. The shipping address comes from PayPal.
pub async fn paypal_capture<B, S, N, V>(
    body: web::Json<PayPalCaptureRequest>,
    api: web::Data<FulfillmentApi<B, S, N>>,
    verifier: web::Data<V>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    S: ShippingProvider,
    N: SubscriberProvider,
    V: PaymentVerification,
{
    let paypal_order_id = body.into_inner().paypal_order_id;
    if paypal_order_id.trim().is_empty() {
        return Err(ServerError::ValidationError("Order ID is required".into()));
    }
    debug!("💻️ POST capture PayPal order {paypal_order_id}");
    match verifier.verify_payment(&paypal_order_id).await? {
        PaymentCheck::Paid(confirmation) => {
            let result = api.process_payment_confirmed(confirmation).await?;
            Ok(HttpResponse::Ok().json(PaymentVerificationResponse::paid(result)))
        },
        PaymentCheck::NotPaid { status } => {
            warn!("💻️ PayPal order {paypal_order_id} was not completed ({status})");
            Err(ServerError::ValidationError("Payment was not completed".into()))
        },
    }
}
