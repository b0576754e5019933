//! # Dose Daily fulfillment server
//!
//! The HTTP face of the storefront backend. It is responsible for:
//! * Turning carts into `pending` orders, with totals computed on the server.
//! * Starting Stripe, PayPal and Coinbase Commerce checkouts for those orders.
//! * Confirming payments, from signed provider webhooks or from the storefront's success pages, and handing them to
//!   the fulfillment engine, which buys the shipping label and emails the tracking details.
//! * Validating and redeeming newsletter discount codes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/orders`, `GET /api/orders/{id}`: Create an order from a cart, and fetch it.
//! * `POST /api/validate-discount`, `POST /api/mark-discount-used`: Discount codes.
//! * `POST /api/stripe/checkout-session`, `POST /api/stripe/verify-payment`: Stripe Checkout.
//! * `POST /api/paypal/orders`, `POST /api/paypal/capture`: PayPal orders.
//! * `POST /api/coinbase/charges`: Coinbase Commerce charges.
//! * `POST /webhook/stripe`, `POST /webhook/coinbase`: Signed payment webhooks.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod signatures;
pub mod webhook_routes;
