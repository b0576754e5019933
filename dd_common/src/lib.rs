mod helpers;
mod money;
pub mod op;
mod secret;

pub use helpers::{parse_boolean_flag, parse_env_duration_secs};
pub use money::{Money, MoneyConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
