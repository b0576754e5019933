mod fulfillment_world;
mod setups;
mod steps;

pub use fulfillment_world::FulfillmentWorld;
