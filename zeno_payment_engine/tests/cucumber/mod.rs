mod payment_world;
mod steps;

pub use payment_world::{PaymentSystem, PaymentWorld};
