pub mod consumer_runner;
pub mod deliveries;
pub mod delivery;
