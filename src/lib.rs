pub mod core;
pub mod session;
pub mod consumer;
pub mod producer;
pub use crate::{
  core::{
    config::BrokerConfig,
    error::{Error, ErrorKind, Result},
    types::{
      ConsumeOptions, ExchangeType, Handler, PublishPolicy, QueueDescriptor,
      RESERVED_EXCHANGES, is_reserved_exchange,
    },
  },
  consumer::{consumer_runner::ConsumerRunner, deliveries::Deliveries, delivery::InboundDelivery},
  session::{Session, topology::SetupPlan},
};
pub use tokio_util::sync::CancellationToken;
pub use lapin::message::Delivery;
