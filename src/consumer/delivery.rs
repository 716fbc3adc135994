use lapin::{
  BasicProperties,
  message::Delivery,
  options::{BasicAckOptions, BasicNackOptions, BasicRejectOptions},
};
use crate::core::error::{Error, Result};

/// A message handed out by [`Deliveries`](super::deliveries::Deliveries).
///
/// Deliveries received with auto-ack are already settled; acknowledging them
/// again fails with [`Error::AutoAcknowledged`] without touching the broker.
#[derive(Debug)]
pub struct InboundDelivery {
  delivery: Delivery,
  auto_ack: bool,
}

impl InboundDelivery {
  pub(crate) fn new(delivery: Delivery, auto_ack: bool) -> Self {
    Self {delivery, auto_ack}
  }

  pub fn body(&self) -> &[u8] {
    &self.delivery.data
  }

  pub fn body_str(&self) -> Option<&str> {
    std::str::from_utf8(&self.delivery.data).ok()
  }

  pub fn exchange(&self) -> &str {
    self.delivery.exchange.as_str()
  }

  pub fn routing_key(&self) -> &str {
    self.delivery.routing_key.as_str()
  }

  pub fn delivery_tag(&self) -> u64 {
    self.delivery.delivery_tag
  }

  pub fn redelivered(&self) -> bool {
    self.delivery.redelivered
  }

  pub fn properties(&self) -> &BasicProperties {
    &self.delivery.properties
  }

  pub fn content_type(&self) -> Option<&str> {
    self.delivery.properties.content_type().as_ref().map(|s| s.as_str())
  }

  pub fn is_auto_ack(&self) -> bool {
    self.auto_ack
  }

  pub async fn ack(&self) -> Result<()> {
    self.settleable()?;
    self.delivery
      .ack(BasicAckOptions::default())
      .await
      .map(|_| ())
      .map_err(Error::Transport)
  }

  pub async fn nack(&self, requeue: bool) -> Result<()> {
    self.settleable()?;
    self.delivery
      .nack(BasicNackOptions {multiple: false, requeue})
      .await
      .map(|_| ())
      .map_err(Error::Transport)
  }

  pub async fn reject(&self, requeue: bool) -> Result<()> {
    self.settleable()?;
    self.delivery
      .reject(BasicRejectOptions {requeue})
      .await
      .map(|_| ())
      .map_err(Error::Transport)
  }

  fn settleable(&self) -> Result<()> {
    if self.auto_ack {
      return Err(Error::AutoAcknowledged(self.delivery_tag()));
    }
    Ok(())
  }
}
