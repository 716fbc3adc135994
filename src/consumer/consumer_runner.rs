use std::sync::Arc;
use log::{info, warn};
use tokio_util::sync::CancellationToken;
use crate::core::{
  error::Result,
  types::Handler,
};
use super::deliveries::Deliveries;

/// Feeds every delivery of a stream to a [`Handler`].
///
/// With manual acknowledgement a successful handler acks the delivery and a
/// failing one nacks it without requeueing. With auto-ack failures are only
/// logged, the broker has already settled the message.
pub struct ConsumerRunner<H>
where
  H: Handler + 'static
{
  deliveries: Deliveries,
  handler: Arc<H>,
}

impl <H> ConsumerRunner<H>
where
  H: Handler + 'static
{
  pub fn new(deliveries: Deliveries, handler: Arc<H>) -> Self {
    Self {deliveries, handler}
  }

  /// Cancel this token to make [`ConsumerRunner::start`] return.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.deliveries.cancellation_token()
  }

  /// Runs until the stream ends or is cancelled.
  ///
  /// A broken stream or a failed ack/nack is returned as an error.
  pub async fn start(mut self) -> Result<()> {
    let tag = self.deliveries.consumer_tag();
    info!("running consumer {tag}");

    while let Some(delivery) = self.deliveries.next().await {
      let delivery = delivery?;
      let result = self.handler.handle(&delivery).await;

      if let Err(error) = &result {
        warn!("handler failed on delivery {}: {error:#}", delivery.delivery_tag());
      }

      if delivery.is_auto_ack() {
        continue;
      }

      match result {
        Ok(()) => delivery.ack().await?,
        Err(_) => delivery.nack(false).await?,
      }
    }

    info!("consumer {tag} stopped");
    Ok(())
  }
}
