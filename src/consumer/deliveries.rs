use futures_lite::stream::StreamExt;
use log::debug;
use lapin::{
  Channel,
  Consumer,
  options::BasicCancelOptions,
  types::FieldTable,
};
use tokio_util::sync::CancellationToken;
use crate::{
  core::{
    error::{Error, Result},
    types::ConsumeOptions,
  },
  session::Session,
};
use super::delivery::InboundDelivery;

/// Lazy, unbounded stream of deliveries from one queue.
///
/// Ends when the broker cancels the consumer, the channel closes, or the
/// cancellation token fires. It cannot be restarted; call
/// [`Session::receive`] again for a new consumer.
pub struct Deliveries {
  consumer: Consumer,
  channel: Channel,
  auto_ack: bool,
  cancel: CancellationToken,
}

impl Deliveries {
  /// Waits for the next delivery. `None` means the stream is finished.
  pub async fn next(&mut self) -> Option<Result<InboundDelivery>> {
    let delivery = tokio::select! {
      biased;
      _ = self.cancel.cancelled() => return None,
      delivery = self.consumer.next() => delivery?,
    };

    Some(
      delivery
        .map(|delivery| InboundDelivery::new(delivery, self.auto_ack))
        .map_err(Error::Transport)
    )
  }

  /// A handle another task can use to end this stream.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  pub fn is_auto_ack(&self) -> bool {
    self.auto_ack
  }

  pub fn consumer_tag(&self) -> String {
    self.consumer.tag().to_string()
  }

  /// Stops the local stream and tells the broker to stop delivering.
  pub async fn cancel(self) -> Result<()> {
    self.cancel.cancel();
    let tag = self.consumer_tag();

    if self.channel.status().connected() {
      self.channel
        .basic_cancel(&tag, BasicCancelOptions::default())
        .await
        .map_err(Error::Transport)?;
    }

    debug!("cancelled consumer {tag}");
    Ok(())
  }
}

impl Session {
  /// Consumes `queue_name` with the default options and the given ack mode.
  pub async fn receive(&self, queue_name: &str, auto_ack: bool) -> Result<Deliveries> {
    let options = ConsumeOptions {auto_ack, ..ConsumeOptions::default()};
    self.receive_with(queue_name, &options).await
  }

  /// Consumes the most recently declared queue with auto-ack.
  pub async fn receive_queue(&self) -> Result<Deliveries> {
    let queue_name = self.queue_name().ok_or(Error::NoQueueDeclared)?.to_owned();
    self.receive(&queue_name, true).await
  }

  pub async fn receive_with(&self, queue_name: &str, options: &ConsumeOptions) -> Result<Deliveries> {
    let channel = self.channel()?;
    let consumer = channel.basic_consume(
      queue_name,
      &options.consumer_tag,
      options.options(),
      FieldTable::default(),
    )
    .await
    .map_err(Error::Transport)?;

    debug!("consuming {queue_name:?} as {} (auto-ack: {})", consumer.tag(), options.auto_ack);

    Ok(Deliveries {
      consumer,
      channel: channel.clone(),
      auto_ack: options.auto_ack,
      cancel: CancellationToken::new(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn receive_queue_needs_a_declared_queue() {
    let session = Session::closed();

    assert!(matches!(session.receive_queue().await, Err(Error::NoQueueDeclared)));
  }

  #[tokio::test]
  async fn receive_on_closed_session() {
    let session = Session::closed();

    assert!(matches!(session.receive("orders", true).await, Err(Error::Closed)));
  }
}
