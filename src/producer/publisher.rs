use log::debug;
use lapin::options::BasicPublishOptions;
use crate::{
  core::error::{Error, Result},
  session::Session,
};

impl Session {
  /// Publishes a text message under the session's [`PublishPolicy`].
  ///
  /// With the default policy an unroutable message is dropped by the broker.
  ///
  /// [`PublishPolicy`]: crate::core::types::PublishPolicy
  pub async fn publish(&self, exchange_name: &str, routing_key: &str, msg: &str) -> Result<()> {
    self.publish_bytes(exchange_name, routing_key, msg.as_bytes()).await
  }

  pub async fn publish_bytes(
    &self,
    exchange_name: &str,
    routing_key: &str,
    payload: &[u8],
  ) -> Result<()> {
    let policy = &self.publish_policy;

    self.channel()?.basic_publish(
      exchange_name,
      routing_key,
      BasicPublishOptions {
        mandatory: policy.mandatory,
        immediate: false,
      },
      payload,
      policy.properties(),
    )
    .await
    .map_err(Error::Transport)?
    .await
    .map_err(Error::Transport)?;

    debug!("published {} bytes to {exchange_name:?}/{routing_key:?}", payload.len());
    Ok(())
  }
}
