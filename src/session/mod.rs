//! A connection, one channel on it, and the name of the last declared queue.
//!
//! Declare, bind and publish calls borrow the session; they are plain awaits on
//! broker round-trips with the client library's own timeouts. Callers that share
//! a session between tasks must serialise access themselves (e.g. behind a
//! `tokio::sync::Mutex`), since the cached queue name is updated in place.
pub mod topology;

use std::future::Future;
use log::{info, warn};
use lapin::Channel;
use crate::core::{
  config::BrokerConfig,
  connection::{self, Connection},
  error::{Error, Result},
  types::PublishPolicy,
};

pub struct Session {
  connection: Option<Connection>,
  channel: Option<Channel>,
  queue_name: Option<String>,
  pub(crate) publish_policy: PublishPolicy,
}

impl Session {
  pub async fn open(config: &BrokerConfig) -> Result<Self> {
    config.validate()?;
    info!("connecting to {}:{} as {}", config.host, config.port, config.user);

    Self::open_uri(&config.uri()).await
  }

  /// Opens a session on an already formed `amqp://` URI.
  pub async fn open_uri(uri: &str) -> Result<Self> {
    let connection = Connection::new(uri).await?;
    let channel = or_close(connection.create_channel().await, connection.close()).await?;
    info!("session open");

    Ok(Self {
      connection: Some(connection),
      channel: Some(channel),
      queue_name: None,
      publish_policy: PublishPolicy::default(),
    })
  }

  pub fn with_publish_policy(mut self, policy: PublishPolicy) -> Self {
    self.publish_policy = policy;
    self
  }

  pub fn publish_policy(&self) -> &PublishPolicy {
    &self.publish_policy
  }

  /// Name of the most recently declared queue. The broker stays authoritative.
  pub fn queue_name(&self) -> Option<&str> {
    self.queue_name.as_deref()
  }

  pub(crate) fn set_queue_name(&mut self, name: String) {
    self.queue_name = Some(name);
  }

  pub fn is_open(&self) -> bool {
    match (&self.connection, &self.channel) {
      (Some(connection), Some(channel)) => connection.is_open() && channel.status().connected(),
      _ => false,
    }
  }

  pub(crate) fn channel(&self) -> Result<&Channel> {
    match &self.channel {
      Some(channel) if self.is_open() => Ok(channel),
      _ => Err(Error::Closed),
    }
  }

  /// Closes the channel, then the connection. Closing twice is a no-op.
  ///
  /// The connection close is attempted even when the channel close fails;
  /// the first failure is returned.
  pub async fn close(&mut self) -> Result<()> {
    let (Some(channel), Some(connection)) = (self.channel.take(), self.connection.take()) else {
      warn!("session already closed");
      return Ok(());
    };

    // Either side may already be gone if the broker dropped us.
    let close_channel = async {
      if channel.status().connected() {
        connection::close_channel(&channel).await
      } else {
        Ok(())
      }
    };
    let close_connection = async {
      if connection.is_open() {
        connection.close().await
      } else {
        Ok(())
      }
    };
    close_in_order(close_channel, close_connection).await?;
    info!("session closed");

    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn closed() -> Self {
    Self {
      connection: None,
      channel: None,
      queue_name: None,
      publish_policy: PublishPolicy::default(),
    }
  }
}

/// Runs both closes in order and reports the first failure.
async fn close_in_order(
  first: impl Future<Output = Result<()>>,
  second: impl Future<Output = Result<()>>,
) -> Result<()> {
  let first = first.await;
  let second = second.await;
  first.and(second)
}

/// Passes `result` through, running `close` first when it is an error.
async fn or_close<T>(result: Result<T>, close: impl Future<Output = Result<()>>) -> Result<T> {
  if result.is_err() {
    if let Err(error) = close.await {
      warn!("cannot close connection after failed open: {error}");
    }
  }
  result
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;
  use super::*;

  #[tokio::test]
  async fn close_reaches_connection_after_channel_failure() {
    let connection_closed = Cell::new(false);

    let result = close_in_order(
      async { Err(Error::Closed) },
      async {
        connection_closed.set(true);
        Err(Error::NoQueueDeclared)
      },
    )
    .await;

    assert!(connection_closed.get());
    assert!(matches!(result, Err(Error::Closed)));
  }

  #[tokio::test]
  async fn close_reports_connection_failure() {
    let result = close_in_order(async { Ok(()) }, async { Err(Error::NoQueueDeclared) }).await;

    assert!(matches!(result, Err(Error::NoQueueDeclared)));
  }

  #[tokio::test]
  async fn failed_channel_open_closes_connection() {
    let connection_closed = Cell::new(false);

    let result: Result<()> = or_close(Err(Error::Closed), async {
      connection_closed.set(true);
      Ok(())
    })
    .await;

    assert!(connection_closed.get());
    assert!(matches!(result, Err(Error::Closed)));
  }

  #[tokio::test]
  async fn open_channel_keeps_connection() {
    let connection_closed = Cell::new(false);

    let result = or_close(Ok(7), async {
      connection_closed.set(true);
      Ok(())
    })
    .await;

    assert!(!connection_closed.get());
    assert_eq!(result.unwrap(), 7);
  }

  #[tokio::test]
  async fn closing_twice_is_harmless() {
    let mut session = Session::closed();

    assert!(session.close().await.is_ok());
    assert!(session.close().await.is_ok());
    assert!(!session.is_open());
  }
}
