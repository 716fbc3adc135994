use log::debug;
use lapin::{
  Connection as LapinConnection,
  ConnectionProperties,
  Channel,
};
use super::error::{Error, Result};

const REPLY_SUCCESS: u16 = 200;

pub struct Connection(pub LapinConnection);

impl Connection {
  pub async fn new(uri: &str) -> Result<Self> {
    let options = ConnectionProperties::default()
      // Use tokio executor and reactor.
      // At the moment the reactor is only available for unix.
      .with_executor(tokio_executor_trait::Tokio::current())
      .with_reactor(tokio_reactor_trait::Tokio);

    let connection = LapinConnection::connect(uri, options)
      .await
      .map_err(Error::Connect)?;

    Ok(Self(connection))
  }

  pub async fn create_channel(&self) -> Result<Channel> {
    let channel = self.0.create_channel().await.map_err(Error::Channel)?;
    debug!("opened channel {}", channel.id());

    Ok(channel)
  }

  pub fn is_open(&self) -> bool {
    self.0.status().connected()
  }

  pub async fn close(&self) -> Result<()> {
    self.0.close(REPLY_SUCCESS, "closing session").await.map_err(Error::Transport)
  }
}

pub(crate) async fn close_channel(channel: &Channel) -> Result<()> {
  channel.close(REPLY_SUCCESS, "closing session").await.map_err(Error::Transport)
}
