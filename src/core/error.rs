use thiserror::Error;

/// Broad class of a failure. Callers pick their retry policy from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Connectivity,
  Configuration,
  Transport,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid credentials: {0}")]
  InvalidCredentials(&'static str),

  #[error("cannot connect to broker: {0}")]
  Connect(#[source] lapin::Error),

  #[error("cannot open channel: {0}")]
  Channel(#[source] lapin::Error),

  #[error("broker rejected {what}: {source}")]
  Topology {
    what: String,
    #[source]
    source: lapin::Error,
  },

  #[error("transport failure: {0}")]
  Transport(#[source] lapin::Error),

  #[error("session is closed")]
  Closed,

  #[error("unknown exchange type {0:?}")]
  UnknownExchangeType(String),

  #[error("delivery {0} was consumed with auto-ack and cannot be settled")]
  AutoAcknowledged(u64),

  #[error("no queue declared on this session")]
  NoQueueDeclared,

  #[error("cannot load broker configuration: {0}")]
  Config(#[from] config::ConfigError),

  #[error("cannot read .env file: {0}")]
  Env(#[from] dotenvy::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidCredentials(_)
      | Error::Connect(_)
      | Error::Channel(_) => ErrorKind::Connectivity,
      Error::Topology {..}
      | Error::UnknownExchangeType(_)
      | Error::NoQueueDeclared
      | Error::Config(_)
      | Error::Env(_) => ErrorKind::Configuration,
      Error::Transport(_)
      | Error::Closed
      | Error::AutoAcknowledged(_) => ErrorKind::Transport,
    }
  }

  /// Broker refusals of a declare or bind become `Topology`; I/O failures and
  /// bad channel state stay `Transport`.
  pub(crate) fn topology(what: impl Into<String>) -> impl FnOnce(lapin::Error) -> Self {
    let what = what.into();
    move |source| {
      if is_rejection(source.kind()) {
        Error::Topology {what, source}
      } else {
        Error::Transport(source)
      }
    }
  }
}

fn is_rejection(kind: &lapin::ErrorKind) -> bool {
  matches!(kind, lapin::ErrorKind::ProtocolError(_))
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use lapin::protocol::{AMQPError, AMQPErrorKind, AMQPSoftError};
  use super::*;

  #[test]
  fn classifies_local_failures() {
    assert_eq!(Error::InvalidCredentials("user is empty").kind(), ErrorKind::Connectivity);
    assert_eq!(Error::UnknownExchangeType("x-delayed".into()).kind(), ErrorKind::Configuration);
    assert_eq!(Error::Closed.kind(), ErrorKind::Transport);
    assert_eq!(Error::AutoAcknowledged(7).kind(), ErrorKind::Transport);
    assert_eq!(Error::NoQueueDeclared.kind(), ErrorKind::Configuration);
  }

  #[test]
  fn only_broker_refusals_are_topology_errors() {
    let refusal = AMQPError::new(
      AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED),
      "PRECONDITION_FAILED - inequivalent arg 'durable'".into(),
    );

    assert!(is_rejection(&lapin::ErrorKind::ProtocolError(refusal)));
    assert!(!is_rejection(&lapin::ErrorKind::ChannelsLimitReached));
    assert!(!is_rejection(&lapin::ErrorKind::InvalidChannel(3)));
  }

  #[test]
  fn displays_context() {
    assert_eq!(Error::Closed.to_string(), "session is closed");
    assert_eq!(
      Error::UnknownExchangeType("fan".into()).to_string(),
      "unknown exchange type \"fan\"",
    );
  }
}
