use log::{debug, warn};
use lapin::{
  Channel,
  options::{
    ExchangeDeclareOptions,
    QueueBindOptions,
  },
  types::FieldTable,
};
use crate::core::{
  error::{Error, Result},
  types::{
    is_reserved_exchange,
    Binding,
    ExchangeDescriptor,
    ExchangeType,
    QueueDescriptor,
  },
};
use super::Session;

/// Which declarations a [`Session::setup`] call has to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupPlan {
  pub declare_queue: bool,
  pub declare_exchange: bool,
  pub bind: bool,
}

impl SetupPlan {
  pub fn new(cached_queue: Option<&str>, exchange: &str, queue_name: &str) -> Self {
    // An empty exchange routes through the default exchange by queue name.
    let routed = !exchange.is_empty();

    Self {
      declare_queue: queue_name.is_empty() || cached_queue != Some(queue_name),
      declare_exchange: routed && !is_reserved_exchange(exchange),
      bind: routed,
    }
  }
}

impl Session {
  /// Makes sure `queue_name` exists, `exchange` exists and the two are bound
  /// with `routing_key`. Safe to repeat with the same arguments.
  ///
  /// An empty `queue_name` declares a fresh broker-named queue, which becomes
  /// the cached queue. An empty `exchange` declares the queue only.
  pub async fn setup(
    &mut self,
    exchange: &str,
    exchange_type: &str,
    routing_key: &str,
    queue_name: &str,
  ) -> Result<()> {
    let plan = SetupPlan::new(self.queue_name(), exchange, queue_name);
    debug!("setup {exchange:?}/{routing_key:?} -> {queue_name:?}: {plan:?}");

    // Reject a bad type before anything reaches the broker.
    let exchange_kind = plan.declare_exchange
      .then(|| exchange_type.parse::<ExchangeType>())
      .transpose()?;

    if plan.declare_queue {
      self.create_queue(queue_name).await?;
    }

    if let Some(kind) = exchange_kind {
      self.create_exchange(exchange, kind).await?;
    } else if is_reserved_exchange(exchange) {
      warn!("{exchange} is a built-in exchange, not declaring it");
    }

    if plan.bind {
      let queue = self.queue_name().unwrap_or(queue_name).to_owned();
      self.bind(exchange, routing_key, &queue).await?;
    }

    Ok(())
  }

  pub async fn create_exchange(&self, name: &str, kind: ExchangeType) -> Result<()> {
    let descriptor = ExchangeDescriptor {
      name: name.to_owned(),
      kind,
      durable: false,
    };
    Self::declare_exchange(self.channel()?, &descriptor).await
  }

  pub async fn create_queue(&mut self, queue_name: &str) -> Result<String> {
    self.declare_queue(&QueueDescriptor::named(queue_name)).await
  }

  pub async fn create_queue_durable(&mut self, queue_name: &str, durable: bool) -> Result<String> {
    self.declare_queue(&QueueDescriptor::durable(queue_name, durable)).await
  }

  /// Declares a queue with a broker-generated name and returns that name.
  pub async fn create_queue_anonymous(&mut self) -> Result<String> {
    self.declare_queue(&QueueDescriptor::anonymous()).await
  }

  /// Declares `queue` and caches the name the broker reports for it.
  pub async fn declare_queue(&mut self, queue: &QueueDescriptor) -> Result<String> {
    let declared = self.channel()?.queue_declare(
      &queue.name,
      queue.options(),
      FieldTable::default(),
    )
    .await
    .map_err(Error::topology(format!("queue {:?}", queue.name)))?;

    let name = declared.name().as_str().to_owned();
    debug!("declared queue {name} (durable: {})", queue.durable);
    self.set_queue_name(name.clone());

    Ok(name)
  }

  /// Binds without declaring anything. Does nothing for the default exchange.
  pub async fn bind(&self, exchange: &str, routing_key: &str, queue_name: &str) -> Result<()> {
    if exchange.is_empty() {
      return Ok(());
    }

    let binding = Binding {
      queue: queue_name.to_owned(),
      exchange: exchange.to_owned(),
      routing_key: routing_key.to_owned(),
    };
    Self::queue_bind(self.channel()?, &binding).await
  }

  async fn declare_exchange(channel: &Channel, exchange: &ExchangeDescriptor) -> Result<()> {
    channel.exchange_declare(
      &exchange.name,
      exchange.kind.into(),
      ExchangeDeclareOptions {
        passive: false,
        durable: exchange.durable,
        auto_delete: false,
        internal: false,
        nowait: false,
      },
      FieldTable::default(),
    )
    .await
    .map_err(Error::topology(format!("{} exchange {:?}", exchange.kind, exchange.name)))?;

    debug!("declared {} exchange {}", exchange.kind, exchange.name);
    Ok(())
  }

  async fn queue_bind(channel: &Channel, binding: &Binding) -> Result<()> {
    channel.queue_bind(
      &binding.queue,
      &binding.exchange,
      &binding.routing_key,
      QueueBindOptions::default(),
      FieldTable::default(),
    )
    .await
    .map_err(Error::topology(format!("binding {binding:?}")))?;

    debug!("bound {} to {} with {:?}", binding.queue, binding.exchange, binding.routing_key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_exchange_only_declares_queue() {
    let plan = SetupPlan::new(None, "", "queue3");

    assert_eq!(plan, SetupPlan {declare_queue: true, declare_exchange: false, bind: false});
  }

  #[test]
  fn reserved_exchange_is_bound_but_not_declared() {
    for exchange in ["amq.topic", "amq.direct", "amq.headers", "amq.fanout", "amq.match", "amq.rabbitmq.trace"] {
      let plan = SetupPlan::new(None, exchange, "queue1");

      assert!(plan.declare_queue);
      assert!(!plan.declare_exchange, "{exchange}");
      assert!(plan.bind, "{exchange}");
    }
  }

  #[test]
  fn custom_exchange_is_declared_and_bound() {
    let plan = SetupPlan::new(None, "ex2", "queue2");

    assert_eq!(plan, SetupPlan {declare_queue: true, declare_exchange: true, bind: true});
  }

  #[test]
  fn cached_queue_is_not_redeclared() {
    assert!(!SetupPlan::new(Some("queue2"), "ex2", "queue2").declare_queue);
    assert!(SetupPlan::new(Some("queue1"), "ex2", "queue2").declare_queue);
  }

  #[test]
  fn anonymous_queue_is_always_declared() {
    assert!(SetupPlan::new(Some("amq.gen-abc"), "amq.topic", "").declare_queue);
  }

  #[tokio::test]
  async fn bad_exchange_type_fails_before_declaring() {
    let mut session = Session::closed();

    let err = session.setup("ex.bad", "round-robin", "k", "bad_q").await.unwrap_err();

    assert!(matches!(err, Error::UnknownExchangeType(name) if name == "round-robin"));
    assert_eq!(session.queue_name(), None);
  }

  #[tokio::test]
  async fn exchange_type_ignored_without_exchange() {
    let mut session = Session::closed();

    // gets as far as the queue declare, which needs a live channel
    let err = session.setup("", "round-robin", "k", "bad_q").await.unwrap_err();

    assert!(matches!(err, Error::Closed));
  }
}
