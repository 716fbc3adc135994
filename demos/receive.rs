use std::{env, sync::Arc};
use async_trait::async_trait;
use amqp_session::{BrokerConfig, ConsumerRunner, Handler, InboundDelivery, Session};
use eyre::Result;

struct Print;

#[async_trait]
impl Handler for Print {
  async fn handle(&self, delivery: &InboundDelivery) -> Result<()> {
    println!(
      "[{}] {}",
      delivery.routing_key(),
      String::from_utf8_lossy(delivery.body()),
    );
    Ok(())
  }
}

/// cargo run --example receive -- amq.topic topic key1 queue1
///
/// An empty queue name (`""`) gets a broker-generated queue.
#[tokio::main]
async fn main() -> Result<()> {
  env_logger::init();

  let args: Vec<String> = env::args().skip(1).collect();
  let [exchange, exchange_type, routing_key, queue_name] = args.as_slice() else {
    eyre::bail!("usage: receive <exchange> <exchange-type> <routing-key> <queue>");
  };

  let mut session = Session::open(&BrokerConfig::load()?).await?;
  session.setup(exchange, exchange_type, routing_key, queue_name).await?;

  let deliveries = session.receive_queue().await?;
  let runner = ConsumerRunner::new(deliveries, Arc::new(Print));
  let token = runner.cancellation_token();

  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      token.cancel();
    }
  });

  println!(
    " [*] Waiting for messages on {}. To exit press CTRL+C",
    session.queue_name().unwrap_or_default(),
  );
  let result = runner.start().await;
  session.close().await?;
  result?;

  Ok(())
}
