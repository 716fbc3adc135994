use std::env;
use amqp_session::{BrokerConfig, Session};
use eyre::Result;

/// cargo run --example publish -- amq.topic key1 "hello"
#[tokio::main]
async fn main() -> Result<()> {
  env_logger::init();

  let args: Vec<String> = env::args().skip(1).collect();
  let [exchange, routing_key, msg] = args.as_slice() else {
    eyre::bail!("usage: publish <exchange> <routing-key> <message>");
  };

  let mut session = Session::open(&BrokerConfig::load()?).await?;
  let result = session.publish(exchange, routing_key, msg).await;
  session.close().await?;
  result?;

  println!("sent {msg:?} to {exchange:?}/{routing_key:?}");
  Ok(())
}
