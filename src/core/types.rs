use std::{
	fmt,
	str::FromStr,
};
use async_trait::async_trait;
use lapin::{
	BasicProperties,
	ExchangeKind,
	options::{QueueDeclareOptions, BasicConsumeOptions},
};
use crate::consumer::delivery::InboundDelivery;
use super::error::Error;

/// Exchanges every broker creates on its own. Redeclaring them is refused.
pub const RESERVED_EXCHANGES: [&str; 6] = [
	"amq.topic",
	"amq.direct",
	"amq.headers",
	"amq.fanout",
	"amq.match",
	"amq.rabbitmq.trace",
];

pub fn is_reserved_exchange(name: &str) -> bool {
	RESERVED_EXCHANGES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeType {
	Direct,
	Topic,
	Fanout,
	Headers,
}

impl FromStr for ExchangeType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"direct" => Ok(Self::Direct),
			"topic" => Ok(Self::Topic),
			"fanout" => Ok(Self::Fanout),
			"headers" => Ok(Self::Headers),
			_ => Err(Error::UnknownExchangeType(s.to_owned())),
		}
	}
}

impl fmt::Display for ExchangeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Direct => "direct",
			Self::Topic => "topic",
			Self::Fanout => "fanout",
			Self::Headers => "headers",
		};
		f.write_str(name)
	}
}

impl From<ExchangeType> for ExchangeKind {
	fn from(kind: ExchangeType) -> Self {
		match kind {
			ExchangeType::Direct => ExchangeKind::Direct,
			ExchangeType::Topic => ExchangeKind::Topic,
			ExchangeType::Fanout => ExchangeKind::Fanout,
			ExchangeType::Headers => ExchangeKind::Headers,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeDescriptor {
	pub name: String,
	pub kind: ExchangeType,
	pub durable: bool,
}

/// An empty `name` asks the broker to generate one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueDescriptor {
	pub name: String,
	pub durable: bool,
	pub exclusive: bool,
	pub auto_delete: bool,
}

impl QueueDescriptor {
	pub fn named(name: &str) -> Self {
		Self::durable(name, false)
	}

	pub fn durable(name: &str, durable: bool) -> Self {
		Self {
			name: name.to_owned(),
			durable,
			..Self::default()
		}
	}

	pub fn anonymous() -> Self {
		Self::default()
	}

	pub(crate) fn options(&self) -> QueueDeclareOptions {
		QueueDeclareOptions {
			passive: false,
			durable: self.durable,
			exclusive: self.exclusive,
			auto_delete: self.auto_delete,
			nowait: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	pub queue: String,
	pub exchange: String,
	pub routing_key: String,
}

/// Properties stamped on every outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPolicy {
	pub content_type: String,
	/// Per-message TTL in milliseconds, as the broker expects it.
	pub expiration: Option<String>,
	/// Return unroutable messages instead of dropping them.
	pub mandatory: bool,
}

impl Default for PublishPolicy {
	fn default() -> Self {
		Self {
			content_type: "text/plain".to_owned(),
			expiration: Some("5000".to_owned()),
			mandatory: false,
		}
	}
}

impl PublishPolicy {
	pub(crate) fn properties(&self) -> BasicProperties {
		let props = BasicProperties::default().with_content_type(self.content_type.as_str().into());

		match &self.expiration {
			Some(ttl) => props.with_expiration(ttl.as_str().into()),
			None => props,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeOptions {
	pub auto_ack: bool,
	pub exclusive: bool,
	pub no_local: bool,
	/// Empty lets the broker pick a tag.
	pub consumer_tag: String,
}

impl Default for ConsumeOptions {
	fn default() -> Self {
		Self {
			auto_ack: true,
			exclusive: false,
			no_local: false,
			consumer_tag: String::new(),
		}
	}
}

impl ConsumeOptions {
	pub fn manual_ack() -> Self {
		Self {auto_ack: false, ..Self::default()}
	}

	pub(crate) fn options(&self) -> BasicConsumeOptions {
		BasicConsumeOptions {
			no_local: self.no_local,
			no_ack: self.auto_ack,
			exclusive: self.exclusive,
			nowait: false,
		}
	}
}

#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, delivery: &InboundDelivery) -> eyre::Result<()>;
}
