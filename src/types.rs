use serde::{Deserialize, Deserializer};

pub const CUSTOMER_SOURCE_CREATED: &str = "customer.source.created";

/// A payment-provider webhook event. Only the fields the relay reads are
/// modelled; missing or `null` fields decode as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub object: SourceObject,
}

/// The card source attached to a customer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceObject {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CustomerSourceCreated,
    Other,
}

impl IncomingEvent {
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            CUSTOMER_SOURCE_CREATED => EventKind::CustomerSourceCreated,
            _ => EventKind::Other,
        }
    }

    /// Build the push message for a recognised event, `None` otherwise.
    pub fn notification(&self) -> Option<Notification> {
        match self.kind() {
            EventKind::CustomerSourceCreated => Some(Notification {
                message: format!(
                    "{} added a {} card.",
                    self.data.object.name, self.data.object.brand
                ),
                title: self.event_type.clone(),
            }),
            EventKind::Other => None,
        }
    }
}

/// A formatted message ready for the push API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub title: String,
}

/// Provider-assigned id of an accepted push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    pub request_id: String,
}
