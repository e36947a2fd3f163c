use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{DispatchError, Result};

/// A payload type bound to one message name
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use toolbelt::dispatch::{Event, Message};
///
/// #[derive(Serialize, Deserialize)]
/// struct RowImported {
///     row: usize,
/// }
///
/// impl Event for RowImported {
///     const NAME: &'static str = "row.imported";
/// }
///
/// let message = Message::from_event("importer", &RowImported { row: 3 }).unwrap();
/// assert_eq!(message.name, "row.imported");
/// assert_eq!(message.decode::<RowImported>().unwrap().row, 3);
/// ```
pub trait Event: Serialize + DeserializeOwned {
    const NAME: &'static str;
}

/// Typed event routed by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    /// Identifies the producer; `(name, originator)` is the delivery key
    pub originator: String,
    pub payload: Value,
}

impl Message {
    pub fn new(name: impl Into<String>, originator: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            originator: originator.into(),
            payload,
        }
    }

    pub fn from_event<E: Event>(originator: impl Into<String>, event: &E) -> Result<Self> {
        let payload = serde_json::to_value(event).map_err(|source| DispatchError::Payload {
            name: E::NAME.to_string(),
            source,
        })?;
        Ok(Self::new(E::NAME, originator, payload))
    }

    /// Decode the payload as `E`, which must match the message name
    pub fn decode<E: Event>(&self) -> Result<E> {
        if self.name != E::NAME {
            return Err(DispatchError::UnexpectedEvent {
                expected: E::NAME,
                found: self.name.clone(),
            });
        }
        E::deserialize(&self.payload).map_err(|source| DispatchError::Payload {
            name: self.name.clone(),
            source,
        })
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.originator)
    }
}

/// Fresh time-ordered originator id
pub fn new_originator() -> String {
    Uuid::now_v7().to_string()
}
