//! The event record carried over the wire and through the subscriber pipeline.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::AccountId;

/// A payload could not be turned into an [`Event`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame was not a JSON object with the expected fields and types.
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A decoded `accountId` / `data` / `timestamp` record.
///
/// Wire format is a flat JSON object:
///
/// ```json
/// {"accountId": "t1", "data": "clicked", "timestamp": 1700000000}
/// ```
///
/// Events are immutable once built; stages clone them, never mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    account_id: AccountId,
    data: String,
    timestamp: i64,
}

impl Event {
    pub fn new(account_id: AccountId, data: impl Into<String>, timestamp: i64) -> Self {
        Self {
            account_id,
            data: data.into(),
            timestamp,
        }
    }

    /// Build an event stamped with the current unix time (seconds).
    pub fn now(account_id: AccountId, data: impl Into<String>) -> Self {
        Self::new(account_id, data, Utc::now().timestamp())
    }

    /// Decode one transport frame.
    ///
    /// Fails for anything that is not a complete object with a non-empty string
    /// `accountId`, a string `data` and an integer `timestamp`.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(frame)?)
    }

    /// Encode as the JSON wire representation.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn decodes_well_formed_payload() {
        let ev = Event::decode(br#"{"accountId": "test", "data": "data", "timestamp": 1}"#).unwrap();
        assert_eq!(ev, Event::new(id("test"), "data", 1));
    }

    #[test]
    fn ignores_unknown_fields() {
        let ev = Event::decode(br#"{"accountId":"a","data":"d","timestamp":5,"extra":true}"#).unwrap();
        assert_eq!(ev.account_id().as_str(), "a");
        assert_eq!(ev.timestamp(), 5);
    }

    #[test]
    fn rejects_malformed_payloads() {
        let cases: &[&[u8]] = &[
            b"wrong",
            b"",
            br#"{"accountId": "test", "data": "da"#,
            br#"{"accountId": 7, "data": "data", "timestamp": 1}"#,
            br#"{"accountId": "test", "data": "data", "timestamp": "1"}"#,
            br#"{"accountId": "test", "data": 3, "timestamp": 1}"#,
            br#"{"accountId": "", "data": "data", "timestamp": 1}"#,
            br#"{"data": "data", "timestamp": 1}"#,
            br#"["test", "data", 1]"#,
            b"Successfully connected to publisher",
        ];

        for frame in cases {
            assert!(
                Event::decode(frame).is_err(),
                "expected decode failure for {:?}",
                String::from_utf8_lossy(frame)
            );
        }
    }

    #[test]
    fn encodes_camel_case_fields() {
        let text = Event::new(id("t1"), "x", 42).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["accountId"], "t1");
        assert_eq!(value["data"], "x");
        assert_eq!(value["timestamp"], 42);
    }

    proptest! {
        /// Property: any well-formed payload decodes to exactly the fields it carries.
        #[test]
        fn well_formed_payload_decodes_exactly(
            account in "[a-zA-Z0-9]{1,24}",
            data in ".*",
            ts in any::<i64>(),
        ) {
            let payload = serde_json::json!({
                "accountId": account,
                "data": data,
                "timestamp": ts,
            })
            .to_string();

            let ev = Event::decode(payload.as_bytes()).unwrap();
            prop_assert_eq!(ev, Event::new(id(&account), data, ts));
        }
    }
}
