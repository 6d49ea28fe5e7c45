//! Encoding of the persisted Q-table record.
//!
//! The record is the serde form of [`QTable`]: one `q_table` field holding
//! the state → `[left, stay, right]` mapping. It can be written as pretty
//! JSON (human-inspectable, the default) or MessagePack.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, q_learning::q_table::QTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    #[default]
    Json,
    MsgPack,
}

impl TableFormat {
    pub const EXPECTED: &'static str = "json, msgpack";

    pub fn as_str(self) -> &'static str {
        match self {
            TableFormat::Json => "json",
            TableFormat::MsgPack => "msgpack",
        }
    }

    /// Serialize a table in this format.
    pub fn encode(self, table: &QTable) -> Result<Vec<u8>> {
        match self {
            TableFormat::Json => {
                let mut bytes = serde_json::to_vec_pretty(table)?;
                bytes.push(b'\n');
                Ok(bytes)
            }
            TableFormat::MsgPack => {
                rmp_serde::to_vec_named(table).map_err(|e| Error::SerializationContext {
                    operation: "serialize Q-table to MessagePack".to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Deserialize a table in this format.
    ///
    /// Any decoding failure is reported as [`Error::CorruptState`] naming
    /// `location`.
    pub fn decode(self, bytes: &[u8], location: &str) -> Result<QTable> {
        let decoded = match self {
            TableFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            TableFormat::MsgPack => rmp_serde::from_slice(bytes).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| Error::CorruptState {
            location: location.to_string(),
            message,
        })
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(TableFormat::Json),
            "msgpack" | "messagepack" | "mpk" => Ok(TableFormat::MsgPack),
            other => Err(Error::ParseTableFormat {
                input: other.to_string(),
                expected: Self::EXPECTED.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, StateKey};

    fn sample_table() -> QTable {
        let mut table = QTable::new();
        table.set(&StateKey::from_buckets(0, 3), Action::MoveRight, 1.0 / 3.0);
        table.set(&StateKey::from_buckets(-7, 7), Action::MoveLeft, -9.876_543_210_123);
        table.set(&StateKey::none(), Action::Stay, 1e-300);
        table
    }

    #[test]
    fn test_roundtrip_both_formats() {
        for format in [TableFormat::Json, TableFormat::MsgPack] {
            let table = sample_table();
            let bytes = format.encode(&table).unwrap();
            assert_eq!(format.decode(&bytes, "memory").unwrap(), table);

            let empty = QTable::new();
            let bytes = format.encode(&empty).unwrap();
            assert_eq!(format.decode(&bytes, "memory").unwrap(), empty);
        }
    }

    #[test]
    fn test_accepts_camel_case_field() {
        let json = br#"{"qTable": {"1,2": [0.5, -1.0, 2.0]}}"#;
        let table = TableFormat::Json.decode(json, "legacy").unwrap();
        assert_eq!(table.value(&StateKey::from_buckets(1, 2), 2).unwrap(), 2.0);
    }

    #[test]
    fn test_corrupt_inputs() {
        let cases: [&[u8]; 4] = [
            b"{not json",
            br#"{"q_table": {"1,2": [0.5, 1.0]}}"#,
            br#"{"q_table": {"left": [0.0, 0.0, 0.0]}}"#,
            br#"{"something_else": {}}"#,
        ];
        for bytes in cases {
            let err = TableFormat::Json.decode(bytes, "table.json").unwrap_err();
            assert!(err.is_corrupt_state(), "expected corrupt state, got {err}");
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<TableFormat>().unwrap(), TableFormat::Json);
        assert_eq!("msgpack".parse::<TableFormat>().unwrap(), TableFormat::MsgPack);
        assert!("yaml".parse::<TableFormat>().is_err());
    }
}
