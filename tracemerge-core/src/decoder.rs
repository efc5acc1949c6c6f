use likely_stable::unlikely;
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::DecodeError;
use crate::row::{Row, FIELD_NAMES};

/// Record delimiter.
pub const DELIMITER: char = ',';

/// Number of columns in one record.
pub const NUM_FIELDS: usize = 7;

/// How to split a physical line into columns.
///
/// Some writers upstream did not escape the delimiter inside keys, so a line
/// may carry more than 7 tokens. `Strict` rejects such lines, `Loose` glues
/// every token between the first and the last five back into the key.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DecodeMode {
    #[default]
    Strict,
    Loose,
}

/// Parses one textual record into a `Row`.
#[derive(Default, Debug, Clone, Copy)]
pub struct RowDecoder {
    mode: DecodeMode,
}

impl RowDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self { mode }
    }

    /// Decode one raw line as read from the file.
    pub fn decode_bytes(&self, line: &[u8]) -> Result<Row, DecodeError> {
        match std::str::from_utf8(line) {
            Ok(line) => self.decode(line),
            Err(e) => Err(DecodeError::InvalidUtf8 {
                valid_up_to: e.valid_up_to(),
            }),
        }
    }

    /// Decode one line, trailing line terminator allowed.
    ///
    /// Examples:
    ///
    /// 1,key_a,5,100,42,get,0
    /// 2,key,with,commas,5,100,42,get,0 (only in `DecodeMode::Loose`)
    pub fn decode(&self, line: &str) -> Result<Row, DecodeError> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);

        if unlikely(line.is_empty()) {
            return Err(DecodeError::FieldCount { found: 0 });
        }

        let tokens = line.split(DELIMITER).collect::<Vec<_>>();
        let found = tokens.len();

        if unlikely(found < NUM_FIELDS) {
            return Err(DecodeError::FieldCount { found });
        }

        let key = match self.mode {
            DecodeMode::Strict => {
                if unlikely(found > NUM_FIELDS) {
                    return Err(DecodeError::FieldCount { found });
                }

                tokens[1].trim().to_string()
            }
            DecodeMode::Loose => tokens[1..found - 5].concat().trim().to_string(),
        };

        let tail = &tokens[found - 5..];

        Ok(Row {
            timestamp: parse_field(FIELD_NAMES[0], tokens[0])?,
            key,
            key_size: parse_field(FIELD_NAMES[2], tail[0])?,
            value_size: parse_field(FIELD_NAMES[3], tail[1])?,
            client_id: parse_field(FIELD_NAMES[4], tail[2])?,
            operation: tail[3].trim().to_string(),
            ttl: parse_field(FIELD_NAMES[6], tail[4])?,
            source_index: 0,
        })
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, DecodeError> {
    let trimmed = value.trim();

    // `u64::from_str` accepts a leading `+`, the record format does not.
    if unlikely(trimmed.starts_with('+')) {
        return Err(DecodeError::NumericParse {
            field,
            value: value.to_string(),
        });
    }

    trimmed.parse::<T>().map_err(|_| DecodeError::NumericParse {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strict() {
        let decoder = RowDecoder::default();

        let row = decoder.decode("10,abc,3,512,77,gets,3600\n").unwrap();
        assert_eq!(row, Row::new(10, "abc", 3, 512, 77, "gets", 3600));

        let row = decoder.decode("11,abc,3,512,77,delete,0\r\n").unwrap();
        assert_eq!(row.operation, "delete");
        assert_eq!(row.ttl, 0);
    }

    #[test]
    fn test_decode_trims_every_column() {
        let decoder = RowDecoder::default();

        let row = decoder.decode("1, abc ,3, 512 ,77, get ,0").unwrap();
        assert_eq!(row, Row::new(1, "abc", 3, 512, 77, "get", 0));
        assert_eq!(row.to_string(), "1,abc,3,512,77,get,0");

        let row = RowDecoder::new(DecodeMode::Loose)
            .decode("2, user,42 ,3,512,77,get,0")
            .unwrap();
        assert_eq!(row.key, "user42");
    }

    #[test]
    fn test_decode_field_count() {
        let decoder = RowDecoder::new(DecodeMode::Strict);

        assert_eq!(
            decoder.decode("1,abc,3,512"),
            Err(DecodeError::FieldCount { found: 4 })
        );
        assert_eq!(decoder.decode(""), Err(DecodeError::FieldCount { found: 0 }));
        assert_eq!(
            decoder.decode("1,a,b,3,512,77,get,0"),
            Err(DecodeError::FieldCount { found: 8 })
        );
    }

    #[test]
    fn test_decode_numeric_parse() {
        let decoder = RowDecoder::default();

        assert_eq!(
            decoder.decode("x,abc,3,512,77,get,0"),
            Err(DecodeError::NumericParse {
                field: "timestamp",
                value: "x".to_string()
            })
        );

        assert_eq!(
            decoder.decode("1,abc,-3,512,77,get,0"),
            Err(DecodeError::NumericParse {
                field: "key_size",
                value: "-3".to_string()
            })
        );

        // Does not fit in `u32`.
        assert!(matches!(
            decoder.decode("1,abc,3,4294967296,77,get,0"),
            Err(DecodeError::NumericParse { field: "value_size", .. })
        ));

        assert!(matches!(
            decoder.decode("1,abc,3,5,77,get,+1"),
            Err(DecodeError::NumericParse { field: "ttl", .. })
        ));
    }

    #[test]
    fn test_decode_loose_key() {
        let decoder = RowDecoder::new(DecodeMode::Loose);

        let row = decoder.decode("7,user,42,profile,9,100,1,get,0").unwrap();
        assert_eq!(row.key, "user42profile");
        assert_eq!(row.key_size, 9);
        assert_eq!(row.value_size, 100);
        assert_eq!(row.client_id, 1);
        assert_eq!(row.operation, "get");

        // Exactly 7 tokens behave like strict mode.
        let row = decoder.decode("7,plain,5,100,1,set,30").unwrap();
        assert_eq!(row, Row::new(7, "plain", 5, 100, 1, "set", 30));

        assert_eq!(
            decoder.decode("7,a,b,c,d,e"),
            Err(DecodeError::FieldCount { found: 6 })
        );
    }

    #[test]
    fn test_decode_bytes() {
        let decoder = RowDecoder::default();

        let row = decoder.decode_bytes(b"3,k,1,10,2,get,0\n").unwrap();
        assert_eq!(row, Row::new(3, "k", 1, 10, 2, "get", 0));

        assert_eq!(
            decoder.decode_bytes(b"2,k\xff\xfe,2,10,1,get,0\n"),
            Err(DecodeError::InvalidUtf8 { valid_up_to: 3 })
        );
    }

    #[test]
    fn test_decode_mode_from_str() {
        assert_eq!(DecodeMode::from_str("loose").unwrap(), DecodeMode::Loose);
        assert_eq!(DecodeMode::Strict.to_string(), "strict");
        assert!(DecodeMode::from_str("lenient").is_err());
    }
}
