//! Canonical 0/1 coding of dichotomous measurements

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::core::data_value::Value;
use crate::core::error::{Error, Result};
use crate::dataframe::DataFrame;

lazy_static! {
    /// Textual tokens, matched case-insensitively
    static ref TEXT_TOKENS: HashMap<&'static str, u8> = {
        let mut tokens = HashMap::new();
        for token in ["no", "n", "absent", "false", "f", "negative"] {
            tokens.insert(token, 0);
        }
        for token in ["yes", "y", "present", "true", "t", "positive", "p"] {
            tokens.insert(token, 1);
        }
        tokens
    };
}

/// Map a single value to 0 or 1.
///
/// Numbers must be exactly `0`/`1`, booleans map naturally and strings go
/// through the token table. Anything else, missing values included, is
/// rejected with [`Error::UnrecognizedToken`].
pub fn dichotomize(column: &str, value: &Value) -> Result<u8> {
    let coded = match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Int(0) => Some(0),
        Value::Int(1) => Some(1),
        Value::Float(f) if *f == 0.0 => Some(0),
        Value::Float(f) if *f == 1.0 => Some(1),
        Value::Str(s) => TEXT_TOKENS.get(s.to_lowercase().as_str()).copied(),
        _ => None,
    };

    coded.ok_or_else(|| Error::UnrecognizedToken {
        column: column.to_string(),
        token: value.to_string(),
    })
}

/// Dichotomize every value of a DataFrame column
pub fn dichotomize_column(df: &DataFrame, column: &str) -> Result<Vec<u8>> {
    df.column(column)?
        .iter()
        .map(|value| dichotomize(column, value))
        .collect()
}
