//! Process identifiers and the on-disk record codec.
//!
//! Format: a single line holding the decimal PID.
//! ```text
//! <pid>
//! ```

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest value accepted as a PID (`pid_t` is a signed 32-bit integer).
pub const MAX_PID: u32 = i32::MAX as u32;

/// Operating-system process identifier. Always non-zero and within `pid_t` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Pid(NonZeroU32);

impl Pid {
    /// Create a PID, returning `None` for zero or out-of-range values.
    pub const fn new(raw: u32) -> Option<Self> {
        if raw > MAX_PID {
            return None;
        }
        match NonZeroU32::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// The raw numeric value.
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Serialize as record file content.
    pub fn to_record(self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Pid> for u32 {
    fn from(pid: Pid) -> Self {
        pid.get()
    }
}

impl TryFrom<u32> for Pid {
    type Error = PidParseError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(PidParseError::OutOfRange(u64::from(raw)))
    }
}

/// Reasons a record's content does not denote a PID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PidParseError {
    #[error("record is empty")]
    Empty,

    #[error("record is not a decimal integer: {0:?}")]
    NotANumber(String),

    #[error("PID {0} is outside the valid range 1..={MAX_PID}")]
    OutOfRange(u64),
}

impl FromStr for Pid {
    type Err = PidParseError;

    /// Parse record file content. Surrounding whitespace (including the
    /// trailing newline the writer emits) is ignored.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(PidParseError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PidParseError::NotANumber(truncate(trimmed)));
        }

        // All digits: the only way parsing fails is overflow.
        let raw = trimmed
            .parse::<u64>()
            .map_err(|_| PidParseError::OutOfRange(u64::MAX))?;
        u32::try_from(raw)
            .ok()
            .and_then(Self::new)
            .ok_or(PidParseError::OutOfRange(raw))
    }
}

fn truncate(content: &str) -> String {
    const LIMIT: usize = 32;
    if content.chars().count() <= LIMIT {
        content.to_string()
    } else {
        let mut short: String = content.chars().take(LIMIT).collect();
        short.push('…');
        short
    }
}
