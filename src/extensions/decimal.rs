//! The `decimal` extension type: fixed point with four fractional digits.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const SCALE: i128 = 10_000;

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?)([0-9]+)\.([0-9]{1,4})$").expect("decimal pattern is valid")
});

/// A decimal stored as a scaled `i64`, so `1.5` is held as `15000`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Decimal(i64);

impl Decimal {
    pub fn from_raw(scaled: i64) -> Self {
        Decimal(scaled)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl FromStr for Decimal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DECIMAL_RE
            .captures(s)
            .ok_or_else(|| format!("`{s}` is not a decimal literal (expected e.g. \"1.2345\")"))?;

        let whole: i128 = caps[2]
            .parse()
            .map_err(|_| format!("`{s}` is out of range for a decimal"))?;
        let fraction = format!("{:0<4}", &caps[3]);
        let fraction: i128 = fraction
            .parse()
            .map_err(|_| format!("`{s}` has an invalid fractional part"))?;

        let magnitude = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(|| format!("`{s}` is out of range for a decimal"))?;
        let scaled = if &caps[1] == "-" { -magnitude } else { magnitude };

        i64::try_from(scaled)
            .map(Decimal)
            .map_err(|_| format!("`{s}` is out of range for a decimal"))
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:04}",
            magnitude / SCALE as u64,
            magnitude % SCALE as u64
        )
    }
}
