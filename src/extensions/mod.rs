//! Extension types and the functions that construct and inspect them.
//!
//! Functions are called by name from the expression tree, e.g.
//! `ip("10.0.0.1")` or `resource.ip.isInRange(ip("10.0.0.0/8"))`. Method-call
//! syntax passes the receiver as the first argument.

mod datetime;
mod decimal;
mod ipaddr;

pub use datetime::{Datetime, Duration};
pub use decimal::Decimal;
pub use ipaddr::IpAddr;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::EvalError;
use crate::types::Value;

/// Every extension function known to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum ExtensionFunction {
    #[strum(serialize = "ip")]
    Ip,
    #[strum(serialize = "isIpv4")]
    IsIpv4,
    #[strum(serialize = "isIpv6")]
    IsIpv6,
    #[strum(serialize = "isLoopback")]
    IsLoopback,
    #[strum(serialize = "isMulticast")]
    IsMulticast,
    #[strum(serialize = "isInRange")]
    IsInRange,
    #[strum(serialize = "decimal")]
    Decimal,
    #[strum(serialize = "lessThan")]
    LessThan,
    #[strum(serialize = "lessThanOrEqual")]
    LessThanOrEqual,
    #[strum(serialize = "greaterThan")]
    GreaterThan,
    #[strum(serialize = "greaterThanOrEqual")]
    GreaterThanOrEqual,
    #[strum(serialize = "datetime")]
    Datetime,
    #[strum(serialize = "duration")]
    Duration,
    #[strum(serialize = "offset")]
    Offset,
    #[strum(serialize = "durationSince")]
    DurationSince,
    #[strum(serialize = "toDate")]
    ToDate,
    #[strum(serialize = "toTime")]
    ToTime,
    #[strum(serialize = "toMilliseconds")]
    ToMilliseconds,
    #[strum(serialize = "toSeconds")]
    ToSeconds,
    #[strum(serialize = "toMinutes")]
    ToMinutes,
    #[strum(serialize = "toHours")]
    ToHours,
    #[strum(serialize = "toDays")]
    ToDays,
}

impl ExtensionFunction {
    /// Resolve a function by the name used in policies.
    pub fn lookup(name: &str) -> Result<Self, EvalError> {
        name.parse()
            .map_err(|_| EvalError::extension(name, "unknown extension function"))
    }

    pub fn arity(&self) -> usize {
        use ExtensionFunction::*;
        match self {
            IsInRange | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual
            | Offset | DurationSince => 2,
            _ => 1,
        }
    }

    /// Apply the function. Argument count is checked first, then each
    /// argument's type; malformed literals surface as `ExtensionError`.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        use ExtensionFunction::*;

        if args.len() != self.arity() {
            return Err(EvalError::extension(
                self.as_ref(),
                format!("expected {} argument(s), got {}", self.arity(), args.len()),
            ));
        }

        let value = match self {
            Ip => Value::IpAddr(self.parse_literal(&args[0])?),
            IsIpv4 => Value::Bool(args[0].as_ipaddr()?.is_ipv4()),
            IsIpv6 => Value::Bool(args[0].as_ipaddr()?.is_ipv6()),
            IsLoopback => Value::Bool(args[0].as_ipaddr()?.is_loopback()),
            IsMulticast => Value::Bool(args[0].as_ipaddr()?.is_multicast()),
            IsInRange => Value::Bool(args[0].as_ipaddr()?.is_in_range(args[1].as_ipaddr()?)),

            Decimal => Value::Decimal(self.parse_literal(&args[0])?),
            LessThan => Value::Bool(args[0].as_decimal()? < args[1].as_decimal()?),
            LessThanOrEqual => Value::Bool(args[0].as_decimal()? <= args[1].as_decimal()?),
            GreaterThan => Value::Bool(args[0].as_decimal()? > args[1].as_decimal()?),
            GreaterThanOrEqual => Value::Bool(args[0].as_decimal()? >= args[1].as_decimal()?),

            Datetime => Value::Datetime(self.parse_literal(&args[0])?),
            Duration => Value::Duration(self.parse_literal(&args[0])?),
            Offset => {
                let dt = args[0].as_datetime()?;
                let by = args[1].as_duration()?;
                Value::Datetime(
                    dt.offset(by)
                        .ok_or_else(|| EvalError::extension(self.as_ref(), "datetime overflow"))?,
                )
            }
            DurationSince => {
                let later = args[0].as_datetime()?;
                let earlier = args[1].as_datetime()?;
                Value::Duration(
                    later
                        .duration_since(earlier)
                        .ok_or_else(|| EvalError::extension(self.as_ref(), "duration overflow"))?,
                )
            }
            ToDate => Value::Datetime(
                args[0]
                    .as_datetime()?
                    .to_date()
                    .ok_or_else(|| EvalError::extension(self.as_ref(), "datetime overflow"))?,
            ),
            ToTime => Value::Duration(args[0].as_datetime()?.to_time()),
            ToMilliseconds => Value::Long(args[0].as_duration()?.to_milliseconds()),
            ToSeconds => Value::Long(args[0].as_duration()?.to_seconds()),
            ToMinutes => Value::Long(args[0].as_duration()?.to_minutes()),
            ToHours => Value::Long(args[0].as_duration()?.to_hours()),
            ToDays => Value::Long(args[0].as_duration()?.to_days()),
        };

        Ok(value)
    }

    fn parse_literal<T>(&self, arg: &Value) -> Result<T, EvalError>
    where
        T: std::str::FromStr<Err = String>,
    {
        arg.as_str()?
            .parse()
            .map_err(|message: String| EvalError::extension(self.as_ref(), message))
    }
}
