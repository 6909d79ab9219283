//! Item and sequence data model.
//!
//! Every Metapath (sub)expression evaluates to a [`Sequence`] of [`Item`]s.
//! An item is either a node handle into the bound document tree or an
//! immutable atomic value with a concrete datatype. Empty and singleton
//! sequences are ordinary cases, not special types.

use core::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use smallvec::SmallVec;

use crate::runtime::{Error, ErrorKind};

/// Subset of the Metapath atomic type universe actually exercised by the
/// language. Numeric subtypes (integer, decimal) are stored distinctly so
/// instance checks and the aggregation tie-break rule stay precise.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicValue {
    Boolean(bool),
    String(String),
    Integer(i64),
    Decimal(f64),
    AnyUri(String),
    Uuid(uuid::Uuid),
    UntypedAtomic(String),
    Date {
        date: NaiveDate,
        tz: Option<FixedOffset>,
    },
    DateTime(DateTime<FixedOffset>),
    /// Total months; lexical form `PnYnM`.
    YearMonthDuration(i32),
    /// Total milliseconds; lexical form `PnDTnHnMnS`.
    DayTimeDuration(i64),
}

impl AtomicValue {
    /// Short datatype name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicValue::Boolean(_) => "boolean",
            AtomicValue::String(_) => "string",
            AtomicValue::Integer(_) => "integer",
            AtomicValue::Decimal(_) => "decimal",
            AtomicValue::AnyUri(_) => "anyURI",
            AtomicValue::Uuid(_) => "uuid",
            AtomicValue::UntypedAtomic(_) => "untypedAtomic",
            AtomicValue::Date { .. } => "date",
            AtomicValue::DateTime(_) => "dateTime",
            AtomicValue::YearMonthDuration(_) => "yearMonthDuration",
            AtomicValue::DayTimeDuration(_) => "dayTimeDuration",
        }
    }

    /// Canonical string form of the value.
    pub fn string_value(&self) -> String {
        match self {
            AtomicValue::Boolean(b) => {
                if *b {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            AtomicValue::String(s)
            | AtomicValue::AnyUri(s)
            | AtomicValue::UntypedAtomic(s) => s.clone(),
            AtomicValue::Integer(i) => i.to_string(),
            AtomicValue::Decimal(d) => format_decimal(*d),
            AtomicValue::Uuid(u) => u.to_string(),
            AtomicValue::Date { date, tz } => match tz {
                Some(off) => format!("{}{}", date.format("%Y-%m-%d"), format_offset(off)),
                None => date.format("%Y-%m-%d").to_string(),
            },
            AtomicValue::DateTime(dt) => dt.to_rfc3339(),
            AtomicValue::YearMonthDuration(months) => format_year_month(*months),
            AtomicValue::DayTimeDuration(millis) => format_day_time(*millis),
        }
    }

    /// Effective boolean value of a single atomic item. Types without a
    /// defined rule (dates, durations) raise [`ErrorKind::InvalidType`].
    pub fn boolean_value(&self) -> Result<bool, Error> {
        match self {
            AtomicValue::Boolean(b) => Ok(*b),
            AtomicValue::String(s)
            | AtomicValue::AnyUri(s)
            | AtomicValue::UntypedAtomic(s) => Ok(!s.trim().is_empty()),
            AtomicValue::Integer(i) => Ok(*i != 0),
            AtomicValue::Decimal(d) => Ok(*d != 0.0 && !d.is_nan()),
            other => Err(Error::new(
                ErrorKind::InvalidType,
                format!(
                    "effective boolean value is not defined for {}",
                    other.type_name()
                ),
            )),
        }
    }

    /// Numeric view used by promotion, predicates and aggregation. `None`
    /// for non-numeric values; untyped-atomic is parsed leniently.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            AtomicValue::Integer(i) => Some(*i as f64),
            AtomicValue::Decimal(d) => Some(*d),
            AtomicValue::UntypedAtomic(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, AtomicValue::Integer(_) | AtomicValue::Decimal(_))
    }

    /// Parse the lexical form `-?PnYnM` (either designator may be absent,
    /// not both) into total months.
    pub fn parse_year_month_duration(s: &str) -> Result<i32, Error> {
        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1i32, rest),
            None => (1i32, s),
        };
        let body = body.strip_prefix('P').ok_or_else(|| bad_duration(s))?;
        let mut months: i64 = 0;
        let mut seen = false;
        let mut rest = body;
        if let Some((num, tail)) = split_number(rest, 'Y') {
            months += num * 12;
            seen = true;
            rest = tail;
        }
        if let Some((num, tail)) = split_number(rest, 'M') {
            months += num;
            seen = true;
            rest = tail;
        }
        if !seen || !rest.is_empty() {
            return Err(bad_duration(s));
        }
        i32::try_from(months * i64::from(sign)).map_err(|_| bad_duration(s))
    }

    /// Parse the lexical form `-?PnDTnHnMn(.fff)?S` into total milliseconds.
    pub fn parse_day_time_duration(s: &str) -> Result<i64, Error> {
        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let body = body.strip_prefix('P').ok_or_else(|| bad_duration(s))?;
        let (date_part, time_part) = match body.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (body, None),
        };
        let mut millis: i64 = 0;
        let mut seen = false;
        let mut rest = date_part;
        if let Some((num, tail)) = split_number(rest, 'D') {
            millis += num * 86_400_000;
            seen = true;
            rest = tail;
        }
        if !rest.is_empty() {
            return Err(bad_duration(s));
        }
        if let Some(t) = time_part {
            let mut rest = t;
            if let Some((num, tail)) = split_number(rest, 'H') {
                millis += num * 3_600_000;
                seen = true;
                rest = tail;
            }
            if let Some((num, tail)) = split_number(rest, 'M') {
                millis += num * 60_000;
                seen = true;
                rest = tail;
            }
            if let Some(idx) = rest.find('S') {
                let lexical = &rest[..idx];
                let secs = lexical
                    .parse::<f64>()
                    .map_err(|_| bad_duration(s))?;
                millis += (secs * 1000.0).round() as i64;
                seen = true;
                rest = &rest[idx + 1..];
            }
            if !rest.is_empty() {
                return Err(bad_duration(s));
            }
        }
        if !seen {
            return Err(bad_duration(s));
        }
        Ok(millis * sign)
    }
}

fn bad_duration(s: &str) -> Error {
    Error::new(
        ErrorKind::InvalidType,
        format!("invalid duration literal '{s}'"),
    )
}

fn split_number(s: &str, designator: char) -> Option<(i64, &str)> {
    let idx = s.find(designator)?;
    let num = s[..idx].parse::<i64>().ok()?;
    Some((num, &s[idx + 1..]))
}

fn format_offset(off: &FixedOffset) -> String {
    let secs = off.local_minus_utc();
    if secs == 0 {
        return "Z".to_string();
    }
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

fn format_decimal(d: f64) -> String {
    if d == d.trunc() && d.abs() < 1e15 {
        format!("{}", d as i64)
    } else {
        d.to_string()
    }
}

fn format_year_month(months: i32) -> String {
    if months == 0 {
        return "P0M".to_string();
    }
    let mut out = String::new();
    if months < 0 {
        out.push('-');
    }
    out.push('P');
    let abs = months.abs();
    let years = abs / 12;
    let rem = abs % 12;
    if years > 0 {
        out.push_str(&format!("{years}Y"));
    }
    if rem > 0 || years == 0 {
        out.push_str(&format!("{rem}M"));
    }
    out
}

fn format_day_time(millis: i64) -> String {
    if millis == 0 {
        return "PT0S".to_string();
    }
    let mut out = String::new();
    if millis < 0 {
        out.push('-');
    }
    out.push('P');
    let abs = millis.abs();
    let days = abs / 86_400_000;
    let hours = (abs % 86_400_000) / 3_600_000;
    let minutes = (abs % 3_600_000) / 60_000;
    let millis_rem = abs % 60_000;
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || millis_rem > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if millis_rem > 0 {
            if millis_rem % 1000 == 0 {
                out.push_str(&format!("{}S", millis_rem / 1000));
            } else {
                out.push_str(&format!("{}.{:03}S", millis_rem / 1000, millis_rem % 1000));
            }
        }
    }
    out
}

impl fmt::Display for AtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value())
    }
}

/// A single evaluation item: a node handle or an atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<N> {
    Node(N),
    Atomic(AtomicValue),
}

impl<N> From<AtomicValue> for Item<N> {
    fn from(a: AtomicValue) -> Self {
        Item::Atomic(a)
    }
}

impl<N: crate::model::NodeItem> Item<N> {
    /// String form of the item; nodes project through their atomic value.
    pub fn string_value(&self) -> Result<String, Error> {
        match self {
            Item::Atomic(a) => Ok(a.string_value()),
            Item::Node(n) => Ok(n.to_atomic()?.string_value()),
        }
    }
}

/// Ordered, immutable collection of items; the universal result type of
/// every expression evaluation. Equality is order- and length-sensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<N>(SmallVec<[Item<N>; 1]>);

impl<N> Sequence<N> {
    pub fn empty() -> Self {
        Sequence(SmallVec::new())
    }

    pub fn singleton(item: Item<N>) -> Self {
        let mut v = SmallVec::new();
        v.push(item);
        Sequence(v)
    }

    pub fn of(items: impl IntoIterator<Item = Item<N>>) -> Self {
        Sequence(items.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Item<N>> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Item<N>> {
        self.0.first()
    }

    pub fn items(&self) -> &[Item<N>] {
        &self.0
    }

    /// The only item, if this is a singleton.
    pub fn as_singleton(&self) -> Option<&Item<N>> {
        if self.0.len() == 1 {
            self.0.first()
        } else {
            None
        }
    }

    pub(crate) fn push(&mut self, item: Item<N>) {
        self.0.push(item);
    }

    pub(crate) fn extend(&mut self, other: Sequence<N>) {
        self.0.extend(other.0);
    }
}

impl<N> Default for Sequence<N> {
    fn default() -> Self {
        Sequence::empty()
    }
}

impl<N> From<Vec<Item<N>>> for Sequence<N> {
    fn from(v: Vec<Item<N>>) -> Self {
        Sequence(v.into_iter().collect())
    }
}

impl<N> From<Item<N>> for Sequence<N> {
    fn from(item: Item<N>) -> Self {
        Sequence::singleton(item)
    }
}

impl<N> From<AtomicValue> for Sequence<N> {
    fn from(a: AtomicValue) -> Self {
        Sequence::singleton(Item::Atomic(a))
    }
}

impl<N> IntoIterator for Sequence<N> {
    type Item = Item<N>;
    type IntoIter = smallvec::IntoIter<[Item<N>; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, N> IntoIterator for &'a Sequence<N> {
    type Item = &'a Item<N>;
    type IntoIter = core::slice::Iter<'a, Item<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<N> FromIterator<Item<N>> for Sequence<N> {
    fn from_iter<T: IntoIterator<Item = Item<N>>>(iter: T) -> Self {
        Sequence(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_duration_lexical_round_trip() {
        let months = AtomicValue::parse_year_month_duration("P20Y").unwrap();
        assert_eq!(months, 240);
        assert_eq!(AtomicValue::YearMonthDuration(125).string_value(), "P10Y5M");
        assert_eq!(AtomicValue::YearMonthDuration(0).string_value(), "P0M");
        assert_eq!(
            AtomicValue::parse_year_month_duration("-P1Y6M").unwrap(),
            -18
        );
    }

    #[test]
    fn day_time_duration_lexical_round_trip() {
        let ms = AtomicValue::parse_day_time_duration("P1DT2H3M4.500S").unwrap();
        assert_eq!(ms, 86_400_000 + 2 * 3_600_000 + 3 * 60_000 + 4_500);
        assert_eq!(
            AtomicValue::DayTimeDuration(ms).string_value(),
            "P1DT2H3M4.500S"
        );
        assert!(AtomicValue::parse_day_time_duration("P").is_err());
    }

    #[test]
    fn decimal_string_form_drops_trailing_zero() {
        assert_eq!(AtomicValue::Decimal(4.0).string_value(), "4");
        assert_eq!(AtomicValue::Decimal(2.5).string_value(), "2.5");
    }
}
