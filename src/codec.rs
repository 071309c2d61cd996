//! Conversion between Rust values and the store's string representation.
//!
//! [`Scalar`] covers element types: one value, one wire string. [`Storable`] covers whole
//! values and adds the structured forms a value may take in a hash (fields) or in a list or set
//! (elements). Which of those a type supports is decided by its [`Shape`], once per type.

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::Shape;
use crate::{Error, Result};

/// A value stored as a single wire string.
pub trait Scalar: Sized + Serialize + DeserializeOwned {
    fn to_wire(&self) -> Result<String>;

    fn from_wire(wire: &str) -> Result<Self>;
}

/// A value the accessor can read and write.
///
/// Every type can be stored whole in a string key (`encode`/`decode`). Records and mappings
/// can additionally be flattened into hash fields, sequences into list or set elements.
pub trait Storable: Sized {
    const SHAPE: Shape;

    fn encode(&self) -> Result<String>;

    fn decode(wire: &str) -> Result<Self>;

    fn to_fields(&self) -> Result<Vec<(String, String)>> {
        Err(unsupported::<Self>("hash fields"))
    }

    fn from_fields(_fields: Vec<(String, String)>) -> Result<Self> {
        Err(unsupported::<Self>("hash fields"))
    }

    fn to_elements(&self) -> Result<Vec<String>> {
        Err(unsupported::<Self>("sequence elements"))
    }

    fn from_elements(_elements: Vec<String>) -> Result<Self> {
        Err(unsupported::<Self>("sequence elements"))
    }
}

fn unsupported<T>(form: &str) -> Error {
    Error::InvalidArgument(format!("{} cannot be stored as {}", type_name::<T>(), form))
}

/// A serde record, stored as JSON in a string key or as one hash field per member.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record<T>(pub T);

impl<T> Record<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

macro_rules! impl_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn to_wire(&self) -> Result<String> {
                    Ok(self.to_string())
                }

                fn from_wire(wire: &str) -> Result<Self> {
                    wire.parse::<$ty>()
                        .map_err(|e| Error::decode(wire, type_name::<$ty>(), e))
                }
            }
        )*
    };
}

impl_number!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl Scalar for bool {
    fn to_wire(&self) -> Result<String> {
        Ok(self.to_string())
    }

    fn from_wire(wire: &str) -> Result<Self> {
        match wire {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(Error::decode(wire, "bool", "not a boolean")),
        }
    }
}

impl Scalar for String {
    fn to_wire(&self) -> Result<String> {
        Ok(self.clone())
    }

    fn from_wire(wire: &str) -> Result<Self> {
        Ok(wire.to_string())
    }
}

impl Scalar for DateTime<Utc> {
    fn to_wire(&self) -> Result<String> {
        Ok(self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    fn from_wire(wire: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(wire)
            .map(|time| time.with_timezone(&Utc))
            .map_err(|e| Error::decode(wire, "timestamp", e))
    }
}

impl Scalar for Duration {
    fn to_wire(&self) -> Result<String> {
        Ok(format_duration(*self))
    }

    fn from_wire(wire: &str) -> Result<Self> {
        parse_duration(wire)
    }
}

impl<T: Serialize + DeserializeOwned> Scalar for Record<T> {
    fn to_wire(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| Error::InvalidArgument(e.to_string()))
    }

    fn from_wire(wire: &str) -> Result<Self> {
        serde_json::from_str(wire)
            .map(Record)
            .map_err(|e| Error::decode(wire, type_name::<T>(), e))
    }
}

macro_rules! impl_storable_scalar {
    ($shape:expr; $($ty:ty),* $(,)?) => {
        $(
            impl Storable for $ty {
                const SHAPE: Shape = $shape;

                fn encode(&self) -> Result<String> {
                    self.to_wire()
                }

                fn decode(wire: &str) -> Result<Self> {
                    Self::from_wire(wire)
                }
            }
        )*
    };
}

impl_storable_scalar!(Shape::Text; String);
impl_storable_scalar!(
    Shape::Scalar;
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool,
    DateTime<Utc>, Duration,
);

impl<T: Serialize + DeserializeOwned> Storable for Record<T> {
    const SHAPE: Shape = Shape::Record;

    fn encode(&self) -> Result<String> {
        self.to_wire()
    }

    fn decode(wire: &str) -> Result<Self> {
        Self::from_wire(wire)
    }

    fn to_fields(&self) -> Result<Vec<(String, String)>> {
        match serde_json::to_value(&self.0).map_err(|e| Error::InvalidArgument(e.to_string()))? {
            serde_json::Value::Object(members) => Ok(members
                .into_iter()
                .map(|(field, value)| (field, field_to_wire(value)))
                .collect()),
            other => Err(Error::InvalidArgument(format!(
                "{} serializes to {}, not to an object",
                type_name::<T>(),
                other
            ))),
        }
    }

    fn from_fields(fields: Vec<(String, String)>) -> Result<Self> {
        let members: serde_json::Map<String, serde_json::Value> = fields
            .into_iter()
            .map(|(field, wire)| {
                let value = field_from_wire(&wire);
                (field, value)
            })
            .collect();
        let object = serde_json::Value::Object(members);

        serde_json::from_value(object.clone())
            .map(Record)
            .map_err(|e| Error::decode(&object.to_string(), type_name::<T>(), e))
    }
}

/// Strings are written raw so hashes stay readable, unless the raw text would read back as
/// some other JSON value; then it is quoted.
fn field_to_wire(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) if serde_json::from_str::<serde_json::Value>(&s).is_err() => s,
        other => other.to_string(),
    }
}

fn field_from_wire(wire: &str) -> serde_json::Value {
    serde_json::from_str(wire).unwrap_or_else(|_| serde_json::Value::String(wire.to_string()))
}

macro_rules! impl_storable_mapping {
    ($map:ty, [$($generics:tt)*]) => {
        impl<$($generics)*> Storable for $map {
            const SHAPE: Shape = Shape::Mapping;

            fn encode(&self) -> Result<String> {
                serde_json::to_string(self).map_err(|e| Error::InvalidArgument(e.to_string()))
            }

            fn decode(wire: &str) -> Result<Self> {
                serde_json::from_str(wire).map_err(|e| Error::decode(wire, type_name::<Self>(), e))
            }

            fn to_fields(&self) -> Result<Vec<(String, String)>> {
                self.iter()
                    .map(|(field, value)| Ok((field.clone(), value.to_wire()?)))
                    .collect()
            }

            fn from_fields(fields: Vec<(String, String)>) -> Result<Self> {
                fields
                    .into_iter()
                    .map(|(field, wire)| Ok((field, V::from_wire(&wire)?)))
                    .collect()
            }
        }
    };
}

impl_storable_mapping!(HashMap<String, V, S>, [V: Scalar, S: BuildHasher + Default]);
impl_storable_mapping!(BTreeMap<String, V>, [V: Scalar]);

impl<V: Scalar> Storable for Vec<V> {
    const SHAPE: Shape = Shape::Sequence;

    fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidArgument(e.to_string()))
    }

    fn decode(wire: &str) -> Result<Self> {
        serde_json::from_str(wire).map_err(|e| Error::decode(wire, type_name::<Self>(), e))
    }

    fn to_elements(&self) -> Result<Vec<String>> {
        self.iter().map(Scalar::to_wire).collect()
    }

    fn from_elements(elements: Vec<String>) -> Result<Self> {
        elements.iter().map(|wire| V::from_wire(wire)).collect()
    }
}

/// Renders a duration as seconds with an optional fraction: `1s`, `1.5s`, `0.000001s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        return format!("{secs}s");
    }

    let fraction = format!("{nanos:09}");
    format!("{secs}.{}s", fraction.trim_end_matches('0'))
}

/// Parses a sequence of `<number><unit>` terms such as `1m30s`, `1.5s` or `250ms`.
/// Units: `h`, `m`, `s`, `ms`, `us` (or `µs`), `ns`. A bare `0` is zero.
pub fn parse_duration(wire: &str) -> Result<Duration> {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let fail = |reason: &str| Error::decode(wire, "duration", reason);

    if wire == "0" {
        return Ok(Duration::ZERO);
    }
    if wire.is_empty() {
        return Err(fail("empty duration"));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = wire;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_end == 0 {
            return Err(fail("expected a number"));
        }
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail.find(is_number).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let unit: u128 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            "" => return Err(fail("missing unit")),
            _ => return Err(fail("unknown unit")),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(fail("expected a number"));
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| fail("invalid number"))?
        };
        let mut nanos = whole.checked_mul(unit).ok_or_else(|| fail("overflow"))?;

        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(20)];
            let value: u128 = digits.parse().map_err(|_| fail("invalid number"))?;
            nanos += value * unit / 10u128.pow(digits.len() as u32);
        }

        total = total.checked_add(nanos).ok_or_else(|| fail("overflow"))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| fail("overflow"))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::BuildHasherDefault;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Geo {
        loc: String,
        unit: String,
        distance_type: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Place {
        name: String,
        code: String,
        visits: u32,
        open: bool,
        geo: Geo,
    }

    fn geo() -> Geo {
        Geo {
            loc: "10.757437,106.6794102".to_string(),
            unit: "km".to_string(),
            distance_type: "plane".to_string(),
        }
    }

    fn place() -> Place {
        Place {
            name: "Saigon".to_string(),
            // Looks like a number; must still come back as text.
            code: "700000".to_string(),
            visits: 3,
            open: true,
            geo: geo(),
        }
    }

    #[test]
    fn scalars_round_trip() {
        assert_eq!(i64::decode(&(-42i64).encode().unwrap()), Ok(-42));
        assert_eq!(u8::decode("255"), Ok(255));
        assert_eq!(f64::decode(&0.1f64.encode().unwrap()), Ok(0.1));
        assert_eq!(bool::decode(&true.encode().unwrap()), Ok(true));
        assert_eq!(String::decode("hello"), Ok("hello".to_string()));

        let now = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let wire = now.encode().unwrap();
        assert_eq!(wire, "2024-05-17T08:30:00.123456789Z");
        assert_eq!(DateTime::<Utc>::decode(&wire), Ok(now));
    }

    #[test]
    fn scalar_decode_errors() {
        assert!(matches!(i32::decode("abc"), Err(Error::Decode { .. })));
        assert!(matches!(u8::decode("256"), Err(Error::Decode { .. })));
        assert!(matches!(bool::decode("yes"), Err(Error::Decode { .. })));
        assert!(matches!(
            DateTime::<Utc>::decode("yesterday"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_secs(1)), "1s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_nanos(1)), "0.000000001s");
        assert_eq!(format_duration(Duration::ZERO), "0s");

        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration("2µs"), Ok(Duration::from_micros(2)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration(".5s"), Ok(Duration::from_millis(500)));

        for wire in ["", "1", "s", "1x", "1.2.3s"] {
            assert!(parse_duration(wire).is_err(), "{wire:?} should not parse");
        }

        let d = Duration::new(12, 340_000_000);
        assert_eq!(Duration::decode(&d.encode().unwrap()), Ok(d));
    }

    #[test]
    fn record_as_json() {
        let wire = Record(geo()).encode().unwrap();
        assert_eq!(Record::<Geo>::decode(&wire), Ok(Record(geo())));
        assert!(matches!(
            Record::<Geo>::decode("{\"loc\":"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn record_as_fields() {
        let fields = Record(place()).to_fields().unwrap();
        let field = |name: &str| {
            fields
                .iter()
                .find(|(f, _)| f == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(field("name"), Some("Saigon"));
        assert_eq!(field("code"), Some("\"700000\""));
        assert_eq!(field("visits"), Some("3"));
        assert_eq!(field("open"), Some("true"));

        assert_eq!(Record::<Place>::from_fields(fields), Ok(Record(place())));
    }

    #[test]
    fn record_from_plain_hash() {
        let fields = vec![
            ("loc".to_string(), "10.757437,106.6794102".to_string()),
            ("unit".to_string(), "km".to_string()),
            ("distance_type".to_string(), "plane".to_string()),
        ];
        assert_eq!(Record::<Geo>::from_fields(fields), Ok(Record(geo())));
    }

    #[test]
    fn scalar_record_has_no_fields() {
        assert!(matches!(
            Record(5).to_fields(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn mappings() {
        let map = HashMap::from([("k1".to_string(), 1), ("k2".to_string(), 2)]);

        let mut fields = map.to_fields().unwrap();
        fields.sort();
        assert_eq!(
            fields,
            vec![
                ("k1".to_string(), "1".to_string()),
                ("k2".to_string(), "2".to_string())
            ]
        );
        assert_eq!(HashMap::<String, i32>::from_fields(fields), Ok(map.clone()));
        assert_eq!(HashMap::<String, i32>::decode(&map.encode().unwrap()), Ok(map));

        let bad = vec![("k".to_string(), "x".to_string())];
        assert!(BTreeMap::<String, i32>::from_fields(bad).is_err());
    }

    #[test]
    fn mappings_with_any_hasher() {
        type Fixed = HashMap<String, i32, BuildHasherDefault<DefaultHasher>>;

        let mut map = Fixed::default();
        map.insert("k".to_string(), 7);
        assert_eq!(Fixed::SHAPE, Shape::Mapping);
        assert_eq!(Fixed::from_fields(map.to_fields().unwrap()), Ok(map.clone()));

        let ordered = BTreeMap::from([("b".to_string(), 2), ("a".to_string(), 1)]);
        assert_eq!(ordered.encode(), Ok(r#"{"a":1,"b":2}"#.to_string()));
        assert_eq!(BTreeMap::<String, i32>::SHAPE, Shape::Mapping);
    }

    #[test]
    fn sequences() {
        let seq = vec![Record(geo()), Record(geo())];
        let elements = seq.to_elements().unwrap();
        assert_eq!(Vec::<Record<Geo>>::from_elements(elements), Ok(seq.clone()));
        assert_eq!(Vec::<Record<Geo>>::decode(&seq.encode().unwrap()), Ok(seq));

        assert_eq!(vec![1, 2].encode(), Ok("[1,2]".to_string()));
        assert_eq!(
            Vec::<String>::decode("[\"v1\",\"v2\"]"),
            Ok(vec!["v1".to_string(), "v2".to_string()])
        );
    }

    #[test]
    fn scalars_have_no_structured_form() {
        assert!(matches!(5i32.to_fields(), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            String::from_elements(vec![]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
