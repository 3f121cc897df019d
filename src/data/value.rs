use std::fmt;

use serde::{Deserialize, Serialize};

/// One caller-supplied element, before it is coerced to a number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Bool(bool),
    Text(String),
    #[default]
    Null,
}

impl RawValue {
    /// Coerce to a number the way a browser's `Number(..)` does.
    /// Null is 0, booleans are 0/1, text goes through `coerce_number`.
    pub fn to_number(&self) -> f64 {
        match self {
            RawValue::Number(v) => *v,
            RawValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            RawValue::Text(s) => coerce_number(s),
            RawValue::Null => 0.0,
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => f.write_str(&format_number(*v)),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Null => f.write_str("null"),
        }
    }
}

/// A `{x, y}` record row. Missing fields read as null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub x: RawValue,
    #[serde(default)]
    pub y: RawValue,
}

/// Shape of the data handed to `analyze_dataset`, resolved once at the boundary.
///
/// Variant order matters for untagged deserialization: `[]` and arrays of
/// scalars land in `Series`, arrays of 2-element arrays in `Pairs`, arrays of
/// objects in `Records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetInput {
    Text(String),
    Series(Vec<RawValue>),
    Pairs(Vec<(RawValue, RawValue)>),
    Records(Vec<Record>),
}

impl DatasetInput {
    pub fn kind(&self) -> &'static str {
        match self {
            DatasetInput::Text(_) => "text",
            DatasetInput::Series(_) => "series",
            DatasetInput::Pairs(_) => "pairs",
            DatasetInput::Records(_) => "records",
        }
    }
}

impl From<&[f64]> for DatasetInput {
    fn from(values: &[f64]) -> Self {
        DatasetInput::Series(values.iter().copied().map(RawValue::Number).collect())
    }
}

impl From<&str> for DatasetInput {
    fn from(text: &str) -> Self {
        DatasetInput::Text(text.to_string())
    }
}

/// Parse text as a number with browser `Number(..)` rules:
/// surrounding whitespace ignored, empty text is 0, `Infinity` and
/// `0x`/`0o`/`0b` literals accepted, anything else that is not a plain
/// decimal literal is NaN.
pub fn coerce_number(text: &str) -> f64 {
    let s = text.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust's float parser also takes "inf"/"nan", which must stay NaN here
    let decimal_chars = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !decimal_chars {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Coerce every element and keep only finite results.
pub fn finite_values(values: &[RawValue]) -> Vec<f64> {
    values
        .iter()
        .map(RawValue::to_number)
        .filter(|v| v.is_finite())
        .collect()
}

/// Number to text with browser `String(n)` rules: shortest round-trip
/// digits, plain notation for magnitudes in `[1e-6, 1e21)`, exponent form
/// (`1e+21`, `1.5e-7`) outside it.
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v == f64::INFINITY {
        return "Infinity".to_string();
    }
    if v == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e3"
    let sci = format!("{:e}", v.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{v}");
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return format!("{v}");
    };
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{sign}{}", exp.abs())
        } else {
            format!("{lead}.{rest}e{sign}{}", exp.abs())
        }
    };

    if v < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

/// Fixed-point text with `digits` decimals using browser `toFixed` rules:
/// exact halves round away from zero, and magnitudes of `1e21` or more (or
/// non-finite values) fall back to `format_number`.
pub fn to_fixed(v: f64, digits: usize) -> String {
    if !v.is_finite() || v.abs() >= 1e21 {
        return format_number(v);
    }

    // Every f64 has at most 1074 fractional decimal digits, so this is exact.
    let exact = format!("{:.1100}", v.abs());
    let (int, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int.bytes().chain(frac.bytes().take(digits)).collect();
    let round_up = frac.as_bytes().get(digits).is_some_and(|d| *d >= b'5');

    if round_up {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, b'1');
                break;
            }
            i -= 1;
            if kept[i] == b'9' {
                kept[i] = b'0';
            } else {
                kept[i] += 1;
                break;
            }
        }
    }

    let int_len = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if v < 0.0 {
        out.push('-');
    }
    out.extend(kept[..int_len].iter().map(|&b| b as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[int_len..].iter().map(|&b| b as char));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_like_browser_number() {
        assert_eq!(coerce_number("  42 "), 42.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert_eq!(coerce_number("-1.5e2"), -150.0);
        assert_eq!(coerce_number("0x10"), 16.0);
        assert_eq!(coerce_number("-Infinity"), f64::NEG_INFINITY);
        assert!(coerce_number("4.14%").is_nan());
        assert!(coerce_number("inf").is_nan());
        assert!(coerce_number("NaN").is_nan());
        assert!(coerce_number("abc").is_nan());
        assert!(coerce_number("0x").is_nan());
    }

    #[test]
    fn raw_values_coerce() {
        assert_eq!(RawValue::Null.to_number(), 0.0);
        assert_eq!(RawValue::Bool(true).to_number(), 1.0);
        assert_eq!(RawValue::from("7").to_number(), 7.0);
        let vals = finite_values(&[
            RawValue::from(1.0),
            RawValue::from("x"),
            RawValue::from(f64::INFINITY),
            RawValue::from("3"),
        ]);
        assert_eq!(vals, vec![1.0, 3.0]);
    }

    #[test]
    fn labels_format_without_trailing_zero() {
        assert_eq!(RawValue::from(2020.0).to_string(), "2020");
        assert_eq!(RawValue::from(1.25).to_string(), "1.25");
        assert_eq!(RawValue::Null.to_string(), "null");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(to_fixed(2.0 / 3.0, 3), "0.667");
        assert_eq!(to_fixed(f64::NAN, 3), "NaN");
    }

    #[test]
    fn numbers_switch_to_exponent_form_at_browser_thresholds() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e-6), "0.000001");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(123.456), "123.456");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn fixed_rounds_exact_halves_up() {
        assert_eq!(to_fixed(0.0625, 3), "0.063");
        assert_eq!(to_fixed(-0.0625, 3), "-0.063");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        // 1.005 is stored just below the half, so it rounds down
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(9.9996, 3), "10.000");
        assert_eq!(to_fixed(0.0, 3), "0.000");
        assert_eq!(to_fixed(-0.0001, 3), "-0.000");
        assert_eq!(to_fixed(1e21, 3), "1e+21");
    }

    #[test]
    fn input_shape_resolves_from_json() {
        let series: DatasetInput = serde_json::from_str("[1, \"2\", null]").unwrap();
        assert_eq!(series.kind(), "series");
        let empty: DatasetInput = serde_json::from_str("[]").unwrap();
        assert_eq!(empty, DatasetInput::Series(Vec::new()));
        let text: DatasetInput = serde_json::from_str("\"Year,Value\\n2020,1\"").unwrap();
        assert_eq!(text.kind(), "text");
        let pairs: DatasetInput = serde_json::from_str("[[\"2020\", 1], [\"2021\", 2]]").unwrap();
        assert_eq!(pairs.kind(), "pairs");
        let records: DatasetInput =
            serde_json::from_str("[{\"x\": \"a\", \"y\": 1}, {\"x\": \"b\"}]").unwrap();
        match records {
            DatasetInput::Records(rows) => assert_eq!(rows[1].y, RawValue::Null),
            other => panic!("expected records, got {}", other.kind()),
        }
    }
}
