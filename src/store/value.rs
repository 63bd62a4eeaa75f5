//! Values accepted by `Cache::store`

use std::fmt::Write as _;

/// A payload that can be written to the store
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

impl Value {
    /// Bytes as written to the store
    ///
    /// Numbers are stored as their decimal text, the way Redis clients send them.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Text(text) => text.as_bytes().to_vec(),
            Value::Bytes(bytes) => bytes.clone(),
            Value::Int(n) => n.to_string().into_bytes(),
            Value::Float(f) => format_float(*f).into_bytes(),
        }
    }

    /// The call's argument tuple as recorded in the `:inputs` history list
    ///
    /// ```
    /// use redis_basic::store::Value;
    ///
    /// assert_eq!(Value::from("foo").args_repr(), "('foo',)");
    /// assert_eq!(Value::from(42).args_repr(), "(42,)");
    /// ```
    pub fn args_repr(&self) -> String {
        let item = match self {
            Value::Text(text) => quote_text(text),
            Value::Bytes(bytes) => quote_bytes(bytes),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
        };
        format!("({},)", item)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Shortest round-trip digits, in exponent form below 1e-4 and from 1e16 up
///
/// Matches the float repr other Redis clients write, e.g. `2.0`, `0.0001`,
/// `1e-05`, `1e+16`.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sign = if f.is_sign_negative() { "-" } else { "" };
    if f == 0.0 {
        return format!("{}0.0", sign);
    }

    // LowerExp already yields the shortest digits, e.g. `1.2345678901234568e17`
    let sci = format!("{:e}", f.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{}{}", sign, sci);
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return format!("{}{}", sign, sci);
    };

    if !(-4..16).contains(&exp) {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exp.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exp + 1;
    let body = if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}.0", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    };
    format!("{}{}", sign, body)
}

/// Single quotes unless the text has a single quote and no double quote
fn pick_quote(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

/// Approximates `str.isprintable`: controls, separators other than the
/// ASCII space, format characters, private use and noncharacters are not
fn is_printable(c: char) -> bool {
    let cp = c as u32;
    if c.is_control() {
        return false;
    }
    !matches!(
        cp,
        0xa0 | 0xad
            | 0x0600..=0x0605
            | 0x061c
            | 0x06dd
            | 0x070f
            | 0x08e2
            | 0x1680
            | 0x180e
            | 0x2000..=0x200f
            | 0x2028..=0x202f
            | 0x205f..=0x2064
            | 0x2066..=0x206f
            | 0x3000
            | 0xe000..=0xf8ff
            | 0xfeff
            | 0xfff9..=0xfffb
            | 0xfffe..=0xffff
            | 0x110bd
            | 0x110cd
            | 0x13430..=0x1343f
            | 0x1bca0..=0x1bca3
            | 0x1d173..=0x1d17a
            | 0xe0001
            | 0xe0020..=0xe007f
            | 0xf0000..=0x10ffff
    ) && (cp & 0xfffe) != 0xfffe
}

/// `\xNN`, `\uNNNN` or `\UNNNNNNNN` depending on the code point's width
fn push_escaped(out: &mut String, c: char) {
    let cp = c as u32;
    let _ = if cp < 0x100 {
        write!(out, "\\x{:02x}", cp)
    } else if cp < 0x10000 {
        write!(out, "\\u{:04x}", cp)
    } else {
        write!(out, "\\U{:08x}", cp)
    };
}

fn quote_text(text: &str) -> String {
    let quote = pick_quote(text.contains('\''), text.contains('"'));
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => push_escaped(&mut out, c),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Bytes literal form, e.g. `b'key'`
pub(crate) fn quote_bytes(bytes: &[u8]) -> String {
    let quote = pick_quote(bytes.contains(&b'\''), bytes.contains(&b'"'));
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b as char == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(b as char),
            b => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bytes_numbers_are_decimal_text() {
        assert_eq!(Value::from(42).to_bytes(), b"42");
        assert_eq!(Value::from(-7i64).to_bytes(), b"-7");
        assert_eq!(Value::from(3.5).to_bytes(), b"3.5");
        assert_eq!(Value::from(2.0).to_bytes(), b"2.0");
    }

    #[test]
    fn test_to_bytes_text_and_bytes() {
        assert_eq!(Value::from("héllo").to_bytes(), "héllo".as_bytes());
        assert_eq!(Value::from(vec![0u8, 255]).to_bytes(), vec![0u8, 255]);
    }

    #[test]
    fn test_format_float_special_values() {
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_float(0.1), "0.1");
    }

    #[test]
    fn test_format_float_switches_to_exponent_at_the_edges() {
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(1e-7), "1e-07");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.2345678901234568e17), "1.2345678901234568e+17");
        assert_eq!(format_float(-2.5e-10), "-2.5e-10");
        assert_eq!(format_float(1e-5), "1e-05");
        assert_eq!(format_float(1e300), "1e+300");
    }

    #[test]
    fn test_format_float_positional_range() {
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(123.456), "123.456");
        assert_eq!(format_float(-2.0), "-2.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(0.00123), "0.00123");
    }

    #[test]
    fn test_args_repr_escapes_non_printable_unicode() {
        assert_eq!(Value::from("a\u{85}b").args_repr(), "('a\\x85b',)");
        assert_eq!(Value::from("zero\u{200b}width").args_repr(), "('zero\\u200bwidth',)");
        assert_eq!(Value::from("nb\u{a0}sp").args_repr(), "('nb\\xa0sp',)");
        assert_eq!(Value::from("\u{feff}").args_repr(), "('\\ufeff',)");
        assert_eq!(Value::from("\u{f0000}").args_repr(), "('\\U000f0000',)");
        // Printable non-ASCII text passes through untouched
        assert_eq!(Value::from("héllo 世界").args_repr(), "('héllo 世界',)");
    }

    #[test]
    fn test_args_repr_text_quoting() {
        assert_eq!(Value::from("foo").args_repr(), "('foo',)");
        assert_eq!(Value::from("it's").args_repr(), "(\"it's\",)");
        assert_eq!(Value::from("say \"hi\" it's").args_repr(), "('say \"hi\" it\\'s',)");
        assert_eq!(Value::from("a\nb\\c").args_repr(), "('a\\nb\\\\c',)");
    }

    #[test]
    fn test_args_repr_bytes() {
        assert_eq!(Value::from(&b"bar"[..]).args_repr(), "(b'bar',)");
        assert_eq!(Value::from(vec![0u8, 0x7f, b'a']).args_repr(), "(b'\\x00\\x7fa',)");
    }

    #[test]
    fn test_args_repr_numbers() {
        assert_eq!(Value::from(42).args_repr(), "(42,)");
        assert_eq!(Value::from(1.0).args_repr(), "(1.0,)");
    }
}
