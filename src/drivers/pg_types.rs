//! Wire types for PostgreSQL values that tokio-postgres has no Rust type for.
//!
//! NUMERIC binary layout (all big-endian):
//! - ndigits: i16 (number of base-10000 digit groups)
//! - weight: i16 (power of 10000 of the first group)
//! - sign: u16 (positive, negative, NaN or +/- infinity)
//! - dscale: u16 (digits after the decimal point)
//! - ndigits groups of i16, each 0..=9999

use std::error::Error;

use bytes::{Buf, BufMut, BytesMut};
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type};

type WireError = Box<dyn Error + Sync + Send>;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;
const NUMERIC_HEADER_SIZE: usize = 8;
const MAX_DSCALE: usize = 0x3FFF;

/// A NUMERIC value carried as its decimal text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PgNumeric(pub String);

impl PgNumeric {
    /// Checks `text` is a decimal PostgreSQL accepts, without sending it anywhere.
    pub(crate) fn parse(text: &str) -> Result<Self, WireError> {
        encode_numeric(text, &mut BytesMut::new())?;
        Ok(Self(text.trim().to_string()))
    }

    /// Integer value as a NUMERIC.
    pub(crate) fn from_i64(value: i64) -> Self {
        Self(value.to_string())
    }

    /// Float value as a NUMERIC. Rust's `Display` for floats never uses exponents.
    pub(crate) fn from_f64(value: f64) -> Self {
        let text = if value.is_nan() {
            "NaN".to_string()
        } else if value == f64::INFINITY {
            "Infinity".to_string()
        } else if value == f64::NEG_INFINITY {
            "-Infinity".to_string()
        } else {
            value.to_string()
        };
        Self(text)
    }
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, WireError> {
        decode_numeric(raw).map(Self)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

impl ToSql for PgNumeric {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, WireError> {
        encode_numeric(&self.0, out)?;
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }

    to_sql_checked!();
}

/// Decodes NUMERIC binary into canonical decimal text, padded to `dscale` digits.
pub(crate) fn decode_numeric(raw: &[u8]) -> Result<String, WireError> {
    let mut buf = raw;
    if buf.remaining() < NUMERIC_HEADER_SIZE {
        return Err(format!("numeric value too short: {} bytes", raw.len()).into());
    }

    let ndigits = buf.get_i16();
    let weight = i32::from(buf.get_i16());
    let sign = buf.get_u16();
    let dscale = usize::from(buf.get_u16());

    let ndigits = usize::try_from(ndigits)
        .map_err(|_| format!("negative numeric digit count: {ndigits}"))?;
    if buf.remaining() != ndigits * 2 {
        return Err(format!(
            "numeric value declares {ndigits} digits but carries {} bytes",
            buf.remaining()
        )
        .into());
    }
    let digits: Vec<i32> = (0..ndigits).map(|_| i32::from(buf.get_i16())).collect();

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign: {other:#06x}").into()),
    }

    let digit_at = |index: i32| {
        usize::try_from(index)
            .ok()
            .and_then(|index| digits.get(index).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }

    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&digit_at(0).to_string());
        for index in 1..=weight {
            text.push_str(&format!("{:04}", digit_at(index)));
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit_at(index)));
            index += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Ok(text)
}

/// Encodes decimal text (`[+-]digits[.digits]`, `NaN`, `[+-]Infinity`) as NUMERIC binary.
pub(crate) fn encode_numeric(text: &str, out: &mut impl BufMut) -> Result<(), WireError> {
    let text = text.trim();

    let special = match text {
        "NaN" => Some(NUMERIC_NAN),
        "Infinity" | "+Infinity" => Some(NUMERIC_PINF),
        "-Infinity" => Some(NUMERIC_NINF),
        _ => None,
    };
    if let Some(sign) = special {
        out.put_i16(0);
        out.put_i16(0);
        out.put_u16(sign);
        out.put_u16(0);
        return Ok(());
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(format!("invalid numeric literal: {text:?}").into());
    }
    if frac_part.len() > MAX_DSCALE {
        return Err(format!("numeric scale {} out of range", frac_part.len()).into());
    }

    // Align both halves on base-10000 group boundaries around the decimal point
    let int_digits = int_part.trim_start_matches('0');
    let int_padded = format!("{}{int_digits}", "0".repeat((4 - int_digits.len() % 4) % 4));
    let frac_padded = format!("{frac_part}{}", "0".repeat((4 - frac_part.len() % 4) % 4));

    let mut groups: Vec<i16> = int_padded
        .as_bytes()
        .chunks(4)
        .chain(frac_padded.as_bytes().chunks(4))
        .map(|chunk| chunk.iter().fold(0i16, |acc, b| acc * 10 + i16::from(b - b'0')))
        .collect();
    let mut weight = (int_padded.len() / 4) as i64 - 1;

    let leading_zeros = groups.iter().take_while(|group| **group == 0).count();
    groups.drain(..leading_zeros);
    weight -= leading_zeros as i64;
    while groups.last() == Some(&0) {
        groups.pop();
    }
    if groups.is_empty() {
        weight = 0;
    }

    let ndigits = i16::try_from(groups.len())
        .map_err(|_| format!("numeric literal has too many digits: {text:?}"))?;
    let weight =
        i16::try_from(weight).map_err(|_| format!("numeric weight out of range: {text:?}"))?;
    let sign = if negative && !groups.is_empty() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    };

    out.put_i16(ndigits);
    out.put_i16(weight);
    out.put_u16(sign);
    out.put_u16(frac_part.len() as u16);
    for group in groups {
        out.put_i16(group);
    }
    Ok(())
}

/// A value whose binary wire form is its UTF-8 text: text-like types and enums.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PgText(pub String);

impl PgText {
    pub(crate) fn is_text_like(ty: &Type) -> bool {
        <String as FromSql>::accepts(ty) || matches!(ty.kind(), Kind::Enum(_))
    }
}

impl<'a> FromSql<'a> for PgText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, WireError> {
        Ok(Self(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        Self::is_text_like(ty)
    }
}

impl ToSql for PgText {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, WireError> {
        out.put_slice(self.0.as_bytes());
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        Self::is_text_like(ty)
    }

    to_sql_checked!();
}

/// Any value, kept in its binary wire form. Sending it back reproduces the original value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawValue(pub Vec<u8>);

impl<'a> FromSql<'a> for RawValue {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, WireError> {
        Ok(Self(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

impl ToSql for RawValue {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, WireError> {
        out.put_slice(&self.0);
        Ok(IsNull::No)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
