use super::Parser;
use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind};
use ErrorKind::*;

/// An integer type that can be read from a JSON number. The default value should be 0.
pub trait Num: Sized {
    /// The name of this type, as used in error messages.
    const NAME: &'static str;

    /// The [`NumBuilder`] for this type of number.
    type Builder: NumBuilder + Default;

    /// Tries getting a number of this type from the given [`NumBuilder`], possibly negating
    /// it and multiplying by a power of 10. This will return [`None`] if it is not possible to
    /// represent the desired number with this type.
    fn from_builder(builder: Self::Builder, negate: bool, exp_10: i32) -> Option<Self>;
}

/// An interface for "constructing" a number by iteratively appending digits.
pub trait NumBuilder {
    /// Attempts to "append" a digit to the number, returning `false` if this would result in
    /// overflow
    fn push_digit(&mut self, digit: u8) -> bool;
}

macro_rules! impl_unsigned {
    ($ty:ty) => {
        impl Num for $ty {
            const NAME: &'static str = stringify!($ty);
            type Builder = Self;
            fn from_builder(value: Self, negate: bool, exp_10: i32) -> Option<Self> {
                if negate && value != 0 {
                    return None;
                }
                let ten: Self = 10;
                if let Ok(exp_10) = u32::try_from(exp_10) {
                    let pow = ten.checked_pow(exp_10)?;
                    value.checked_mul(pow)
                } else {
                    let pow = ten.checked_pow(exp_10.unsigned_abs())?;
                    if value.wrapping_rem(pow) != 0 {
                        return None;
                    }
                    Some(value.wrapping_div(pow))
                }
            }
        }

        impl NumBuilder for $ty {
            fn push_digit(&mut self, digit: u8) -> bool {
                match self.checked_mul(10).and_then(|x| x.checked_add(Self::from(digit))) {
                    Some(x) => {
                        *self = x;
                        true
                    }
                    None => false,
                }
            }
        }
    };
}

impl_unsigned!(u8);
impl_unsigned!(u16);
impl_unsigned!(u32);
impl_unsigned!(u64);
impl_unsigned!(u128);

macro_rules! impl_signed {
    ($ty:ty, $unsigned_ty:ty) => {
        impl Num for $ty {
            const NAME: &'static str = stringify!($ty);
            type Builder = $unsigned_ty;
            fn from_builder(mut value: Self::Builder, negate: bool, exp_10: i32) -> Option<Self> {
                let ten: Self::Builder = 10;
                if let Ok(exp_10) = u32::try_from(exp_10) {
                    let pow = ten.checked_pow(exp_10)?;
                    value = value.checked_mul(pow)?;
                } else {
                    let pow = ten.checked_pow(exp_10.unsigned_abs())?;
                    if value.wrapping_rem(pow) != 0 {
                        return None;
                    }
                    value = value.wrapping_div(pow);
                };
                if negate {
                    Self::checked_sub_unsigned(0, value)
                } else {
                    Self::try_from(value).ok()
                }
            }
        }
    };
}

impl_signed!(i8, u8);
impl_signed!(i16, u16);
impl_signed!(i32, u32);
impl_signed!(i64, u64);
impl_signed!(i128, u128);

/// Returns the lookahead character of `cursor` and advances past it.
fn bump(cursor: &mut Cursor) -> Result<Option<char>, Error> {
    let ch = cursor.current();
    cursor.advance()?;
    Ok(ch)
}

/// Pushes a digit character into `builder`, failing with an overflow error if it doesn't fit.
fn push(
    cursor: &Cursor,
    builder: &mut impl NumBuilder,
    ch: char,
    name: &'static str,
) -> Result<(), Error> {
    if builder.push_digit((ch as u8) - b'0') {
        Ok(())
    } else {
        Err(cursor.error(NumberOverflow(name)))
    }
}

/// Reads a JSON number into a [`NumBuilder`], also returning whether the number is negated and
/// what its base-10 exponent is. `name` identifies the target type in error messages.
pub(crate) fn read_number_into_builder(
    cursor: &mut Cursor,
    builder: &mut impl NumBuilder,
    name: &'static str,
) -> Result<(bool, i32), Error> {
    let bad = |cursor: &Cursor| match cursor.current() {
        Some(_) => cursor.error(BadNumber(name)),
        None => cursor.error(UnexpectedEof),
    };
    let mut negate = false;
    let mut decimal_exp = 0;
    'fractional: {
        'integral: {
            // Leading digit (and sign) of the integral component
            let mut lead = cursor.current();
            if lead == Some('-') {
                cursor.advance()?;
                negate = true;
                lead = cursor.current();
            }
            match lead {
                Some('0') => {
                    cursor.advance()?;
                    match cursor.current() {
                        Some('.') => {
                            cursor.advance()?;
                            break 'integral;
                        }
                        Some('e' | 'E') => {
                            cursor.advance()?;
                            break 'fractional;
                        }
                        _ => return Ok((negate, 0)),
                    }
                }
                Some(ch @ '1'..='9') => {
                    cursor.advance()?;
                    push(cursor, builder, ch, name)?;
                }
                _ => return Err(bad(cursor)),
            }

            // Remaining digits of the integral component
            loop {
                match cursor.current() {
                    Some(ch @ '0'..='9') => {
                        push(cursor, builder, ch, name)?;
                        cursor.advance()?;
                    }
                    Some('.') => {
                        cursor.advance()?;
                        break 'integral;
                    }
                    Some('e' | 'E') => {
                        cursor.advance()?;
                        break 'fractional;
                    }
                    _ => return Ok((negate, 0)),
                }
            }
        }

        // Fractional component (the decimal point is already consumed). Zeros are held back
        // until a non-zero digit follows, so trailing zeros never reach the builder.
        if !matches!(cursor.current(), Some('0'..='9')) {
            return Err(bad(cursor));
        }
        let mut zeros = 0;
        loop {
            match cursor.current() {
                Some('0') => {
                    cursor.advance()?;
                    zeros += 1;
                }
                Some(ch @ '1'..='9') => {
                    for _ in 0..zeros {
                        push(cursor, builder, '0', name)?;
                    }
                    push(cursor, builder, ch, name)?;
                    cursor.advance()?;
                    decimal_exp -= zeros + 1;
                    zeros = 0;
                }
                Some('e' | 'E') => {
                    cursor.advance()?;
                    break 'fractional;
                }
                _ => return Ok((negate, decimal_exp)),
            }
        }
    }

    // Exponent (the 'e'/'E' is already consumed)
    let mut exp_builder: u32 = 0;
    let mut negate_exp = false;
    match cursor.current() {
        Some('+') => {
            cursor.advance()?;
        }
        Some('-') => {
            cursor.advance()?;
            negate_exp = true;
        }
        _ => {}
    }
    match bump(cursor)? {
        Some(ch @ '0'..='9') => {
            exp_builder.push_digit((ch as u8) - b'0');
        }
        Some(_) => return Err(cursor.error(BadNumber(name))),
        None => return Err(cursor.error(UnexpectedEof)),
    }
    while let Some(ch @ '0'..='9') = cursor.current() {
        if !exp_builder.push_digit((ch as u8) - b'0') {
            return Err(cursor.error(NumberOverflow(name)));
        }
        cursor.advance()?;
    }
    let Some(exp) = i32::try_from(exp_builder)
        .ok()
        .and_then(|exp| if negate_exp { exp.checked_neg() } else { Some(exp) })
        .and_then(|exp| exp.checked_add(decimal_exp))
    else {
        return Err(cursor.error(NumberOverflow(name)));
    };
    Ok((negate, exp))
}

/// Reads the text of a JSON number into the capture buffer, validating its shape but not its
/// magnitude.
pub(crate) fn capture_number(cursor: &mut Cursor, name: &'static str) -> Result<(), Error> {
    cursor.buffer().clear();
    scan_number(cursor, name, true)
}

/// Advances past a JSON number, validating its shape but not its magnitude.
pub(crate) fn skip_number(cursor: &mut Cursor) -> Result<(), Error> {
    scan_number(cursor, "number", false)
}

fn take(cursor: &mut Cursor, ch: char, keep: bool) -> Result<(), Error> {
    match keep {
        true => cursor.capture(ch)?,
        false => cursor.advance()?,
    };
    Ok(())
}

/// Consumes a non-empty run of digits.
fn digits(cursor: &mut Cursor, name: &'static str, keep: bool) -> Result<(), Error> {
    let mut count = 0;
    while let Some(ch @ '0'..='9') = cursor.current() {
        take(cursor, ch, keep)?;
        count += 1;
    }
    if count == 0 {
        return Err(match cursor.current() {
            Some(_) => cursor.error(BadNumber(name)),
            None => cursor.error(UnexpectedEof),
        });
    }
    Ok(())
}

/// Consumes the sign, integral and fractional components of a number.
fn mantissa(cursor: &mut Cursor, name: &'static str, keep: bool) -> Result<(), Error> {
    if cursor.current() == Some('-') {
        take(cursor, '-', keep)?;
    }
    digits(cursor, name, keep)?;
    if cursor.current() == Some('.') {
        take(cursor, '.', keep)?;
        digits(cursor, name, keep)?;
    }
    Ok(())
}

fn scan_number(cursor: &mut Cursor, name: &'static str, keep: bool) -> Result<(), Error> {
    mantissa(cursor, name, keep)?;
    if let Some(ch @ ('e' | 'E')) = cursor.current() {
        take(cursor, ch, keep)?;
        if let Some(sign @ ('+' | '-')) = cursor.current() {
            take(cursor, sign, keep)?;
        }
        digits(cursor, name, keep)?;
    }
    Ok(())
}

impl Parser<'_> {
    /// Parses an integer, given either as a JSON number or as a quoted JSON number.
    pub fn parse_integer<N: Num>(&mut self) -> Result<N, Error> {
        let quoted = match self.cursor.skip_whitespace()? {
            Some('"') => {
                self.cursor.advance()?;
                true
            }
            Some('n') => return Err(self.cursor.error(UnexpectedNull(N::NAME))),
            _ => false,
        };
        let mut builder = N::Builder::default();
        let (negate, exp) = read_number_into_builder(&mut self.cursor, &mut builder, N::NAME)?;
        let Some(value) = N::from_builder(builder, negate, exp) else {
            return Err(self.cursor.error(NumberOverflow(N::NAME)));
        };
        if quoted {
            self.cursor.expect('"')?;
        }
        Ok(value)
    }

    /// Parses a floating-point number, given either as a JSON number or as a quoted JSON number.
    pub fn parse_float<F: std::str::FromStr>(&mut self, name: &'static str) -> Result<F, Error> {
        let quoted = match self.cursor.skip_whitespace()? {
            Some('"') => {
                self.cursor.advance()?;
                true
            }
            Some('n') => return Err(self.cursor.error(UnexpectedNull(name))),
            _ => false,
        };
        capture_number(&mut self.cursor, name)?;
        let Ok(value) = self.cursor.buffer().as_str().parse::<F>() else {
            return Err(self.cursor.error(BadNumber(name)));
        };
        if quoted {
            self.cursor.expect('"')?;
        }
        Ok(value)
    }

    /// Parses an exact base-10 decimal, given either as a JSON number or as a quoted JSON
    /// number. Exponents are not accepted.
    #[cfg(feature = "rust_decimal")]
    pub fn parse_decimal(&mut self) -> Result<rust_decimal::Decimal, Error> {
        const NAME: &str = "decimal";
        let quoted = match self.cursor.skip_whitespace()? {
            Some('"') => {
                self.cursor.advance()?;
                true
            }
            Some('n') => return Err(self.cursor.error(UnexpectedNull(NAME))),
            _ => false,
        };
        self.cursor.buffer().clear();
        mantissa(&mut self.cursor, NAME, true)?;
        if let Some('e' | 'E') = self.cursor.current() {
            return Err(self.cursor.error(BadNumber(NAME)));
        }
        let Ok(value) = self.cursor.buffer().as_str().parse() else {
            return Err(self.cursor.error(NumberOverflow(NAME)));
        };
        if quoted {
            self.cursor.expect('"')?;
        }
        Ok(value)
    }
}

#[test]
fn test_from_builder() {
    assert_eq!(u8::from_builder(255, false, 0), Some(255));
    assert_eq!(u8::from_builder(26, false, 1), None);
    assert_eq!(u32::from_builder(1200, false, -2), Some(12));
    assert_eq!(u32::from_builder(1201, false, -2), None);
    assert_eq!(i8::from_builder(128, true, 0), Some(-128));
    assert_eq!(i8::from_builder(128, false, 0), None);
    assert_eq!(u16::from_builder(0, true, 0), Some(0));
}

#[test]
fn test_read_number() {
    use crate::capture::CaptureBuffer;
    let mut buffer = CaptureBuffer::new(256);
    for (text, expected) in [
        ("0", Some((false, 0, 0u64))),
        ("-0", Some((true, 0, 0))),
        ("42", Some((false, 0, 42))),
        ("-1.50", Some((true, -1, 15))),
        ("2.050", Some((false, -2, 205))),
        ("1.00000000000000000000000", Some((false, 0, 1))),
        ("0.000e5", Some((false, 5, 0))),
        ("3e4", Some((false, 4, 3))),
        ("12.5E-1", Some((false, -2, 125))),
        ("-", None),
        ("1.", None),
        ("1e+", None),
        ("x", None),
    ] {
        let mut cursor = Cursor::from_text(text, &mut buffer, false);
        let mut builder = 0u64;
        let res = read_number_into_builder(&mut cursor, &mut builder, "u64");
        match expected {
            Some((negate, exp, value)) => {
                assert_eq!(res.unwrap(), (negate, exp), "{}", text);
                assert_eq!(builder, value, "{}", text);
            }
            None => assert!(res.is_err(), "{}", text),
        }
    }
}

#[test]
fn test_capture_number() {
    use crate::capture::CaptureBuffer;
    let mut buffer = CaptureBuffer::new(256);
    let mut cursor = Cursor::from_text("-12.75e+3,", &mut buffer, false);
    capture_number(&mut cursor, "f64").unwrap();
    assert_eq!(cursor.buffer().as_str(), "-12.75e+3");
    assert_eq!(cursor.current(), Some(','));

    // Skipping checks the shape only
    drop(cursor);
    let mut cursor = Cursor::from_text("1e99999999999 ", &mut buffer, false);
    skip_number(&mut cursor).unwrap();
    assert_eq!(cursor.current(), Some(' '));
    drop(cursor);
    let mut cursor = Cursor::from_text("1.e5", &mut buffer, false);
    assert!(skip_number(&mut cursor).is_err());
}
