//! Integer parsing helpers shared by the assembler and the compiler.

use num_traits::Num;
use std::num::ParseIntError;

/// Parse an unsigned integer with an optional `0x`, `0o` or `0b` radix
/// prefix. Unprefixed input is read as decimal.
pub fn parse_int<T>(s: &str) -> Result<T, ParseIntError>
where
    T: Num<FromStrRadixErr = ParseIntError>,
{
    if s.starts_with("0x") || s.starts_with("0X") {
        T::from_str_radix(&s[2..], 16)
    } else if s.starts_with("0o") || s.starts_with("0O") {
        T::from_str_radix(&s[2..], 8)
    } else if s.starts_with("0b") || s.starts_with("0B") {
        T::from_str_radix(&s[2..], 2)
    } else {
        T::from_str_radix(s, 10)
    }
}

#[cfg(test)]
mod test {
    use super::parse_int;

    #[test]
    fn radix_prefixes() {
        assert_eq!(parse_int::<u32>("15"), Ok(15));
        assert_eq!(parse_int::<u32>("0xF"), Ok(15));
        assert_eq!(parse_int::<u32>("0o17"), Ok(15));
        assert_eq!(parse_int::<u32>("0b1111"), Ok(15));
    }

    #[test]
    fn invalid_literals() {
        assert!(parse_int::<u32>("").is_err());
        assert!(parse_int::<u32>("0x").is_err());
        assert!(parse_int::<u32>("12a").is_err());
        assert!(parse_int::<u32>("-3").is_err());
    }
}
