//-
// Copyright (c) 2026, the mailbiff authors
//
// This file is part of mailbiff.
//
// Mailbiff is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public  License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mailbiff is distributed in the hope  that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// mailbiff. If not, see <http://www.gnu.org/licenses/>.

//! Hex digit string codec.
//!
//! `bin2hex` and `hex2bin` are exact inverses. The store pipes everything
//! through them so that neither NUL bytes nor control characters ever reach
//! the block cipher or the file backend raw.

use crate::support::error::Error;

const HEXITS: &[u8; 16] = b"0123456789abcdef";

/// Encode `data` as a lowercase hex digit string.
pub fn bin2hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for &byte in data {
        out.push(HEXITS[usize::from(byte >> 4)] as char);
        out.push(HEXITS[usize::from(byte & 0xF)] as char);
    }
    out
}

/// Decode a hex digit string back to the bytes it encodes.
///
/// Fails on odd-length input and on any character outside `[0-9A-Fa-f]`.
pub fn hex2bin(hex: &str) -> Result<Vec<u8>, Error> {
    if 1 == hex.len() % 2 {
        return Err(Error::OddHexLength(hex.len()));
    }

    let mut out = Vec::with_capacity(hex.len() / 2);
    for pair in hex.as_bytes().chunks(2) {
        out.push(hexit_value(pair[0])? << 4 | hexit_value(pair[1])?);
    }
    Ok(out)
}

fn hexit_value(hexit: u8) -> Result<u8, Error> {
    match hexit {
        b'0'..=b'9' => Ok(hexit - b'0'),
        b'a'..=b'f' => Ok(hexit - b'a' + 10),
        b'A'..=b'F' => Ok(hexit - b'A' + 10),
        _ => Err(Error::BadHexDigit(char::from(hexit))),
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::support::error::Error;

    #[test]
    fn encodes_known_values() {
        assert_eq!("", bin2hex(b""));
        assert_eq!("00", bin2hex(b"\x00"));
        assert_eq!("48656c6c6f", bin2hex(b"Hello"));
        assert_eq!("ff00fe", bin2hex(b"\xFF\x00\xFE"));
    }

    #[test]
    fn decodes_both_cases() {
        assert_eq!(b"Hello".to_vec(), hex2bin("48656c6c6f").unwrap());
        assert_eq!(b"Hello".to_vec(), hex2bin("48656C6C6F").unwrap());
    }

    #[test]
    fn rejects_odd_length() {
        assert_matches!(Err(Error::OddHexLength(3)), hex2bin("abc"));
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert_matches!(Err(Error::BadHexDigit('g')), hex2bin("0g"));
        assert_matches!(Err(Error::BadHexDigit(' ')), hex2bin("00 1"));
    }

    proptest! {
        #[test]
        fn round_trips(data in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(&data, &hex2bin(&bin2hex(&data)).unwrap());
        }
    }
}
