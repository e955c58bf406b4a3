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

//! The symmetric codec behind the encrypted store.
//!
//! `encrypt` hex-encodes its input before running the cipher, then
//! hex-encodes the ciphertext again, so the stored form is always a
//! printable hex string no matter what bytes went in. `decrypt` is the exact
//! inverse: `decrypt(encrypt(x)) == x` for every byte string `x`, the empty
//! string included.
//!
//! The cipher is AES-256-ECB with an initialisation vector generated once
//! per codec instance. ECB does not chain blocks, so identical plaintexts
//! produce identical ciphertexts under the same key. That is a real
//! confidentiality weakness, but changing the mode would make every existing
//! store unreadable, so the scheme stays as it is.

use openssl::hash::{hash, MessageDigest};
use openssl::symm::{Cipher, Crypter, Mode};
use rand::{rngs::OsRng, Rng};
use secstr::SecStr;

use super::hex::{bin2hex, hex2bin};
use super::AES_BLOCK;
use crate::support::error::Error;

fn cipher() -> Cipher {
    Cipher::aes_256_ecb()
}

/// Encrypts and decrypts byte strings to and from the store's on-disk text
/// encoding.
///
/// The cipher key is derived once at construction and reused for every call
/// on the instance. It is kept in memory zeroed-on-drop.
pub struct EncryptionCodec {
    key: SecStr,
    /// Generated once at construction and reused for the codec's lifetime.
    /// The ECB mode in use takes no IV, but the vector is kept so a chaining
    /// mode could be introduced without reworking the construction path.
    iv: [u8; AES_BLOCK],
}

impl EncryptionCodec {
    /// Create a codec from `secret`.
    ///
    /// If `secret_is_hashed`, `secret` must already be key material in the
    /// hex digest form `hash_secret` produces; otherwise it is an arbitrary
    /// passphrase and is hashed here. Either way the key material is cut
    /// down (or zero-padded) to the cipher's key size.
    pub fn new(secret: &[u8], secret_is_hashed: bool) -> Result<Self, Error> {
        let hashed = if secret_is_hashed {
            secret.to_vec()
        } else {
            Self::hash_secret(secret)?.into_bytes()
        };

        let mut key = hashed;
        key.resize(cipher().key_len(), 0);

        Ok(EncryptionCodec {
            key: SecStr::new(key),
            iv: OsRng.gen(),
        })
    }

    /// Hash an arbitrary secret into stable-length key material.
    ///
    /// The result is a printable hex digest, safe to pass around in
    /// configuration as a "pre-hashed" secret.
    pub fn hash_secret(secret: &[u8]) -> Result<String, Error> {
        Ok(bin2hex(&hash(MessageDigest::sha256(), secret)?))
    }

    fn crypter(&self, mode: Mode) -> Result<Crypter, Error> {
        Ok(Crypter::new(
            cipher(),
            mode,
            self.key.unsecure(),
            Some(&self.iv),
        )?)
    }

    fn run_cipher(&self, mode: Mode, data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut crypter = self.crypter(mode)?;
        let mut out = vec![0u8; data.len() + cipher().block_size()];
        let mut written = crypter.update(data, &mut out)?;
        written += crypter.finalize(&mut out[written..])?;
        out.truncate(written);
        Ok(out)
    }

    /// Encode and encrypt potentially untrusted binary data into text safe
    /// for any text-oriented backend.
    pub fn encrypt(&self, data: &[u8]) -> Result<String, Error> {
        let encoded = bin2hex(data);
        let encrypted = self.run_cipher(Mode::Encrypt, encoded.as_bytes())?;
        Ok(bin2hex(&encrypted))
    }

    /// Decode and decrypt text produced by `encrypt`, returning the original
    /// binary data.
    pub fn decrypt(&self, stored: &str) -> Result<Vec<u8>, Error> {
        let decoded = hex2bin(stored)?;
        let decrypted = self.run_cipher(Mode::Decrypt, &decoded)?;
        // A correct decryption yields pure ASCII hex; anything else is
        // caught by the final decode.
        hex2bin(&String::from_utf8_lossy(&decrypted))
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn codec() -> EncryptionCodec {
        EncryptionCodec::new(b"store secret", false).unwrap()
    }

    #[test]
    fn round_trips_simple_data() {
        let codec = codec();
        let encrypted = codec.encrypt(b"Hello, world").unwrap();
        assert_eq!(b"Hello, world".to_vec(), codec.decrypt(&encrypted).unwrap());
    }

    #[test]
    fn round_trips_empty_data() {
        let codec = codec();
        let encrypted = codec.encrypt(b"").unwrap();
        assert_eq!(Vec::<u8>::new(), codec.decrypt(&encrypted).unwrap());
    }

    #[test]
    fn round_trips_nul_and_control_bytes() {
        let codec = codec();
        let data = b"\x00\x01\x02\r\n\x7F\xFF\x00".to_vec();
        let encrypted = codec.encrypt(&data).unwrap();
        assert_eq!(data, codec.decrypt(&encrypted).unwrap());
    }

    #[test]
    fn stored_form_is_printable_hex() {
        let codec = codec();
        let encrypted = codec.encrypt(b"\x00\xFF").unwrap();
        assert!(encrypted.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn double_encrypt_pairs_with_double_decrypt() {
        let codec = codec();
        let once = codec.encrypt(b"layered").unwrap();
        let twice = codec.encrypt(once.as_bytes()).unwrap();

        let back_once = codec.decrypt(&twice).unwrap();
        assert_eq!(once.as_bytes().to_vec(), back_once);
        let back = codec
            .decrypt(&String::from_utf8(back_once).unwrap())
            .unwrap();
        assert_eq!(b"layered".to_vec(), back);
    }

    #[test]
    fn prehashed_secret_is_equivalent() {
        let hashed = EncryptionCodec::hash_secret(b"store secret").unwrap();
        let from_plain = EncryptionCodec::new(b"store secret", false).unwrap();
        let from_hashed =
            EncryptionCodec::new(hashed.as_bytes(), true).unwrap();

        let encrypted = from_plain.encrypt(b"shared").unwrap();
        assert_eq!(
            b"shared".to_vec(),
            from_hashed.decrypt(&encrypted).unwrap()
        );
    }

    #[test]
    fn wrong_key_does_not_reveal_plaintext() {
        let encrypted = codec().encrypt(b"secret data").unwrap();
        let other = EncryptionCodec::new(b"other secret", false).unwrap();
        // Decryption under the wrong key must error or produce different
        // bytes; either way the plaintext must not come back.
        assert!(other
            .decrypt(&encrypted)
            .map(|decrypted| decrypted != b"secret data".to_vec())
            .unwrap_or(true));
    }

    #[test]
    fn decrypt_rejects_malformed_text() {
        assert!(codec().decrypt("zz").is_err());
        assert!(codec().decrypt("abc").is_err());
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_data(
            data in prop::collection::vec(any::<u8>(), 0..512)
        ) {
            let codec = codec();
            let encrypted = codec.encrypt(&data).unwrap();
            prop_assert_eq!(data, codec.decrypt(&encrypted).unwrap());
        }
    }
}
