//! Block cipher and MAC primitives for Secure Messaging.

mod aes;
mod tdes;

use {
    crate::{
        ensure_err,
        error::{Error, Result},
    },
    std::fmt::{self, Display, Formatter},
};

/// Cipher suites for Secure Messaging.
///
/// See ICAO 9303-11 section 9.8 and BSI TR-03110-3 appendix F.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SymmetricCipher {
    Tdes,
    Aes128,
    Aes192,
    Aes256,
}

impl SymmetricCipher {
    /// Select the AES variant matching a key length.
    ///
    /// 3DES keys are also 16 bytes, so [`SymmetricCipher::Tdes`] is never inferred.
    pub fn from_key_len(len: usize) -> Result<Self> {
        match len {
            16 => Ok(Self::Aes128),
            24 => Ok(Self::Aes192),
            32 => Ok(Self::Aes256),
            _ => Err(Error::UnknownKeyLength(len)),
        }
    }

    pub fn key_size(self) -> usize {
        match self {
            Self::Tdes | Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            Self::Tdes => 8,
            Self::Aes128 | Self::Aes192 | Self::Aes256 => 16,
        }
    }

    pub fn check_key(self, key: &[u8]) -> Result<()> {
        ensure_err!(
            key.len() == self.key_size(),
            Error::UnsupportedKeyLength {
                cipher: self,
                len: key.len(),
            }
        );
        Ok(())
    }

    /// Encrypt a single block without chaining.
    pub fn encrypt_block(self, key: &[u8], block: &mut [u8]) -> Result<()> {
        self.check_key(key)?;
        ensure_err!(
            block.len() == self.block_size(),
            Error::CipherFailure { cipher: self }
        );
        let result = match self {
            Self::Tdes => tdes::encrypt_block(key, block),
            Self::Aes128 => aes::encrypt_block::<::aes::Aes128>(key, block),
            Self::Aes192 => aes::encrypt_block::<::aes::Aes192>(key, block),
            Self::Aes256 => aes::encrypt_block::<::aes::Aes256>(key, block),
        };
        result.ok_or(Error::CipherFailure { cipher: self })
    }

    /// CBC encrypt block-aligned `data` in place.
    pub fn cbc_encrypt(self, key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()> {
        self.check_block_mode(key, iv, data)?;
        let result = match self {
            Self::Tdes => tdes::cbc_encrypt(key, iv, data),
            Self::Aes128 => aes::cbc_encrypt::<::aes::Aes128>(key, iv, data),
            Self::Aes192 => aes::cbc_encrypt::<::aes::Aes192>(key, iv, data),
            Self::Aes256 => aes::cbc_encrypt::<::aes::Aes256>(key, iv, data),
        };
        result.ok_or(Error::CipherFailure { cipher: self })
    }

    /// CBC decrypt block-aligned `data` in place. Does not strip padding.
    pub fn cbc_decrypt(self, key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()> {
        self.check_block_mode(key, iv, data)?;
        let result = match self {
            Self::Tdes => tdes::cbc_decrypt(key, iv, data),
            Self::Aes128 => aes::cbc_decrypt::<::aes::Aes128>(key, iv, data),
            Self::Aes192 => aes::cbc_decrypt::<::aes::Aes192>(key, iv, data),
            Self::Aes256 => aes::cbc_decrypt::<::aes::Aes256>(key, iv, data),
        };
        result.ok_or(Error::CipherFailure { cipher: self })
    }

    /// MAC over already padded `data`, truncated to 8 bytes.
    ///
    /// AES suites use CMAC, 3DES uses ISO 9797-1 MAC algorithm 3 (Retail MAC).
    pub fn mac(self, key: &[u8], data: &[u8]) -> Result<[u8; 8]> {
        self.check_key(key)?;
        ensure_err!(
            data.len() % self.block_size() == 0,
            Error::CipherFailure { cipher: self }
        );
        let result = match self {
            Self::Tdes => tdes::retail_mac(key, data),
            Self::Aes128 => aes::cmac::<::cmac::Cmac<::aes::Aes128>>(key, data),
            Self::Aes192 => aes::cmac::<::cmac::Cmac<::aes::Aes192>>(key, data),
            Self::Aes256 => aes::cmac::<::cmac::Cmac<::aes::Aes256>>(key, data),
        };
        result.ok_or(Error::CipherFailure { cipher: self })
    }

    fn check_block_mode(self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<()> {
        self.check_key(key)?;
        ensure_err!(
            iv.len() == self.block_size() && data.len() % self.block_size() == 0,
            Error::CipherFailure { cipher: self }
        );
        Ok(())
    }
}

impl Display for SymmetricCipher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tdes => write!(f, "3DES-CBC-CBC"),
            Self::Aes128 => write!(f, "AES-CBC-CMAC-128"),
            Self::Aes192 => write!(f, "AES-CBC-CMAC-192"),
            Self::Aes256 => write!(f, "AES-CBC-CMAC-256"),
        }
    }
}

/// ISO/IEC 9797-1 padding method 2.
///
/// Always appends at least one byte, a block-aligned input gains a full block.
pub fn pad(bytes: &mut Vec<u8>, block_size: usize) {
    bytes.push(0x80);
    bytes.resize(bytes.len().next_multiple_of(block_size), 0x00);
}

/// Strip ISO/IEC 9797-1 padding method 2.
///
/// At most one block of trailing bytes is inspected.
pub fn unpad(bytes: &[u8], block_size: usize) -> Result<&[u8]> {
    for (index, &byte) in bytes.iter().enumerate().rev().take(block_size) {
        match byte {
            0x00 => continue,
            0x80 => return Ok(&bytes[..index]),
            _ => break,
        }
    }
    Err(Error::InvalidPadding)
}
