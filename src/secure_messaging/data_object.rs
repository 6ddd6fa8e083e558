//! Secure messaging data objects.
//!
//! See ISO 7816-4 section 10.2 and ICAO 9303-11 section 9.8.

use crate::{
    ensure_err,
    error::{Error, Result},
};

pub const TAG_PADDED_CRYPTOGRAM: u8 = 0x87;
pub const TAG_CRYPTOGRAM: u8 = 0x85;
pub const TAG_EXPECTED_LENGTH: u8 = 0x97;
pub const TAG_STATUS: u8 = 0x99;
pub const TAG_MAC: u8 = 0x8E;

/// Padding-content indicator for ISO/IEC 9797-1 method 2 padding.
pub const PADDING_INDICATOR_ISO: u8 = 0x01;

pub const MAC_LEN: usize = 8;

/// A data object to be written into a protected command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataObject<'a> {
    /// DO'87: padding-content indicator followed by the cryptogram.
    PaddedCryptogram { indicator: u8, cryptogram: &'a [u8] },
    /// DO'97: the plain command's Le.
    ExpectedLength(&'a [u8]),
    /// DO'8E: cryptographic checksum.
    Mac(&'a [u8; MAC_LEN]),
}

impl DataObject<'_> {
    pub fn tag(&self) -> u8 {
        match self {
            Self::PaddedCryptogram { .. } => TAG_PADDED_CRYPTOGRAM,
            Self::ExpectedLength(_) => TAG_EXPECTED_LENGTH,
            Self::Mac(_) => TAG_MAC,
        }
    }

    pub fn value_len(&self) -> usize {
        match self {
            Self::PaddedCryptogram { cryptogram, .. } => 1 + cryptogram.len(),
            Self::ExpectedLength(le) => le.len(),
            Self::Mac(mac) => mac.len(),
        }
    }

    /// Append the BER-TLV encoding.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.tag());
        encode_length(self.value_len(), out)?;
        match self {
            Self::PaddedCryptogram {
                indicator,
                cryptogram,
            } => {
                out.push(*indicator);
                out.extend_from_slice(cryptogram);
            }
            Self::ExpectedLength(le) => out.extend_from_slice(le),
            Self::Mac(mac) => out.extend_from_slice(&mac[..]),
        }
        Ok(())
    }
}

/// BER length, short form below 128 and `81 XX` up to 255.
pub fn encode_length(len: usize, out: &mut Vec<u8>) -> Result<()> {
    match len {
        0..=0x7F => out.push(len as u8),
        0x80..=0xFF => out.extend_from_slice(&[0x81, len as u8]),
        _ => return Err(Error::BodyTooLarge(len)),
    }
    Ok(())
}

/// A data object read from a protected response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tlv<'a> {
    pub tag: u8,
    pub value: &'a [u8],
    /// Complete encoding including tag and length.
    pub encoded: &'a [u8],
}

/// Split a response body into its data objects.
///
/// Secure messaging tags are all single byte. Lengths may use the short form
/// or the `81` and `82` long forms.
pub fn parse_tlvs(mut bytes: &[u8]) -> Result<Vec<Tlv<'_>>> {
    let mut objects = Vec::new();
    while let [tag, rest @ ..] = bytes {
        ensure_err!(
            tag & 0x1F != 0x1F,
            Error::MalformedResponse("multi-byte tag")
        );
        let (header_len, len) = match rest {
            [len @ 0x00..=0x7F, ..] => (2, *len as usize),
            [0x81, len, ..] => (3, *len as usize),
            [0x82, hi, lo, ..] => (4, u16::from_be_bytes([*hi, *lo]) as usize),
            _ => return Err(Error::MalformedResponse("invalid length")),
        };
        ensure_err!(
            bytes.len() >= header_len + len,
            Error::MalformedResponse("truncated data object")
        );
        let (encoded, remaining) = bytes.split_at(header_len + len);
        objects.push(Tlv {
            tag: *tag,
            value: &encoded[header_len..],
            encoded,
        });
        bytes = remaining;
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex};

    #[test]
    fn test_encode() {
        let mut out = Vec::new();
        let cryptogram = hex!("6375432908C044F6");
        DataObject::PaddedCryptogram {
            indicator: PADDING_INDICATOR_ISO,
            cryptogram: &cryptogram,
        }
        .encode_into(&mut out)
        .unwrap();
        DataObject::ExpectedLength(&[0x04])
            .encode_into(&mut out)
            .unwrap();
        DataObject::Mac(&hex!("BF8B92D635FF24F8"))
            .encode_into(&mut out)
            .unwrap();
        assert_eq!(
            out,
            hex!("8709016375432908C044F6 970104 8E08BF8B92D635FF24F8")
        );
    }

    #[test]
    fn test_encode_empty_le() {
        let mut out = Vec::new();
        DataObject::ExpectedLength(&[])
            .encode_into(&mut out)
            .unwrap();
        assert_eq!(out, hex!("9700"));
    }

    #[test]
    fn test_encode_long_length() {
        let cryptogram = [0xAA; 144];
        let mut out = Vec::new();
        DataObject::PaddedCryptogram {
            indicator: PADDING_INDICATOR_ISO,
            cryptogram: &cryptogram,
        }
        .encode_into(&mut out)
        .unwrap();
        assert_eq!(out[..4], hex!("87 81 91 01"));
        assert_eq!(out.len(), 4 + 144);

        assert!(matches!(
            encode_length(256, &mut out),
            Err(Error::BodyTooLarge(256))
        ));
    }

    #[test]
    fn test_parse() {
        let rapdu = hex!("8709019FF0EC34F9922651 990290 00 8E08AD55CC17140B2DED");
        let tlvs = parse_tlvs(&rapdu).unwrap();
        assert_eq!(tlvs.len(), 3);
        assert_eq!(tlvs[0].tag, TAG_PADDED_CRYPTOGRAM);
        assert_eq!(tlvs[0].value, hex!("019FF0EC34F9922651"));
        assert_eq!(tlvs[1].tag, TAG_STATUS);
        assert_eq!(tlvs[1].encoded, hex!("99029000"));
        assert_eq!(tlvs[2].tag, TAG_MAC);
        assert_eq!(tlvs[2].value, hex!("AD55CC17140B2DED"));

        let mut long = vec![0x87, 0x82, 0x00, 0x81];
        long.extend_from_slice(&[0x01; 0x81]);
        let tlvs = parse_tlvs(&long).unwrap();
        assert_eq!(tlvs[0].value.len(), 0x81);

        assert!(parse_tlvs(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_tlvs(&hex!("99 03 90 00")),
            Err(Error::MalformedResponse("truncated data object"))
        ));
        assert!(matches!(
            parse_tlvs(&hex!("99")),
            Err(Error::MalformedResponse("invalid length"))
        ));
        assert!(matches!(
            parse_tlvs(&hex!("9F 01 00")),
            Err(Error::MalformedResponse("multi-byte tag"))
        ));
    }
}
