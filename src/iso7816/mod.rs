//! ISO/IEC 7816-4 command APDUs.

mod status_word;

pub use self::status_word::StatusWord;
use crate::error::{Error, Result};

/// A plain command APDU, borrowed from its encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlainCommand<'a> {
    pub header: &'a [u8; 4],
    pub data: Option<&'a [u8]>,
    pub le: Option<&'a [u8]>,
}

impl PlainCommand<'_> {
    pub fn cla(&self) -> u8 {
        self.header[0]
    }

    pub fn ins(&self) -> u8 {
        self.header[1]
    }

    pub fn p1(&self) -> u8 {
        self.header[2]
    }

    pub fn p2(&self) -> u8 {
        self.header[3]
    }
}

/// Parse a short length APDU into header, data, and Le.
///
/// See ISO 7816-4 section 5.2. Extended length encodings are rejected.
pub fn parse_apdu(apdu: &[u8]) -> Result<PlainCommand<'_>> {
    let Some((header, body)) = apdu.split_first_chunk::<4>() else {
        return Err(Error::MalformedApdu("APDU too short"));
    };
    Ok(match body {
        // Case 1: no data, no Le
        [] => PlainCommand {
            header,
            data: None,
            le: None,
        },
        // Case 2: no data, Le
        [_] => PlainCommand {
            header,
            data: None,
            le: Some(body),
        },
        [0x00, ..] => return Err(Error::MalformedApdu("extended length is not supported")),
        [lc, rest @ ..] => {
            let lc = *lc as usize;
            if rest.len() == lc {
                // Case 3: data, no Le
                PlainCommand {
                    header,
                    data: Some(rest),
                    le: None,
                }
            } else if rest.len() == lc + 1 {
                // Case 4: data and Le
                let (data, le) = rest.split_at(lc);
                PlainCommand {
                    header,
                    data: Some(data),
                    le: Some(le),
                }
            } else {
                return Err(Error::MalformedApdu("Lc does not match data length"));
            }
        }
    })
}
