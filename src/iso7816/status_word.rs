//! ISO/IEC 7816-4 section 5.6

use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct StatusWord(u16);

impl StatusWord {
    pub const SUCCESS: Self = Self(0x9000);
    pub const SM_DATA_OBJECTS_MISSING: Self = Self(0x6987);
    pub const SM_DATA_OBJECTS_INCORRECT: Self = Self(0x6988);

    pub fn from_bytes(sw1: u8, sw2: u8) -> Self {
        Self(u16::from_be_bytes([sw1, sw2]))
    }

    pub fn sw1(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn sw2(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn is_success(self) -> bool {
        matches!(self.0, 0x9000 | 0x6100..=0x61FF)
    }

    pub fn is_warning(self) -> bool {
        matches!(self.0, 0x6200..=0x63FF)
    }

    /// The card rejected the secure messaging wrapper itself.
    ///
    /// Cards answer these in plain, without DO'99 and DO'8E.
    pub fn is_secure_messaging_error(self) -> bool {
        matches!(self.0, 0x6882 | 0x6987 | 0x6988)
    }

    #[allow(clippy::match_overlapping_arm)] // Used for catch-alls
    pub fn as_str(self) -> &'static str {
        match self.0 {
            0x9000 => "Success",
            0x6100..=0x61FF => "Success, data remaining",
            0x6282 => "End of file/record reached before reading Le bytes",
            0x6200..=0x63FF => "Warning",
            0x6700 => "Wrong length",
            0x6882 => "Secure messaging not supported",
            0x6982 => "Security status not satisfied",
            0x6987 => "Expected secure messaging data objects missing",
            0x6988 => "Incorrect secure messaging data objects",
            0x6A82 => "File or application not found",
            0x6400..=0x6FFF => "Error",
            0x9000..=0x9FFF => "Unknown proprietary status word",
            _ => "Invalid status word",
        }
    }
}

impl Display for StatusWord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{:04X}] {}", self.0, self.as_str())
    }
}

impl From<u16> for StatusWord {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<StatusWord> for u16 {
    fn from(value: StatusWord) -> u16 {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes() {
        let sw = StatusWord::from_bytes(0x62, 0x82);
        assert_eq!(u16::from(sw), 0x6282);
        assert_eq!((sw.sw1(), sw.sw2()), (0x62, 0x82));
        assert_eq!(sw.to_bytes(), [0x62, 0x82]);
        assert!(sw.is_warning());
        assert!(!sw.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusWord::SUCCESS.to_string(), "[9000] Success");
        for sw in [
            StatusWord::SM_DATA_OBJECTS_MISSING,
            StatusWord::SM_DATA_OBJECTS_INCORRECT,
        ] {
            assert!(sw.is_secure_messaging_error());
        }
        assert!(!StatusWord::SUCCESS.is_secure_messaging_error());
        assert_eq!(
            StatusWord::from(0x6988).to_string(),
            "[6988] Incorrect secure messaging data objects"
        );
        assert_eq!(
            StatusWord::SM_DATA_OBJECTS_MISSING.to_string(),
            "[6987] Expected secure messaging data objects missing"
        );
    }
}
