//! ISO/IEC 7816-4 Secure Messaging for ICAO 9303 BAC and PACE channels.
//!
//! Wraps plain command APDUs into protected ones and verifies protected
//! responses, given session keys agreed by a prior BAC or PACE handshake.

pub mod crypto;
pub mod error;
pub mod iso7816;
pub mod secure_messaging;

pub use self::{
    crypto::SymmetricCipher,
    error::{Error, ErrorKind, Result},
    iso7816::{parse_apdu, PlainCommand, StatusWord},
    secure_messaging::{
        construct_secure_messaging, Encrypted, PlainText, SecureChannelSession, SecureMessaging,
    },
};
