//! Secure Messaging
//!
//! See ISO 7816-4 section 10 and ICAO 9303-11 section 9.8.

pub mod data_object;

use {
    self::data_object::{
        parse_tlvs, DataObject, MAC_LEN, PADDING_INDICATOR_ISO, TAG_CRYPTOGRAM, TAG_MAC,
        TAG_PADDED_CRYPTOGRAM, TAG_STATUS,
    },
    crate::{
        crypto::{pad, unpad, SymmetricCipher},
        ensure_err,
        error::{Error, Result},
        iso7816::{parse_apdu, StatusWord},
    },
    subtle::ConstantTimeEq,
    tracing::{debug, trace, warn},
    zeroize::Zeroizing,
};

/// Largest body that fits a short length Lc.
const MAX_BODY_LEN: usize = 0xFF;

pub trait SecureMessaging {
    fn enc_apdu(&mut self, apdu: &[u8]) -> Result<Vec<u8>>;
    fn dec_response(&mut self, status: StatusWord, resp: &[u8]) -> Result<Vec<u8>>;
}

/// Secure Messaging protocol that passes APDUs and responses as-is.
#[derive(Debug, Default)]
pub struct PlainText;

impl SecureMessaging for PlainText {
    fn enc_apdu(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        Ok(apdu.to_vec())
    }

    fn dec_response(&mut self, _status: StatusWord, resp: &[u8]) -> Result<Vec<u8>> {
        Ok(resp.to_vec())
    }
}

/// Session keys and send sequence counter of an established secure channel.
///
/// The transforms on this type only read the SSC. Advancing it between a
/// command and its response is up to the owner, see [`Encrypted`].
pub struct SecureChannelSession {
    cipher: SymmetricCipher,
    kenc: Zeroizing<Vec<u8>>,
    kmac: Zeroizing<Vec<u8>>,
    ssc: u64,
}

impl SecureChannelSession {
    /// Create an AES session, the variant is selected by key length.
    pub fn new(kenc: &[u8], kmac: &[u8], ssc: u64) -> Result<Self> {
        let cipher = SymmetricCipher::from_key_len(kenc.len())?;
        Self::with_cipher(cipher, kenc, kmac, ssc)
    }

    pub fn with_cipher(
        cipher: SymmetricCipher,
        kenc: &[u8],
        kmac: &[u8],
        ssc: u64,
    ) -> Result<Self> {
        ensure_err!(
            kenc.len() == kmac.len(),
            Error::KeyLengthMismatch {
                kenc: kenc.len(),
                kmac: kmac.len(),
            }
        );
        cipher.check_key(kenc)?;
        debug!(%cipher, ssc, "secure channel session established");
        Ok(Self {
            cipher,
            kenc: Zeroizing::new(kenc.to_vec()),
            kmac: Zeroizing::new(kmac.to_vec()),
            ssc,
        })
    }

    pub fn cipher(&self) -> SymmetricCipher {
        self.cipher
    }

    pub fn ssc(&self) -> u64 {
        self.ssc
    }

    pub fn set_ssc(&mut self, ssc: u64) {
        self.ssc = ssc;
    }

    /// Advance the send sequence counter and return the new value.
    pub fn increment_ssc(&mut self) -> u64 {
        self.ssc = self.ssc.wrapping_add(1);
        self.ssc
    }

    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    /// SSC as big endian, left padded with zeros to a full cipher block.
    fn ssc_block(&self) -> Vec<u8> {
        let mut block = vec![0; self.block_size() - 8];
        block.extend_from_slice(&self.ssc.to_be_bytes());
        block
    }

    /// CBC initialization vector for the current SSC.
    ///
    /// AES uses the SSC block encrypted under `kenc` (BSI TR-03110-3 section F.2.1),
    /// 3DES uses an all-zero IV.
    pub fn derive_iv(&self) -> Result<Vec<u8>> {
        match self.cipher {
            SymmetricCipher::Tdes => Ok(vec![0; self.block_size()]),
            _ => {
                let mut iv = self.ssc_block();
                self.cipher.encrypt_block(&self.kenc, &mut iv)?;
                Ok(iv)
            }
        }
    }

    /// Pad and encrypt command data.
    pub fn enc_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut payload = data.to_vec();
        pad(&mut payload, self.block_size());
        let iv = self.derive_iv()?;
        self.cipher.cbc_encrypt(&self.kenc, &iv, &mut payload)?;
        Ok(payload)
    }

    /// Decrypt response data and remove its padding.
    pub fn dec_data(&self, cryptogram: &[u8]) -> Result<Vec<u8>> {
        ensure_err!(
            !cryptogram.is_empty() && cryptogram.len() % self.block_size() == 0,
            Error::MalformedResponse("cryptogram is not block aligned")
        );
        let mut payload = Zeroizing::new(cryptogram.to_vec());
        let iv = self.derive_iv()?;
        self.cipher.cbc_decrypt(&self.kenc, &iv, &mut payload)?;
        Ok(unpad(&payload, self.block_size())?.to_vec())
    }

    /// Pad `message` and compute its 8 byte MAC.
    pub fn compute_mac(&self, message: &[u8]) -> Result<[u8; MAC_LEN]> {
        let mut padded = message.to_vec();
        pad(&mut padded, self.block_size());
        self.cipher.mac(&self.kmac, &padded)
    }

    /// Constant time comparison of `tag` with the MAC of `message`.
    pub fn verify_mac(&self, message: &[u8], tag: &[u8]) -> Result<bool> {
        let expected = self.compute_mac(message)?;
        Ok(expected[..].ct_eq(tag).into())
    }

    /// Protect a command using padding-content indicator `01`.
    pub fn prepare(
        &self,
        header: &[u8],
        data: Option<&[u8]>,
        le: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        self.prepare_with_indicator(header, data, le, PADDING_INDICATOR_ISO)
    }

    /// Protect a command.
    ///
    /// Produces `CLA' INS P1 P2 Lc [DO'87] [DO'97] DO'8E 00` where CLA' has the
    /// secure messaging bits set to indicate an authenticated header.
    pub fn prepare_with_indicator(
        &self,
        header: &[u8],
        data: Option<&[u8]>,
        le: Option<&[u8]>,
        indicator: u8,
    ) -> Result<Vec<u8>> {
        ensure_err!(header.len() == 4, Error::InvalidHeader(header.len()));
        if let Some(le) = le {
            ensure_err!(le.len() <= 1, Error::InvalidLe(le.len()));
        }

        // Write header
        let mut papdu = header.to_vec();
        papdu[0] = (papdu[0] & 0xF3) | 0x0C;

        // Data objects covered by the MAC
        let mut body = Vec::new();
        if let Some(data) = data {
            let cryptogram = self.enc_data(data)?;
            DataObject::PaddedCryptogram {
                indicator,
                cryptogram: &cryptogram,
            }
            .encode_into(&mut body)?;
        }
        if let Some(le) = le {
            DataObject::ExpectedLength(le).encode_into(&mut body)?;
        }

        // MAC over SSC, padded header and data objects
        let mut message = self.ssc_block();
        message.extend_from_slice(&papdu);
        pad(&mut message, self.block_size());
        message.extend_from_slice(&body);
        let mac = self.compute_mac(&message)?;
        DataObject::Mac(&mac).encode_into(&mut body)?;

        ensure_err!(body.len() <= MAX_BODY_LEN, Error::BodyTooLarge(body.len()));
        papdu.push(body.len() as u8);
        papdu.extend_from_slice(&body);

        // Le is always 00 for the protected response
        papdu.push(0x00);

        trace!(ssc = self.ssc, papdu = %hex::encode_upper(&papdu), "protected command");
        Ok(papdu)
    }

    /// Parse a raw short APDU and protect it.
    pub fn prepare_apdu(&self, apdu: &[u8]) -> Result<Vec<u8>> {
        let command = parse_apdu(apdu)?;
        self.prepare(command.header, command.data, command.le)
    }

    /// Verify a protected response and return its decrypted data.
    ///
    /// `status` is the status word the card sent in plain, it must match the
    /// protected DO'99. An [`Error::MacMismatch`] means the channel is broken.
    pub fn unwrap_response(&self, status: StatusWord, resp: &[u8]) -> Result<Vec<u8>> {
        let objects = parse_tlvs(resp)?;
        let Some((mac, objects)) = objects.split_last() else {
            return Err(Error::MalformedResponse("missing DO'8E"));
        };
        ensure_err!(
            mac.tag == TAG_MAC,
            Error::MalformedResponse("missing DO'8E")
        );
        ensure_err!(
            mac.value.len() == MAC_LEN,
            Error::MalformedResponse("DO'8E must be 8 bytes")
        );

        // Compute and verify MAC over everything preceding DO'8E
        let mut message = self.ssc_block();
        message.extend_from_slice(&resp[..resp.len() - mac.encoded.len()]);
        if !self.verify_mac(&message, mac.value)? {
            warn!(ssc = self.ssc, "response MAC verification failed");
            return Err(Error::MacMismatch);
        }

        let mut cryptogram = None;
        let mut protected_status = None;
        for object in objects {
            match object.tag {
                TAG_PADDED_CRYPTOGRAM if cryptogram.is_none() => {
                    let Some((&indicator, value)) = object.value.split_first() else {
                        return Err(Error::MalformedResponse("empty DO'87"));
                    };
                    ensure_err!(
                        indicator == PADDING_INDICATOR_ISO,
                        Error::MalformedResponse("unsupported padding-content indicator")
                    );
                    cryptogram = Some(value);
                }
                TAG_CRYPTOGRAM if cryptogram.is_none() => cryptogram = Some(object.value),
                TAG_STATUS if protected_status.is_none() => {
                    let &[sw1, sw2] = object.value else {
                        return Err(Error::MalformedResponse("DO'99 must be 2 bytes"));
                    };
                    protected_status = Some(StatusWord::from_bytes(sw1, sw2));
                }
                _ => return Err(Error::MalformedResponse("unexpected data object")),
            }
        }

        // Check (redundant) status word
        let Some(protected) = protected_status else {
            return Err(Error::MalformedResponse("missing DO'99"));
        };
        ensure_err!(
            protected == status,
            Error::StatusMismatch {
                protected,
                transport: status,
            }
        );

        let data = match cryptogram {
            Some(cryptogram) => self.dec_data(cryptogram)?,
            None => Vec::new(),
        };
        trace!(ssc = self.ssc, %status, data = %hex::encode_upper(&data), "unwrapped response");
        Ok(data)
    }
}

/// Secure messaging over an established session.
///
/// The SSC is incremented before each command and again before each response,
/// see ICAO 9303-11 section 9.8.6.3. After an authentication failure the
/// channel refuses all further traffic.
pub struct Encrypted {
    session: SecureChannelSession,
    closed: bool,
}

impl Encrypted {
    pub fn new(session: SecureChannelSession) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn session(&self) -> &SecureChannelSession {
        &self.session
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            warn!("secure channel used after authentication failure");
            return Err(Error::ChannelClosed);
        }
        Ok(())
    }
}

impl SecureMessaging for Encrypted {
    fn enc_apdu(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open()?;
        trace!(apdu = %hex::encode_upper(apdu), "protecting command");
        let previous = self.session.ssc();
        self.session.increment_ssc();
        self.session.prepare_apdu(apdu).inspect_err(|_| {
            // Commit SSC only for commands actually sent
            self.session.set_ssc(previous);
        })
    }

    fn dec_response(&mut self, status: StatusWord, resp: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if status.is_secure_messaging_error() {
            // The card has discarded the session keys
            warn!(%status, "card aborted secure messaging");
            self.closed = true;
            return Err(Error::SecureMessagingAborted(status));
        }
        self.session.increment_ssc();
        let result = self.session.unwrap_response(status, resp);
        if matches!(&result, Err(err) if err.is_session_fatal()) {
            self.closed = true;
        }
        result
    }
}

/// Switch a card connection to secure messaging with freshly agreed keys.
pub fn construct_secure_messaging(
    cipher: SymmetricCipher,
    kenc: &[u8],
    kmac: &[u8],
    ssc: u64,
) -> Result<Box<dyn SecureMessaging>> {
    let session = SecureChannelSession::with_cipher(cipher, kenc, kmac, ssc)?;
    Ok(Box::new(Encrypted::new(session)))
}
