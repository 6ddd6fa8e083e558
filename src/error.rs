use {crate::crypto::SymmetricCipher, crate::iso7816::StatusWord, thiserror::Error};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return early with `$err` unless `$cond` holds.
#[macro_export]
macro_rules! ensure_err {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Broad classification of [`Error`]s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Unsupported key material or a failing cipher primitive.
    Crypto,
    /// The request or the response does not have a valid encoding.
    Encoding,
    /// A response failed authentication. The channel can not be trusted anymore.
    Authentication,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{cipher} does not support {len} byte keys")]
    UnsupportedKeyLength { cipher: SymmetricCipher, len: usize },

    #[error("no cipher suite uses {0} byte keys")]
    UnknownKeyLength(usize),

    #[error("kenc is {kenc} bytes but kmac is {kmac} bytes")]
    KeyLengthMismatch { kenc: usize, kmac: usize },

    #[error("{cipher} block operation failed")]
    CipherFailure { cipher: SymmetricCipher },

    #[error("command header must be 4 bytes, got {0}")]
    InvalidHeader(usize),

    #[error("expected length must be at most one byte, got {0}")]
    InvalidLe(usize),

    #[error("protected command body of {0} bytes does not fit a short Lc")]
    BodyTooLarge(usize),

    #[error("malformed command APDU: {0}")]
    MalformedApdu(&'static str),

    #[error("malformed secure messaging response: {0}")]
    MalformedResponse(&'static str),

    #[error("protected status {protected} does not match transport status {transport}")]
    StatusMismatch {
        protected: StatusWord,
        transport: StatusWord,
    },

    #[error("response MAC verification failed")]
    MacMismatch,

    #[error("decrypted response has invalid padding")]
    InvalidPadding,

    #[error("card aborted secure messaging with status {0}")]
    SecureMessagingAborted(StatusWord),

    #[error("secure channel was closed after an authentication failure")]
    ChannelClosed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedKeyLength { .. }
            | Self::UnknownKeyLength(_)
            | Self::KeyLengthMismatch { .. }
            | Self::CipherFailure { .. } => ErrorKind::Crypto,
            Self::InvalidHeader(_)
            | Self::InvalidLe(_)
            | Self::BodyTooLarge(_)
            | Self::MalformedApdu(_)
            | Self::MalformedResponse(_)
            | Self::StatusMismatch { .. } => ErrorKind::Encoding,
            Self::MacMismatch
            | Self::InvalidPadding
            | Self::SecureMessagingAborted(_)
            | Self::ChannelClosed => ErrorKind::Authentication,
        }
    }

    /// Whether the secure channel must be re-established after this error.
    pub fn is_session_fatal(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }
}
