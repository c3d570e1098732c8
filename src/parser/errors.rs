use std::fmt;
use thiserror::Error;

pub type OpResult<T> = Result<T, OpError>;

///
/// What went wrong, independent of where.
///
/// Callers match on the kind (e.g. to skip a `NotFound` transaction),
/// the message only carries context for operators.
///
#[derive(Error, Debug)]
pub enum OpErrorKind {
    #[error("configuration error")]
    Configuration,
    #[error("not found")]
    NotFound,
    #[error("decode error at offset {offset} ({field})")]
    Decode { offset: u64, field: &'static str },
    #[error("encode error")]
    Encode,
    #[error("transport error")]
    Transport,
    #[error("rpc error {code}")]
    Rpc { code: i64 },
    #[error("invalid address")]
    InvalidAddress,
    #[error("unsupported by this chain")]
    Unsupported,
    #[error("runtime error")]
    RuntimeError,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    HexError(#[from] bitcoin_hashes::hex::Error),
}

#[derive(Debug)]
pub struct OpError {
    kind: OpErrorKind,
    message: String,
}

impl OpError {
    pub fn new(kind: OpErrorKind) -> Self {
        OpError {
            kind,
            message: String::new(),
        }
    }

    pub fn decode(offset: u64, field: &'static str) -> Self {
        OpError::new(OpErrorKind::Decode { offset, field })
    }

    ///
    /// Append context, keeping the kind.
    ///
    pub fn join_msg(mut self, msg: &str) -> Self {
        if self.message.is_empty() {
            self.message.push_str(msg);
        } else {
            self.message.push_str(", ");
            self.message.push_str(msg);
        }
        self
    }

    #[inline]
    pub fn kind(&self) -> &OpErrorKind {
        &self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, OpErrorKind::NotFound)
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<OpErrorKind> for OpError {
    fn from(kind: OpErrorKind) -> Self {
        OpError::new(kind)
    }
}

impl From<&str> for OpError {
    fn from(msg: &str) -> Self {
        OpError::new(OpErrorKind::RuntimeError).join_msg(msg)
    }
}

impl From<std::io::Error> for OpError {
    fn from(err: std::io::Error) -> Self {
        OpError::new(OpErrorKind::IoError(err))
    }
}

impl From<serde_json::Error> for OpError {
    fn from(err: serde_json::Error) -> Self {
        OpError::new(OpErrorKind::JsonError(err))
    }
}

impl From<bitcoin_hashes::hex::Error> for OpError {
    fn from(err: bitcoin_hashes::hex::Error) -> Self {
        OpError::new(OpErrorKind::HexError(err))
    }
}
