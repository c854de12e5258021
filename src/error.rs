use crate::modbus::frame::ExceptionCode;

/// Failure modes of one session against the device.
///
/// `Exception` is the device answering "no" inside a well-formed frame;
/// `Protocol` is the device answering something we cannot make sense of.
/// Callers that only care whether the network broke match on `Connection`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket connect, read or write failed.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The device returned a Modbus exception response.
    #[error("modbus exception: {0}")]
    Exception(ExceptionCode),

    /// The response bytes do not form a valid reply to the request.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A request parameter is outside the protocol-legal range.
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
