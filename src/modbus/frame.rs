use bytes::{BufMut, BytesMut};
use nom::multi::count;
use nom::number::complete::{be_u16, be_u8};
use nom::sequence::tuple;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;

use crate::error::{Error, Result};

/// Both supported requests are fixed-size: MBAP header plus four payload bytes.
pub const FRAME_LEN: usize = 12;
/// MBAP header: transaction id, protocol id, length, unit id.
pub const MBAP_HEADER_LEN: usize = 7;
/// Most registers a single holding-register read may ask for.
pub const MAX_READ_COUNT: u16 = 125;

// One request in flight at a time, so the transaction id never needs to vary.
const TRANSACTION_ID: u16 = 0x0001;
const PROTOCOL_ID: u16 = 0x0000;
// Bytes following the length field: unit id, function code, four payload bytes.
const LENGTH_FIELD: u16 = 0x0006;
// Set on the function code when the device reports an exception.
const EXCEPTION_FLAG: u8 = 0x80;

// Header (7) plus function code plus an exception code or byte count.
const MIN_RESPONSE_LEN: usize = MBAP_HEADER_LEN + 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum FunctionCode {
    ReadHoldingRegisters = 0x03,
    WriteSingleRegister = 0x06,
}

// {{{ ExceptionCode
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
    Acknowledge = 0x05,
    ServerDeviceBusy = 0x06,
    GatewayPathUnavailable = 0x0a,
    GatewayTargetFailedToRespond = 0x0b,
    #[num_enum(catch_all)]
    Other(u8),
}

impl ExceptionCode {
    pub fn code(self) -> u8 {
        self.into()
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalFunction => write!(f, "illegal function (code 1)"),
            Self::IllegalDataAddress => write!(f, "illegal data address (code 2)"),
            Self::IllegalDataValue => write!(f, "illegal data value (code 3)"),
            Self::ServerDeviceFailure => write!(f, "server device failure (code 4)"),
            Self::Acknowledge => write!(f, "acknowledge (code 5)"),
            Self::ServerDeviceBusy => write!(f, "server device busy (code 6)"),
            Self::GatewayPathUnavailable => write!(f, "gateway path unavailable (code 10)"),
            Self::GatewayTargetFailedToRespond => {
                write!(f, "gateway target failed to respond (code 11)")
            }
            Self::Other(code) => write!(f, "exception code {}", code),
        }
    }
}
// }}}

/// Registers returned by a read, in request order.
///
/// Length comes from the response, not the request; a short block is not
/// an error here. Missing registers surface when a caller looks up an
/// offset the response did not carry.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegisterBlock(Vec<u16>);

impl RegisterBlock {
    pub fn new(values: Vec<u16>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at an offset within the block, if the response carried it.
    pub fn get(&self, offset: u16) -> Option<u16> {
        self.0.get(usize::from(offset)).copied()
    }

    pub fn values(&self) -> &[u16] {
        &self.0
    }
}

/// Address and value a write-single response echoes back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteEcho {
    pub address: u16,
    pub value: u16,
}

fn frame_header(unit_id: u8, function: FunctionCode) -> BytesMut {
    let mut buf = BytesMut::with_capacity(FRAME_LEN);
    buf.put_u16(TRANSACTION_ID);
    buf.put_u16(PROTOCOL_ID);
    buf.put_u16(LENGTH_FIELD);
    buf.put_u8(unit_id);
    buf.put_u8(function.into());
    buf
}

/// Builds a read-holding-registers request.
///
/// Fails fast on a count the protocol cannot carry, or a range that would
/// wrap the 16-bit register space, before anything touches the wire.
pub fn encode_read_holding(unit_id: u8, address: u16, count: u16) -> Result<Vec<u8>> {
    if count == 0 || count > MAX_READ_COUNT {
        return Err(Error::Validation(format!(
            "register count {} outside 1..={}",
            count, MAX_READ_COUNT
        )));
    }
    if address.checked_add(count - 1).is_none() {
        return Err(Error::Validation(format!(
            "reading {} registers at {} runs past the end of the register space",
            count, address
        )));
    }

    let mut buf = frame_header(unit_id, FunctionCode::ReadHoldingRegisters);
    buf.put_u16(address);
    buf.put_u16(count);
    Ok(buf.to_vec())
}

/// Builds a write-single-register request. Every u16 address and value is
/// representable, so this cannot fail.
pub fn encode_write_single(unit_id: u8, address: u16, value: u16) -> Vec<u8> {
    let mut buf = frame_header(unit_id, FunctionCode::WriteSingleRegister);
    buf.put_u16(address);
    buf.put_u16(value);
    buf.to_vec()
}

/// Skips the MBAP header, surfacing exception frames and function-code
/// mismatches. The header fields carry nothing we act on with a single
/// transaction in flight, so they are not checked individually.
fn response_body(raw: &[u8], expected: FunctionCode) -> Result<&[u8]> {
    if raw.len() < MIN_RESPONSE_LEN {
        return Err(Error::Protocol(format!(
            "response of {} bytes is too short to carry a function code",
            raw.len()
        )));
    }

    let function = raw[MBAP_HEADER_LEN];
    let body = &raw[MBAP_HEADER_LEN + 1..];

    if function == u8::from(expected) | EXCEPTION_FLAG {
        return Err(Error::Exception(ExceptionCode::from(body[0])));
    }
    if function != u8::from(expected) {
        return Err(Error::Protocol(format!(
            "unexpected function code {:#04x}, expected {:#04x}",
            function,
            u8::from(expected)
        )));
    }

    Ok(body)
}

fn read_payload(body: &[u8]) -> nom::IResult<&[u8], Vec<u16>> {
    let (data, byte_count) = be_u8(body)?;
    // A short transport read ends the block early instead of failing it.
    let registers = usize::from(byte_count / 2).min(data.len() / 2);
    count(be_u16, registers)(data)
}

fn write_payload(body: &[u8]) -> nom::IResult<&[u8], (u16, u16)> {
    tuple((be_u16, be_u16))(body)
}

/// Decodes a read-holding-registers response into a register block.
pub fn decode_read_response(raw: &[u8]) -> Result<RegisterBlock> {
    let body = response_body(raw, FunctionCode::ReadHoldingRegisters)?;
    let (_, values) = read_payload(body)
        .map_err(|_| Error::Protocol("malformed read response payload".to_string()))?;
    Ok(RegisterBlock::new(values))
}

/// Decodes a write-single-register response into the echoed pair.
pub fn decode_write_response(raw: &[u8]) -> Result<WriteEcho> {
    let body = response_body(raw, FunctionCode::WriteSingleRegister)?;
    let (_, (address, value)) = write_payload(body).map_err(|_| {
        Error::Protocol(format!(
            "write response ended after {} payload bytes, expected 4",
            body.len()
        ))
    })?;
    Ok(WriteEcho { address, value })
}
