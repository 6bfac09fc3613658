use crate::cursor::{ReplyWriter, UpcallReader};
use crate::error::CodecError;

/// Encoded size of a [`RequestHeader`].
pub const REQUEST_HEADER_LEN: usize = 12;

/// Encoded size of a [`ReplyHeader`].
pub const REPLY_HEADER_LEN: usize = 20;

/// Leading fields of every upcall request.
///
/// The opcode is kept raw so that the dispatcher can answer unknown values
/// with a status instead of dropping the upcall.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RequestHeader {
    /// Transaction id chosen by the driver.
    pub xid: u64,
    /// Raw operation code.
    pub opcode: u32,
}

impl RequestHeader {
    /// Reads the header from the start of a request.
    pub fn decode(reader: &mut UpcallReader<'_>) -> Result<Self, CodecError> {
        let xid = reader.read_u64()?;
        let opcode = reader.read_u32()?;
        Ok(Self { xid, opcode })
    }

    /// Writes the header, used by drivers and test harnesses that build requests.
    pub fn encode(self, writer: &mut ReplyWriter<'_>) -> Result<(), CodecError> {
        writer.write_u64(self.xid)?;
        writer.write_u32(self.opcode)
    }
}

/// Leading fields of every upcall reply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReplyHeader {
    /// Transaction id copied from the request.
    pub xid: u64,
    /// Raw operation code copied from the request.
    pub opcode: u32,
    /// Completion status; zero on success.
    pub status: u32,
    /// Number of payload bytes following the header.
    pub payload_len: u32,
}

impl ReplyHeader {
    /// Writes the header into a reply buffer.
    pub fn encode(self, writer: &mut ReplyWriter<'_>) -> Result<(), CodecError> {
        writer.write_u64(self.xid)?;
        writer.write_u32(self.opcode)?;
        writer.write_u32(self.status)?;
        writer.write_u32(self.payload_len)
    }

    /// Reads a header back from a reply buffer.
    pub fn decode(reader: &mut UpcallReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            xid: reader.read_u64()?,
            opcode: reader.read_u32()?,
            status: reader.read_u32()?,
            payload_len: reader.read_u32()?,
        })
    }
}
