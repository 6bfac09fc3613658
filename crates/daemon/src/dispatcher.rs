//! crates/daemon/src/dispatcher.rs
//!
//! Drives one upcall from request bytes to reply bytes.
//!
//! A request is `xid: u64 | opcode: u32 | arguments`. The reply always starts
//! with `xid | opcode | status | payload_len`; the payload follows only when
//! the status is zero. An upcall moves through
//! `Received -> Parsed -> Handled -> Marshalled -> Replied`, and any failure
//! skips straight to `Replied` with the failure's status.

use logging::trace_upcall;
use protocol::envelope::REPLY_HEADER_LEN;
use protocol::{CodecError, Opcode, ReplyHeader, ReplyWriter, RequestHeader, UpcallReader, status};

use crate::error::UpcallError;
use crate::op::{OpRegistry, Stage};

/// Routes upcalls to the operations registered for their opcode.
#[derive(Debug, Default)]
pub struct UpcallDispatcher {
    registry: OpRegistry,
}

impl UpcallDispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub const fn new(registry: OpRegistry) -> Self {
        Self { registry }
    }

    /// The operations this dispatcher serves.
    #[must_use]
    pub const fn registry(&self) -> &OpRegistry {
        &self.registry
    }

    /// Processes one upcall, writing the reply into `reply`.
    ///
    /// Returns the number of reply bytes. Operation failures are reported
    /// through the reply status; an error is returned only when the request
    /// envelope itself is unreadable or `reply` cannot hold a reply header.
    pub fn process(&self, request: &[u8], reply: &mut [u8]) -> Result<usize, UpcallError> {
        let mut reader = UpcallReader::new(request);
        let header = RequestHeader::decode(&mut reader)?;
        trace_upcall!(xid = header.xid, opcode = header.opcode, len = request.len(), "received");

        if reply.len() < REPLY_HEADER_LEN {
            return Err(UpcallError::Overflow(CodecError::Overflow {
                needed: REPLY_HEADER_LEN,
                remaining: reply.len(),
            }));
        }
        let (head, body) = reply.split_at_mut(REPLY_HEADER_LEN);
        let max_payload = usize::try_from(u32::MAX).unwrap_or(usize::MAX);
        let body_len = body.len().min(max_payload);
        let mut writer = ReplyWriter::new(&mut body[..body_len]);

        let outcome = Opcode::try_from(header.opcode)
            .map_err(|err| (Stage::Parse, UpcallError::from(err)))
            .and_then(|opcode| self.registry.run(opcode, &mut reader, &mut writer));

        let (status, payload_len) = match outcome {
            Ok(()) => match u32::try_from(writer.written()) {
                Ok(len) => (status::SUCCESS, len),
                Err(_) => (status::BUFFER_OVERFLOW, 0),
            },
            Err((stage, err)) => {
                let code = err.status();
                tracing::warn!(
                    target: "upcalld::upcall",
                    xid = header.xid,
                    opcode = header.opcode,
                    %stage,
                    status = code,
                    status_name = status::name(code),
                    error = %err,
                    "upcall failed"
                );
                (code, 0)
            }
        };

        ReplyHeader {
            xid: header.xid,
            opcode: header.opcode,
            status,
            payload_len,
        }
        .encode(&mut ReplyWriter::new(head))?;
        trace_upcall!(xid = header.xid, status, payload_len, "replied");

        Ok(REPLY_HEADER_LEN + payload_len as usize)
    }
}
