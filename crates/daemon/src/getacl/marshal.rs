//! Reply records for GETACL.

use metadata::Identity;
use protocol::{CodecError, ReplyWriter};

use crate::error::UpcallError;

/// Writes `identity` as a `length: u32 | bytes` record and releases it.
///
/// The length prefix goes through the writer's own capacity check first; the
/// payload is copied only when the remaining capacity holds all of it.
/// Returns the number of bytes written.
pub fn marshal_identity(
    writer: &mut ReplyWriter<'_>,
    identity: Identity,
) -> Result<usize, UpcallError> {
    let len = u32::try_from(identity.len()).map_err(|_| {
        UpcallError::Overflow(CodecError::Overflow {
            needed: identity.len(),
            remaining: writer.remaining(),
        })
    })?;
    writer.write_u32(len)?;
    writer.ensure(identity.len())?;
    writer.write_bytes(identity.as_bytes())?;
    Ok(4 + identity.len())
}
