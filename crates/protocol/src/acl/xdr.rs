use thiserror::Error;

use super::{AccessMask, AceFlags, AceType, Nfs4Ace, Nfs4Acl};
use crate::cursor::UpcallReader;
use crate::error::CodecError;

/// Smallest encoding of a single ACE: four words with an empty `who`.
const MIN_ACE_LEN: usize = 16;

/// Failures decoding an XDR encoded ACL.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AclError {
    /// The attribute ended in the middle of an entry.
    #[error("truncated NFSv4 ACL: {0}")]
    Truncated(#[from] CodecError),
    /// An entry carried a type outside allow/deny/audit/alarm.
    #[error("invalid NFSv4 ACE type: {0}")]
    InvalidAceType(u32),
    /// The entry count cannot fit in the remaining bytes.
    #[error("NFSv4 ACL claims {count} entries but only {remaining} bytes follow")]
    ImplausibleCount {
        /// Count read from the attribute.
        count: u32,
        /// Bytes left after the count.
        remaining: usize,
    },
    /// A `who` string was not valid UTF-8.
    #[error("NFSv4 ACE principal is not valid UTF-8")]
    InvalidWho,
}

fn read_be_u32(reader: &mut UpcallReader<'_>) -> Result<u32, CodecError> {
    reader.read_array().map(u32::from_be_bytes)
}

const fn xdr_padding(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

impl Nfs4Acl {
    /// Decodes the XDR form of the `acl` attribute.
    pub fn from_xdr(data: &[u8]) -> Result<Self, AclError> {
        let mut reader = UpcallReader::new(data);
        let count = read_be_u32(&mut reader)?;
        let remaining = reader.remaining();
        if (count as usize).saturating_mul(MIN_ACE_LEN) > remaining {
            return Err(AclError::ImplausibleCount { count, remaining });
        }

        let mut aces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let word = read_be_u32(&mut reader)?;
            let ace_type = AceType::from_wire(word).ok_or(AclError::InvalidAceType(word))?;
            let flags = AceFlags::from_raw(read_be_u32(&mut reader)?);
            let mask = AccessMask::from_raw(read_be_u32(&mut reader)?);
            let who_len = read_be_u32(&mut reader)? as usize;
            let who = reader.read_bytes(who_len)?;
            let who = std::str::from_utf8(who)
                .map_err(|_| AclError::InvalidWho)?
                .to_owned();
            reader.read_bytes(xdr_padding(who_len))?;

            aces.push(Nfs4Ace {
                ace_type,
                flags,
                mask,
                who,
            });
        }

        Ok(Self { aces })
    }

    /// Encodes the ACL in the XDR form of the `acl` attribute.
    #[must_use]
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + self.aces.len() * MIN_ACE_LEN);
        data.extend_from_slice(&(self.aces.len() as u32).to_be_bytes());

        for ace in &self.aces {
            data.extend_from_slice(&ace.ace_type.to_wire().to_be_bytes());
            data.extend_from_slice(&ace.flags.as_raw().to_be_bytes());
            data.extend_from_slice(&ace.mask.as_raw().to_be_bytes());

            let who = ace.who.as_bytes();
            data.extend_from_slice(&(who.len() as u32).to_be_bytes());
            data.extend_from_slice(who);
            data.extend(std::iter::repeat_n(0u8, xdr_padding(who.len())));
        }

        data
    }
}
