use super::*;
use crate::{ReplyWriter, UpcallReader};

#[test]
fn opcode_round_trips_through_raw_values() {
    for opcode in Opcode::ALL {
        assert_eq!(Opcode::try_from(opcode.as_u32()), Ok(opcode));
    }
    assert_eq!(Opcode::try_from(0), Err(UnknownOpcode(0)));
    assert_eq!(Opcode::try_from(99), Err(UnknownOpcode(99)));
}

#[test]
fn opcode_display_uses_canonical_name() {
    assert_eq!(Opcode::AclQuery.to_string(), "ACL_QUERY");
    assert_eq!(UnknownOpcode(42).to_string(), "unknown upcall opcode 42");
}

#[test]
fn request_header_occupies_fixed_length() {
    let mut buf = [0u8; REQUEST_HEADER_LEN];
    let mut writer = ReplyWriter::new(&mut buf);
    RequestHeader {
        xid: 9,
        opcode: Opcode::AclQuery.as_u32(),
    }
    .encode(&mut writer)
    .unwrap();
    assert_eq!(writer.remaining(), 0);

    let mut reader = UpcallReader::new(&buf);
    let header = RequestHeader::decode(&mut reader).unwrap();
    assert_eq!(header.xid, 9);
    assert_eq!(header.opcode, 15);
}

#[test]
fn reply_header_rejects_short_buffer() {
    let mut buf = [0u8; REPLY_HEADER_LEN - 1];
    let mut writer = ReplyWriter::new(&mut buf);
    let header = ReplyHeader {
        xid: 1,
        opcode: 15,
        status: 0,
        payload_len: 0,
    };
    assert!(header.encode(&mut writer).unwrap_err().is_overflow());
}

#[test]
fn truncated_request_header_underflows() {
    let buf = 5u64.to_ne_bytes();
    let mut reader = UpcallReader::new(&buf);
    assert!(RequestHeader::decode(&mut reader).unwrap_err().is_underflow());
}
