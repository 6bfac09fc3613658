//! The embedding entry point, driven over files the way a driver pipe would be.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::process::ExitCode;
use std::sync::Arc;

use upcalld::daemon::{
    FileAttributes, FileId, HandleTable, OpenState, RemoteAttributeSource, RemoteStatus, Root,
    SessionId,
};
use upcalld::metadata::{Sid, WellKnownSid};
use upcalld::protocol::acl::AclContainer;
use upcalld::protocol::attr::AttrBitmap;
use upcalld::protocol::{
    HandleToken, Opcode, QueryMask, ReplyHeader, ReplyWriter, RequestHeader, UpcallReader, status,
};
use upcalld::{Host, run_with};

struct Server {
    owner: &'static str,
    group: &'static str,
}

impl RemoteAttributeSource for Server {
    fn getattr(
        &self,
        _session: SessionId,
        _file: &FileId,
        request: &AttrBitmap,
        _acl: Option<&mut AclContainer>,
    ) -> Result<FileAttributes, RemoteStatus> {
        Ok(FileAttributes {
            owner: self.owner.into(),
            owner_group: self.group.into(),
            returned: *request,
        })
    }
}

struct Session {
    handles: Arc<HandleTable>,
    root: HandleToken,
    state: HandleToken,
}

impl Session {
    fn new() -> Self {
        let handles = Arc::new(HandleTable::new());
        let root = handles.insert_root(Root {
            session: SessionId::new(1),
            server: "server".into(),
        });
        let state = handles.insert_open_state(OpenState {
            session: SessionId::new(1),
            file: FileId {
                handle: vec![0xab; 16],
                fileid: 42,
            },
            path: "/export/file".into(),
        });
        Self {
            handles,
            root,
            state,
        }
    }

    fn write_request(&self, out: &mut File, xid: u64, query: QueryMask) {
        let mut body = [0u8; 32];
        let mut writer = ReplyWriter::new(&mut body);
        RequestHeader {
            xid,
            opcode: Opcode::AclQuery.as_u32(),
        }
        .encode(&mut writer)
        .unwrap();
        writer.write_bytes(&self.root.to_wire()).unwrap();
        writer.write_bytes(&self.state.to_wire()).unwrap();
        writer.write_u32(query.bits()).unwrap();
        let len = writer.into_written();

        out.write_all(&(len as u32).to_ne_bytes()).unwrap();
        out.write_all(&body[..len]).unwrap();
    }
}

fn read_replies(mut file: File) -> Vec<Vec<u8>> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0)).unwrap();
    file.read_to_end(&mut bytes).unwrap();

    let mut reader = UpcallReader::new(&bytes);
    let mut replies = Vec::new();
    while !reader.is_empty() {
        let len = reader.read_u32().unwrap() as usize;
        replies.push(reader.read_bytes(len).unwrap().to_vec());
    }
    replies
}

fn identities(reply: &[u8]) -> (ReplyHeader, Vec<Vec<u8>>) {
    let mut reader = UpcallReader::new(reply);
    let header = ReplyHeader::decode(&mut reader).unwrap();
    let mut records = Vec::new();
    while !reader.is_empty() {
        let len = reader.read_u32().unwrap() as usize;
        records.push(reader.read_bytes(len).unwrap().to_vec());
    }
    (header, records)
}

fn serve(args: &[&str], server: Server, requests: impl FnOnce(&Session, &mut File)) -> Vec<Vec<u8>> {
    let session = Session::new();
    let mut input = tempfile::tempfile().unwrap();
    requests(&session, &mut input);
    input.seek(SeekFrom::Start(0)).unwrap();

    let output = tempfile::tempfile().unwrap();
    let host = Host::new(
        Arc::clone(&session.handles),
        Arc::new(server),
        input,
        output.try_clone().unwrap(),
    );
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    let exit = run_with(args.iter().copied(), host, &mut stdout, &mut stderr);
    assert_eq!(exit, ExitCode::SUCCESS, "{}", String::from_utf8_lossy(&stderr));
    assert_eq!(session.handles.ref_count(session.state), Some(0));
    read_replies(output)
}

#[cfg(unix)]
#[test]
fn local_accounts_map_to_unix_sids() {
    let replies = serve(
        &["upcalld", "--workers", "2"],
        Server {
            owner: "root@example.org",
            group: "root",
        },
        |session, input| {
            session.write_request(input, 1, QueryMask::OWNER | QueryMask::GROUP);
            session.write_request(input, 2, QueryMask::GROUP);
        },
    );
    assert_eq!(replies.len(), 2);

    // `root` is found in the user database before the group database.
    let root = Sid::unix_user(0).to_bytes();
    for reply in replies {
        let (header, records) = identities(&reply);
        assert_eq!(header.status, status::SUCCESS);
        match header.xid {
            1 => assert_eq!(records, vec![root.clone(), root.clone()]),
            2 => assert_eq!(records, vec![root.clone()]),
            other => panic!("unexpected xid {other}"),
        }
    }
}

#[test]
fn unknown_accounts_use_the_configured_well_known_sid() {
    let replies = serve(
        &["upcalld", "--unmapped", "world", "--workers", "1"],
        Server {
            owner: "no-such-account-7f3e@example.org",
            group: "no-such-group-7f3e",
        },
        |session, input| session.write_request(input, 9, QueryMask::OWNER | QueryMask::GROUP),
    );

    let (header, records) = identities(&replies[0]);
    assert_eq!(header.xid, 9);
    assert_eq!(header.status, status::SUCCESS);
    let world = WellKnownSid::World.sid().to_bytes();
    assert_eq!(records, vec![world.clone(), world]);
}

#[test]
fn default_unmapped_identity_is_the_null_sid() {
    let replies = serve(
        &["upcalld"],
        Server {
            owner: "no-such-account-7f3e",
            group: "no-such-group-7f3e",
        },
        |session, input| session.write_request(input, 3, QueryMask::OWNER),
    );

    let (_, records) = identities(&replies[0]);
    assert_eq!(records, vec![WellKnownSid::Null.sid().to_bytes()]);
}

#[test]
fn help_and_version_are_written_to_stdout() {
    for (flag, needle) in [("--help", "--workers"), ("--version", "upcalld")] {
        let session = Session::new();
        let host = Host::new(
            session.handles,
            Arc::new(Server { owner: "", group: "" }),
            std::io::empty(),
            std::io::sink(),
        );
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        let exit = run_with(["upcalld", flag], host, &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::SUCCESS);
        assert!(String::from_utf8(stdout).unwrap().contains(needle));
        assert!(stderr.is_empty());
    }
}

#[test]
fn bad_arguments_report_usage_errors() {
    let session = Session::new();
    let host = Host::new(
        session.handles,
        Arc::new(Server { owner: "", group: "" }),
        std::io::empty(),
        std::io::sink(),
    );
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    let exit = run_with(["upcalld", "--workers", "0"], host, &mut stdout, &mut stderr);
    assert_eq!(exit, ExitCode::from(2));
    assert!(stdout.is_empty());
    assert!(!stderr.is_empty());
}

#[test]
fn truncated_input_stream_is_an_io_failure() {
    let session = Session::new();
    let host = Host::new(
        session.handles,
        Arc::new(Server { owner: "", group: "" }),
        std::io::Cursor::new(vec![40, 0]),
        std::io::sink(),
    );
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    let exit = run_with(["upcalld"], host, &mut stdout, &mut stderr);
    assert_eq!(exit, ExitCode::from(1));
    assert!(String::from_utf8(stderr).unwrap().starts_with("upcalld: "));
}
