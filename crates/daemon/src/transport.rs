//! crates/daemon/src/transport.rs
//!
//! How upcalls reach the daemon and replies reach the driver.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of upcall requests and sink for replies.
///
/// `recv` is called from the serving thread and `send` from any worker.
pub trait UpcallTransport: Send + Sync {
    /// Next request, or `None` once the driver has closed the channel.
    fn recv(&self) -> io::Result<Option<Vec<u8>>>;

    /// Delivers one reply.
    fn send(&self, reply: &[u8]) -> io::Result<()>;
}

impl<T: UpcallTransport + ?Sized> UpcallTransport for Arc<T> {
    fn recv(&self) -> io::Result<Option<Vec<u8>>> {
        (**self).recv()
    }

    fn send(&self, reply: &[u8]) -> io::Result<()> {
        (**self).send(reply)
    }
}

/// Transport framing each message as `len: u32 | bytes` over a byte stream.
///
/// Lengths are native-endian, matching the rest of the upcall encoding.
#[derive(Debug)]
pub struct StreamTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    max_frame: usize,
}

impl<R, W> StreamTransport<R, W>
where
    R: Read + Send,
    W: Write + Send,
{
    /// Wraps a reader and writer. Frames longer than `max_frame` are refused.
    pub const fn new(reader: R, writer: W, max_frame: usize) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            max_frame,
        }
    }

    /// Returns the writer, for inspecting what was sent.
    pub fn into_writer(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R, W> UpcallTransport for StreamTransport<R, W>
where
    R: Read + Send,
    W: Write + Send,
{
    fn recv(&self) -> io::Result<Option<Vec<u8>>> {
        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);

        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match reader.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }

        let len = u32::from_ne_bytes(prefix) as usize;
        if len > self.max_frame {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("upcall frame of {len} bytes exceeds limit of {}", self.max_frame),
            ));
        }
        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame)?;
        Ok(Some(frame))
    }

    fn send(&self, reply: &[u8]) -> io::Result<()> {
        let len = u32::try_from(reply.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "reply too large"))?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&len.to_ne_bytes())?;
        writer.write_all(reply)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(bytes: &[u8]) -> Vec<u8> {
        let mut out = (bytes.len() as u32).to_ne_bytes().to_vec();
        out.extend_from_slice(bytes);
        out
    }

    #[test]
    fn reads_frames_until_eof() {
        let mut input = frame(b"first");
        input.extend(frame(b""));
        input.extend(frame(b"third"));
        let transport = StreamTransport::new(Cursor::new(input), Vec::new(), 64);

        assert_eq!(transport.recv().unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(transport.recv().unwrap().as_deref(), Some(&b""[..]));
        assert_eq!(transport.recv().unwrap().as_deref(), Some(&b"third"[..]));
        assert_eq!(transport.recv().unwrap(), None);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let mut input = frame(b"abcdef");
        input.truncate(7);
        let transport = StreamTransport::new(Cursor::new(input), Vec::new(), 64);
        assert_eq!(
            transport.recv().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );

        let transport = StreamTransport::new(Cursor::new(vec![1, 0]), Vec::new(), 64);
        assert_eq!(
            transport.recv().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn oversized_frame_is_refused() {
        let transport = StreamTransport::new(Cursor::new(frame(&[0; 65])), Vec::new(), 64);
        assert_eq!(
            transport.recv().unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn send_writes_framed_reply() {
        let transport = StreamTransport::new(Cursor::new(Vec::new()), Vec::new(), 64);
        transport.send(b"reply").unwrap();
        assert_eq!(transport.into_writer(), frame(b"reply"));
    }
}
