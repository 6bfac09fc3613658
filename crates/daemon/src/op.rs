//! crates/daemon/src/op.rs
//!
//! The parse, handle and marshal triad every upcall implements, and the
//! registry binding opcodes to implementations.
//!
//! # Design
//!
//! [`UpcallOp`] keeps each stage typed through its associated `Args`. The
//! registry stores operations behind a private object-safe adapter that runs
//! the three stages in order, so adding an opcode never touches the
//! dispatcher.
//!
//! # Invariants
//!
//! - `handle` runs only after `parse` succeeded and `marshal` only after
//!   `handle` succeeded.
//! - The arguments are dropped when the upcall finishes on any path, which
//!   releases every resource they own.

use std::collections::HashMap;
use std::fmt;

use logging::trace_upcall;
use protocol::{Opcode, ReplyWriter, UpcallReader};

use crate::error::UpcallError;

/// One upcall kind.
pub trait UpcallOp: Send + Sync {
    /// Decoded arguments plus whatever the handler produces for `marshal`.
    type Args: Send;

    /// The opcode this operation serves.
    fn opcode(&self) -> Opcode;

    /// Decodes the arguments that follow the request envelope.
    fn parse(&self, reader: &mut UpcallReader<'_>) -> Result<Self::Args, UpcallError>;

    /// Performs the operation.
    fn handle(&self, args: &mut Self::Args) -> Result<(), UpcallError>;

    /// Writes the reply payload.
    fn marshal(&self, args: &mut Self::Args, writer: &mut ReplyWriter<'_>)
    -> Result<(), UpcallError>;
}

/// Stage an upcall reached before it stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Arguments are being decoded.
    Parse,
    /// The operation is running.
    Handle,
    /// The reply payload is being written.
    Marshal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Handle => "handle",
            Self::Marshal => "marshal",
        })
    }
}

trait RegisteredOp: Send + Sync {
    fn run(
        &self,
        reader: &mut UpcallReader<'_>,
        writer: &mut ReplyWriter<'_>,
    ) -> Result<(), (Stage, UpcallError)>;
}

impl<T: UpcallOp> RegisteredOp for T {
    fn run(
        &self,
        reader: &mut UpcallReader<'_>,
        writer: &mut ReplyWriter<'_>,
    ) -> Result<(), (Stage, UpcallError)> {
        let opcode = self.opcode();
        let mut args = self.parse(reader).map_err(|err| (Stage::Parse, err))?;
        trace_upcall!(%opcode, "parsed");
        self.handle(&mut args)
            .map_err(|err| (Stage::Handle, err))?;
        trace_upcall!(%opcode, "handled");
        self.marshal(&mut args, writer)
            .map_err(|err| (Stage::Marshal, err))?;
        trace_upcall!(%opcode, written = writer.written(), "marshalled");
        Ok(())
    }
}

/// Opcode to operation bindings.
#[derive(Default)]
pub struct OpRegistry {
    ops: HashMap<Opcode, Box<dyn RegisteredOp>>,
}

impl OpRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `op` under its opcode, replacing any previous binding.
    pub fn register<T>(&mut self, op: T) -> &mut Self
    where
        T: UpcallOp + 'static,
    {
        self.ops.insert(op.opcode(), Box::new(op));
        self
    }

    /// Whether an operation is bound to `opcode`.
    #[must_use]
    pub fn contains(&self, opcode: Opcode) -> bool {
        self.ops.contains_key(&opcode)
    }

    /// Registered opcodes in numeric order.
    #[must_use]
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut opcodes: Vec<_> = self.ops.keys().copied().collect();
        opcodes.sort_unstable();
        opcodes
    }

    pub(crate) fn run(
        &self,
        opcode: Opcode,
        reader: &mut UpcallReader<'_>,
        writer: &mut ReplyWriter<'_>,
    ) -> Result<(), (Stage, UpcallError)> {
        match self.ops.get(&opcode) {
            Some(op) => op.run(reader, writer),
            None => Err((Stage::Parse, UpcallError::NotSupported(opcode))),
        }
    }
}

impl fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpRegistry")
            .field("opcodes", &self.opcodes())
            .finish()
    }
}
