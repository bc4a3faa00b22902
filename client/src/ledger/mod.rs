//! # Ledger Access
//!
//! Everything between a typed caller and a remote token ledger: the wire
//! types, the transport that carries them, and the facade that validates
//! at the boundary and keeps "the network failed" apart from "the ledger
//! said no".
//!
//! - [`requests`] — typed envelopes, methods, and transfer structs
//! - [`transport`] — the HTTP gateway and the transport seam
//! - [`client`] — the facade the rest of the crate calls

pub mod client;
pub mod requests;
pub mod transport;

pub use client::{LedgerClient, LedgerError};
pub use requests::{
    BlockIndex, CallEnvelope, CallKind, LedgerMethod, Reply, TransferArg, TransferParams,
    TransferReply,
};
pub use transport::{HttpGatewayTransport, LedgerTransport, TransportError};
