//! Pure building blocks shared by every surface: no I/O, no threads.

pub mod context;
pub mod sites;
pub mod value;

pub use context::{OperationContext, OperationKind};
pub use value::{decode, encode, CodecError, HostValue};
