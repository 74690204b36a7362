//! Wallet Bridge: a host-facing adapter over an asynchronous wallet engine.
//!
//! # Architecture
//!
//! ```text
//! Host call (primitives + correlation id)
//!   │
//!   ├── Bridge / InteractiveBridge (validate, build context + callback)
//!   │     ├── invalid → callback.interrupt(..) ── engine never called
//!   │     └── valid   → WalletEngine / InteractiveEngine (returns at once)
//!   │
//!   └── engine threads ──▶ WorkflowCallback
//!                            ├── codec (HostValue) + error translator
//!                            ├── host sink (HostEmitter, serialized)
//!                            └── CorrelationRegistry subscribers (fan-out only)
//! ```
//!
//! # Envelope stages
//!
//! | Stage | Terminal | Payload |
//! |-------|----------|---------|
//! | `acknowledged` | no | `data` |
//! | `progress` | no | `step`, `data` |
//! | `complete` | yes | `data` |
//! | `error` | yes | `errorPayload` |
//!
//! # Features
//!
//! - `native` - tokio channel sink and the `tracing-subscriber` initializer
//!
//! # Usage
//!
//! ```ignore
//! use wallet_bridge::{Bridge, BridgeConfig, HostEmitter};
//! use std::sync::Arc;
//!
//! let host = Arc::new(HostEmitter::new(|envelope| forward_to_host(envelope)));
//! let bridge = Bridge::from_config(BridgeConfig::from_env("wallet"), engine, host)?;
//!
//! bridge.add_session("user-1", "86400", "1000000", "corr-42");
//! let user = bridge.get_user("user-1")?;
//! ```

pub mod bridge;
pub mod callback;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod registry;
pub mod sink;

#[cfg(feature = "native")]
pub mod logging;

pub use bridge::{Bridge, InteractiveBridge};
pub use callback::{DirectCallback, Envelope, Event, FanOutCallback, Stage, WorkflowCallback};
pub use config::{BridgeConfig, LogFormat};
pub use self::core::{decode, encode, CodecError, HostValue, OperationContext, OperationKind};
pub use engine::{CredentialError, InteractiveEngine, Mnemonics, Passphrase, TransactionRequest, WalletEngine};
pub use errors::{translate, BridgeError, EngineError, ErrorCode, ErrorPayload};
pub use registry::CorrelationRegistry;
pub use sink::{EventSink, HostEmitter};

#[cfg(feature = "native")]
pub use logging::init_logging;
#[cfg(feature = "native")]
pub use sink::ChannelSink;
