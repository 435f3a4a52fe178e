//! # replwire
//!
//! Kernel-side endpoint of an interactive compute protocol: a long-running
//! process that accepts requests over a multipart message transport,
//! evaluates them through a pluggable execution engine, and streams results
//! and status back to connected front-ends.
//!
//! ## Architecture
//!
//! - **Protocol**: typed messages with causal parent headers, packed to
//!   ordered frame sequences and authenticated with HMAC-SHA256
//! - **Session**: process-wide identity minting headers with fresh ids
//! - **Transport**: three channels (routed request/reply, broadcast, and
//!   heartbeat) behind one multipart [`Channel`](transport::Channel) trait
//! - **Kernel**: single-threaded FIFO dispatch loop with failure isolation
//!   and abort cascading for queued dependents
//!
//! ## Example
//!
//! ```ignore
//! use replwire::{heartbeat, Kernel, Session};
//!
//! #[tokio::main]
//! async fn main() -> replwire::Result<()> {
//!     let info = replwire::ConnectionInfo::from_file("connection.json")?;
//!     let session = Session::new(&info.username, &info.key);
//!
//!     let channels = info.bind().await?;
//!     tokio::spawn(heartbeat::run(channels.heartbeat));
//!
//!     Kernel::new(session, channels.shell, channels.iopub, Box::new(MyEngine::default()))
//!         .run()
//!         .await
//! }
//! ```

pub mod auth;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod heartbeat;
pub mod kernel;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::ConnectionInfo;
pub use engine::{Completer, EvaluationError, ExecutionEngine, PlainTextSink, ResultSink};
pub use error::{KernelError, Result};
pub use kernel::Kernel;
pub use protocol::{Header, Message, MessageKind, Parent, Status, WireCodec, WireMessage};
pub use session::Session;
