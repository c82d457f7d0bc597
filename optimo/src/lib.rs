//! # Optimo
//!
//! In-page core of the Optimo prompt optimizer: finds prompt inputs on
//! arbitrary pages, attaches a trigger to each, opens an option panel on
//! demand and rewrites the prompt through an external LLM provider.
//!
//! ## Features
//!
//! - **Host-agnostic**: the page is a [`HostDocument`]; [`MemoryDocument`] is
//!   the in-memory implementation
//! - **Idempotent attachment**: a marker attribute on the input guarantees one
//!   trigger per surface across rescans
//! - **Single flight**: at most one optimization request at a time
//! - **Tier gating**: premium tones, output formats and negative prompts need
//!   the elevated tier
//! - **OpenAI-compatible providers**: OpenAI, Anthropic, Google or a custom
//!   endpoint via [`ChatCompletionService`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use optimo::config::{Provider, ProviderConfig, SessionConfig};
//! use optimo::{ChatCompletionService, Entitlement, EntitlementView, MemoryDocument, Session};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ChatCompletionService::new(ProviderConfig::new(Provider::OpenAI, "sk-..."))?;
//!     let mut session = Session::new(
//!         MemoryDocument::new(),
//!         SessionConfig::default(),
//!         Arc::new(service),
//!         EntitlementView::fixed(Entitlement::default()),
//!     );
//!
//!     let report = session.start();
//!     println!("attached {} triggers", report.attached.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Driving a session
//!
//! ```rust,ignore
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! tx.send(PageEvent::Click { target: trigger })?;
//! tx.send(PageEvent::Submit { options: OptionSet::default() })?;
//! drop(tx);
//! session.run(rx).await;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
mod debounce;
pub mod document;
pub mod entitlement;
mod error;
pub mod html;
pub mod layout;
mod notice;
pub mod options;
pub mod positioner;
pub mod scanner;
pub mod service;
mod session;
pub mod tracker;

pub use config::{Provider, ProviderConfig, SessionConfig};
pub use coordinator::{Completion, Coordinator, CoordinatorState, Outcome, Rejection};
pub use debounce::Debouncer;
pub use document::{ElementId, ElementSnapshot, ElementSpec, HostDocument, MemoryDocument};
pub use entitlement::{upgrade_url, Entitlement, EntitlementSource, EntitlementView, Tier};
pub use error::{OptimoError, OptimoResult};
pub use html::{audit_html, snapshot_html, SurfaceAudit};
pub use layout::{Placement, Rect};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use options::{Capability, OptionSet};
pub use positioner::{OverlayMetrics, PanelSlot};
pub use scanner::{classify, scan, scan_pass, signals, ScanReport, Signal};
pub use service::{
    ChatCompletionService, DeferredChatService, OptimizationService, OptimizeRequest, ServiceReply,
};
pub use session::{PageEvent, Session, SubmitOutcome, SurfaceState};
pub use tracker::{AttachOutcome, Attachment, Tracker};
