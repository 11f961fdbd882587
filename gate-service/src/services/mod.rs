//! Services layer for the code gate.
//!
//! Generation, rotation, allowlisting, verification, audit, delivery,
//! and session issuance.

mod access_log;
mod allowlist;
mod code;
pub mod notifier;
mod rotation;
mod session;
mod verifier;

pub use access_log::AccessLog;
pub use allowlist::Allowlist;
pub use code::{CodeGenerator, CodeSource};
pub use notifier::{EmailNotifier, NoopNotifier, Notifier, RecordingNotifier};
pub use rotation::{spawn_rotation, RotationClock};
pub use session::SessionIssuer;
pub use verifier::{IdentityDecision, Verifier, VerifyOutcome};
