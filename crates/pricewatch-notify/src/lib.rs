//! Push notification delivery for pricewatch.
//!
//! `Notifier` is a single-attempt send of one message. `PushoverNotifier`
//! delivers through the Pushover messages API; `MockNotifier` records sends
//! for tests.

pub mod error;
pub mod notifier;
pub mod pushover;

pub use error::{NotifyError, NotifyResult};
pub use notifier::{DynNotifier, MockNotifier, Notifier};
pub use pushover::{PushoverConfig, PushoverNotifier, DEFAULT_PUSHOVER_URL};
