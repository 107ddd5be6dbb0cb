//! Wire protocol: the command catalog and the response classifier.

pub mod classify;
pub mod command;

pub use classify::{classify, AsyncEvent, Outcome};
pub use command::{debug_mask, Command, DEFAULT_QOS, GNSS_INFO_PREFIX, TERMINATOR};
