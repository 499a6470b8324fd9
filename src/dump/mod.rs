//! Crash dump decoding - framing scan and decode chain

pub mod reader;
pub mod record;

pub use reader::{CrashDumpReader, BEGIN_MARKER, END_MARKER};
pub use record::CrashRecord;
