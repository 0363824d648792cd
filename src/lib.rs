//! Streaming decoder for J9 Portable Heap Dumps (PHD).
//!
//! ```no_run
//! use phdump::{DumpParser, MemoryIndex, ParserOptions};
//!
//! let mut parser = DumpParser::open("heapdump.phd", ParserOptions::default())?;
//! let mut index = MemoryIndex::new();
//! let stats = parser.parse(&mut index)?;
//! println!("{stats}");
//! # Ok::<(), phdump::StackError>(())
//! ```

/// Application settings loaded from defaults, TOML and environment.
pub mod config;
/// PHD wire format: cursor, string decoder, record decoders, stream parser.
pub mod dump;
/// Address-keyed stores the parser writes decoded records into.
pub mod index;
/// Logging initialization (filters, formats).
pub mod logging;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Settings loaded from defaults, a TOML file and `PHDUMP_*` variables.
pub use crate::config::Settings;
/// Decoded records and the stream parser.
pub use dump::{
    Address, ClassRecord, DumpParser, Header, NoopListener, ObjectArrayRecord, ObjectRecord,
    ParseListener, ParserOptions, ParsingStatistics, Platform, PrimitiveArrayRecord,
    PrimitiveType, Record, RecordKind,
};
/// Index backings.
pub use index::{build_index, ClassOnlyIndex, IndexMode, IndexSink, MemoryIndex, SpillIndex};
/// Error types and result alias.
pub use phdump_error::{ErrorKind, IndexError, PhdError, PhdResult, StackError};
