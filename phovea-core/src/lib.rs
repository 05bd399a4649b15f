//! Phovea Core Library
//!
//! Range addressing for a plugin-based data server, plus the identifier
//! services that translate between range positions and external ids.
//!
//! # Architecture
//!
//! - `range`: the range engine (`fix`, `RangeElem`, `Range1D`, `Range`, `Selection`)
//! - `assigner` / `mapping`: identifier assignment and idtype mapping
//! - `config` / `context`: configuration and the context handed to handlers

pub mod assigner;
pub mod config;
pub mod context;
pub mod error;
mod lock;
pub mod mapping;
pub mod range;

pub use assigner::{FileIdAssigner, IdAssigner, MemoryIdAssigner, SearchHit};
pub use config::{AssignerKind, Config};
pub use context::AppContext;
pub use error::RangeError;
pub use mapping::{IdMapper, MappingManager, TableMapper};
pub use range::{
    fix, Bound, Range, Range1D, RangeElem, Selection, SingleRangeElem, SliceElem, SliceSpec,
};
