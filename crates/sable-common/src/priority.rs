//! Compilation-unit priorities.
//!
//! When two compilation units contribute definitions with the same qualified
//! name, the project scope keeps the higher-priority one visible and shadows
//! the rest. The ordering is total: `basis` ranks source-path units over
//! library units, `timestamp` ranks newer contributions over older ones, and
//! `sequence` is a per-unit unique ordinal that breaks any remaining tie.

use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum PriorityBasis {
    /// The unit came from a library on the library path.
    Library,
    /// The unit came from a source file on the source path. Outranks library.
    SourcePath,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct DefinitionPriority {
    pub basis: PriorityBasis,
    pub timestamp: u64,
    pub sequence: u64,
}

impl DefinitionPriority {
    pub fn new(basis: PriorityBasis, timestamp: u64, sequence: u64) -> Self {
        DefinitionPriority { basis, timestamp, sequence }
    }

    pub fn library(sequence: u64) -> Self {
        Self::new(PriorityBasis::Library, 0, sequence)
    }

    pub fn source(sequence: u64) -> Self {
        Self::new(PriorityBasis::SourcePath, 0, sequence)
    }
}
