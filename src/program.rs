use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::instruction::Instruction;

// Subroutine table of name -> instruction sequence, in declaration order
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Subroutine that unlabeled leading instructions collect under. Also the
/// fallback entry for programs that never declare a label.
pub const IMPLICIT_ENTRY: &str = "Main";

/// Parse product: every declared subroutine plus the designated entry.
/// Read-only once parsing finishes.
#[derive(Debug)]
pub struct Program {
    routines: FxMap<String, Vec<Instruction>>,
    entry: Option<String>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            routines: IndexMap::with_hasher(FxBuildHasher::default()),
            entry: None,
        }
    }

    /// Register `name`, keeping any instructions it already holds.
    pub(crate) fn declare(&mut self, name: &str) {
        if !self.routines.contains_key(name) {
            self.routines.insert(name.to_owned(), Vec::new());
        }
    }

    pub(crate) fn push(&mut self, routine: &str, instr: Instruction) {
        self.routines.entry(routine.to_owned()).or_default().push(instr);
    }

    /// Designate the entry subroutine. Only the first call takes; the entry
    /// is computed once during parsing and never revised.
    pub(crate) fn set_entry(&mut self, name: &str) {
        if self.entry.is_none() {
            self.entry = Some(name.to_owned());
        }
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    pub fn subroutine(&self, name: &str) -> Option<&[Instruction]> {
        self.routines.get(name).map(Vec::as_slice)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// Subroutine names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl Default for Program {
    fn default() -> Self {
        Program::new()
    }
}
