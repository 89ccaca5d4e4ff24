//! # ErrorBag — Transactional Error Accumulation
//!
//! Combinators evaluate branches whose errors may or may not survive:
//! `anyOf` keeps nothing once a branch passes, `not` never keeps anything,
//! `allOf` always keeps everything. Instead of snapshotting and restoring a
//! shared list by hand, every branch is bracketed by a [`Checkpoint`]:
//!
//! ```text
//! let cp = bag.speculate();
//! eval.check(value, branch, path)?;
//! if bag.errors_since(&cp) == 0 { bag.discard(cp) } else { bag.commit(cp) }
//! ```
//!
//! ## LIFO Invariant
//!
//! Checkpoints close in the reverse order they were opened. Closing out of
//! order would truncate errors owned by an enclosing branch; this is
//! asserted in debug builds.
//!
//! ## Raise Policy
//!
//! With `CheckMode::EXCEPTIONS` the first record pushed while no
//! *speculative* checkpoint is open is returned as an error and aborts the
//! call. Records pushed inside `speculate()` brackets never raise on their
//! own; a combinator that fails reports its summary after closing its
//! brackets, and that summary raises.

use crate::error::{ErrorContext, ErrorList, ErrorRecord, ValidateError};

/// A position in an [`ErrorBag`], returned by `checkpoint`/`speculate`.
///
/// Must be closed with [`ErrorBag::commit`] or [`ErrorBag::discard`].
#[derive(Debug)]
#[must_use = "a checkpoint must be committed or discarded"]
pub struct Checkpoint {
    mark: usize,
    depth: usize,
    speculative: bool,
}

/// Ordered error accumulator with nested checkpoints.
#[derive(Debug, Default)]
pub struct ErrorBag {
    records: Vec<ErrorRecord>,
    open: Vec<usize>,
    speculative_depth: usize,
    raise: bool,
}

impl ErrorBag {
    /// An empty bag that never raises.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty bag that raises the first non-speculative record.
    pub fn raising() -> Self {
        Self {
            raise: true,
            ..Self::default()
        }
    }

    /// Record an error.
    ///
    /// # Errors
    ///
    /// In raising mode, outside every speculative checkpoint, returns the
    /// record as `ValidateError::Validation` (or `SchemaInvalid` for
    /// schema-context records).
    pub fn push(&mut self, record: ErrorRecord) -> Result<(), ValidateError> {
        if self.raise && self.speculative_depth == 0 {
            let record = Box::new(record);
            return Err(match record.context {
                ErrorContext::Document => ValidateError::Validation(record),
                ErrorContext::Schema => ValidateError::SchemaInvalid(record),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Open a checkpoint whose errors count as committed.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.open_checkpoint(false)
    }

    /// Open a checkpoint for a branch whose errors may be discarded.
    pub fn speculate(&mut self) -> Checkpoint {
        self.open_checkpoint(true)
    }

    fn open_checkpoint(&mut self, speculative: bool) -> Checkpoint {
        let mark = self.records.len();
        self.open.push(mark);
        if speculative {
            self.speculative_depth += 1;
        }
        Checkpoint {
            mark,
            depth: self.open.len(),
            speculative,
        }
    }

    fn close(&mut self, cp: &Checkpoint) {
        debug_assert_eq!(
            self.open.len(),
            cp.depth,
            "checkpoints must be closed in LIFO order"
        );
        self.open.pop();
        if cp.speculative {
            self.speculative_depth -= 1;
        }
    }

    /// Number of records added since `cp` was opened.
    pub fn errors_since(&self, cp: &Checkpoint) -> usize {
        self.records.len().saturating_sub(cp.mark)
    }

    /// Records added since `cp` was opened.
    pub fn records_since(&self, cp: &Checkpoint) -> &[ErrorRecord] {
        self.records.get(cp.mark..).unwrap_or_default()
    }

    /// Close `cp`, keeping its records.
    pub fn commit(&mut self, cp: Checkpoint) {
        self.close(&cp);
    }

    /// Close `cp`, dropping every record added since it was opened.
    pub fn discard(&mut self, cp: Checkpoint) {
        self.close(&cp);
        self.records.truncate(cp.mark);
    }

    /// Whether a speculative checkpoint is open.
    pub fn is_speculating(&self) -> bool {
        self.speculative_depth > 0
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were pushed (or all were discarded).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the bag.
    pub fn into_list(self) -> ErrorList {
        debug_assert!(self.open.is_empty(), "unclosed checkpoint");
        ErrorList::new(self.records)
    }
}
