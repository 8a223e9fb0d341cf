//! Reconciled synchronization engine
//!
//! The spreadsheet is the system of record but offers no transactions and no
//! reliable write acknowledgment. This module owns the loop that keeps local
//! edits honest against it: baseline snapshot → diff tracking → ready-set
//! review → batched write → verification read → reconcile.

pub mod baseline;
pub mod columns;
pub mod debounce;
pub mod dispatch;
pub mod ready;
pub mod reconcile;
pub mod record;
pub mod session;
pub mod tracker;
pub mod value;
pub mod verify;

#[cfg(test)]
pub mod testing;

pub use baseline::BaselineSnapshot;
pub use columns::{ColumnMap, RemoteAddress};
pub use debounce::{CoalescedEdit, EditCoalescer};
pub use dispatch::{AcceptedCell, DispatchOutcome, RejectedCell, WriteErrorKind};
pub use ready::{ReadyItem, ReadySet};
pub use reconcile::{CommitReport, FailedDetail, MismatchDetail};
pub use record::{NaturalKey, OrderRecord};
pub use session::EditSession;
pub use tracker::{DiffTracker, DirtyCell, EditOutcome};
pub use value::{CellValue, EditableField, FieldKind};
pub use verify::{Mismatch, VerifyOutcome};
