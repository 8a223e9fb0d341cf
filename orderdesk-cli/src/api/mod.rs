//! Remote spreadsheet store access
//!
//! The engine only ever sees the [`transport::RowTransport`] trait; the HTTP
//! client in [`client`] implements it against a Sheets-style values API.

pub mod client;
pub mod transport;

pub use client::SheetClient;
pub use transport::{
    BatchReadRequest, BatchReadResponse, BatchUpdateRequest, BatchUpdateResponse, CellCheck,
    CellUpdate, RawRow, ReadBack, RowTransport, WriteAck, WriteFailure,
};
