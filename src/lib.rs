//! Average cost tax-lot engine for Swedish K4 reporting.
//!
//! [`core`] replays a chronological trade ledger against an exchange-rate
//! table and yields disposal records split into K4 sections C (currency) and
//! D (other assets). [`trades`] and [`rates`] read the inputs, [`detailed`]
//! renders the per-event dump.

pub mod columns;
pub mod core;
pub mod detailed;
pub mod rates;
pub mod trades;
pub mod utils;
