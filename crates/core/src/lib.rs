//! Domain core for the AdData project store.
//!
//! Holds the AdId and AdData validators, the project/script records, the
//! legacy migration transforms, export/import decoding and the
//! [`store::ProjectStore`] trait with its in-memory backend. Nothing here
//! knows about HTTP or SQL.

pub mod ad_data;
pub mod ad_id;
pub mod error;
pub mod migration;
pub mod policy;
pub mod project;
pub mod store;
pub mod transfer;
pub mod types;
