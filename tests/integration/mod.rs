//! Integration scenarios across the public API.

pub mod filter_properties;
pub mod projection;
pub mod query_lowering;
pub mod search;
pub mod storage;
pub mod write_validation;
