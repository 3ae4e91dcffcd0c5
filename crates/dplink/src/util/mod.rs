//! Shared utilities for dplink.

pub mod parse;

pub use parse::{ParseError, get_i32, get_i64, get_u8, get_u32, get_u64};
