//! Core model for planrev: the plan arena, the Markdown plan parser, viewed
//! tracking, the step list engine, and review formatting.
//!
//! Nothing in this crate touches the terminal; the `planrev` binary drives it.

pub mod parser;
pub mod review;
pub mod step_list;
pub mod types;
pub mod viewed;
