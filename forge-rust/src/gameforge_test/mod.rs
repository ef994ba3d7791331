//! Test doubles for code built on `gameforge`.

mod model;

pub use model::*;
