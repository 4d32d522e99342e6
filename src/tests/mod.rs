//! # Integration tests that require a look inside the crate.
//!
//! Each module builds one small layout, checks the values it resolves to and the shape of the
//! tableau afterwards.
