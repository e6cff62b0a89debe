//! Host-language type conversions layered on top of [`crate::value`].

pub mod temporal;
