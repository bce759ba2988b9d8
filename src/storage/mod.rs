//! File persistence helpers.

mod atomic;

pub use atomic::write_atomic;
