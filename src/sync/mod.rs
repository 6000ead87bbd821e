//! Lock-free primitives shared between producer and consumer contexts.

mod flag;

pub use flag::AtomicFlag;
