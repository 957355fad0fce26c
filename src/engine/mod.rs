// src/engine/mod.rs

//! The pool itself.
//!
//! The lock-protected coordinating state lives in [`core`]; the public,
//! thread-owning handle is [`pool::ThreadPool`].

pub mod core;
pub mod pool;

pub use self::core::PoolPhase;
pub use self::pool::{DEFAULT_THREAD_NAME_PREFIX, ThreadPool};
