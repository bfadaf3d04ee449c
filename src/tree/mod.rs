//! Tree walking engine
//!
//! A walk is one depth-first pass over a `Cursor`. The tree is either
//! read live through a `Walker` (`Traversal` keeps both in step) or was
//! already built in memory. What happens at each node is up to the
//! `OutputPolicy` driving `walk`.

mod config;
mod cursor;
mod engine;
mod local;
mod recursion;
mod traversal;
mod walker;

pub use config::Limits;
pub use cursor::{Cursor, Frame};
pub use engine::{OutputPolicy, walk};
pub use local::{LocalConfig, LocalWalker};
pub use traversal::Traversal;
pub use walker::{Go, Walker, probe};
