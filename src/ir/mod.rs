//! Catalyst Intermediate Representation
//!
//! A small control-flow-graph IR: functions made of basic blocks, each a
//! straight-line instruction sequence ending in one terminator. The IR is
//! designed to be:
//! - Easy to generate from the AST
//! - Easy to hand to a native backend
//! - Printable as text for inspection and for the compiler's output

mod builder;
mod instr;
mod lower;
mod types;
mod verify;

// Re-export in logical order
pub use instr::*;
pub use types::*;
pub use builder::*;
pub use lower::*;
pub use verify::*;
