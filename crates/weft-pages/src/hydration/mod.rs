//! Hydration script compiler.
//!
//! The script restores captured state in the browser, evaluates computed
//! values, wires reactive text bindings and attaches event listeners. Static
//! pages get no script at all.

pub mod client;
pub mod compiler;

pub use compiler::compile;
