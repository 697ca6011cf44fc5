//! Stage execution context backends.
//!
//! 1. **ScriptStage** - a long-lived child process speaking line-delimited JSON
//! 2. **FunctionStage** - in-process closures

#[cfg(test)]
mod function;
mod script;

#[cfg(test)]
pub use function::FunctionStage;
pub use script::ScriptStage;
