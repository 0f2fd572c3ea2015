//! CloudFormation Stack Outputs
//!
//! Service discovery for the fleet: each account deploys the same stack, and the
//! stack exports the name of the log group the validator writes to.

#![warn(clippy::all, rust_2018_idioms)]

pub mod stack_outputs;

pub use stack_outputs::{
    resolve_stack_output, CloudFormationStackDescriber, StackDescriber, StackOutput,
};
