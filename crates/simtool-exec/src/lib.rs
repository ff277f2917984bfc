//! simtool-exec: Command execution abstraction
//!
//! Provides the trait and local implementation used to invoke host package
//! managers as external processes.

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use command::CommandLine;
pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::CommandExecutor;
