//! Run execution: engine, step executor, workspace and tool plumbing

pub mod command;
pub mod engine;
pub mod executor;
pub mod toolchain;
pub mod workspace;

pub use command::{CommandError, CommandOutput, CommandRunner};
pub use engine::{DispatchOutcome, EngineError, RunEngine, RunEvent};
pub use executor::{StepExecutor, StepOutcome};
pub use toolchain::{PythonProvisioner, PythonToolchain, ToolchainError};
pub use workspace::{Workspace, WorkspaceError};
