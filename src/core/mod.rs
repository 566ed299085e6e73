//! 核心层：错误与恢复、会话状态、会话监管、Agent 构建

pub mod builder;
pub mod error;
pub mod recovery;
pub mod session_supervisor;
pub mod state;

pub use builder::AgentBuilder;
pub use error::{AgentError, RecoveryAction};
pub use recovery::{RecoveryEngine, RetryPolicy};
pub use session_supervisor::SessionSupervisor;
pub use state::{ConversationState, Observation, SessionStatus, Step, StepOrigin};
