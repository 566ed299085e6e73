//! 会话监管：取消令牌
//!
//! 持有 CancellationToken，用户 Ctrl+C 时取消当前会话；ReAct 循环只在两次迭代之间检查，不会打断进行中的工具调用。

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct SessionSupervisor {
    cancel_token: CancellationToken,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// 触发取消（用户 Ctrl+C）
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// 为单个会话创建子 token：取消父 token 会级联，子 token 取消不影响父 token
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}
