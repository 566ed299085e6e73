//! Agent 运行时
//!
//! SupplyAgent 持有 Oracle、ToolExecutor（共享只读注册表）、恢复引擎与可选的中断监控；
//! 每次 run 新建一个会话，会话之间互不共享状态。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::config::OrchestratorSection;
use crate::core::RecoveryEngine;
use crate::react::{react_loop, DecisionOracle, DisruptionWatch, ReactEvent, ReactSession, SessionOutcome};
use crate::tools::ToolExecutor;

pub struct SupplyAgent {
    oracle: Arc<dyn DecisionOracle>,
    executor: ToolExecutor,
    recovery: RecoveryEngine,
    watch: Option<DisruptionWatch>,
    orchestrator: OrchestratorSection,
}

impl SupplyAgent {
    pub(crate) fn new(
        oracle: Arc<dyn DecisionOracle>,
        executor: ToolExecutor,
        recovery: RecoveryEngine,
        watch: Option<DisruptionWatch>,
        orchestrator: OrchestratorSection,
    ) -> Self {
        Self {
            oracle,
            executor,
            recovery,
            watch,
            orchestrator,
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.executor.tool_names()
    }

    pub async fn run(&self, goal: &str) -> SessionOutcome {
        self.run_with(goal, CancellationToken::new(), None).await
    }

    /// 带取消令牌与事件通道运行一次会话
    pub async fn run_with(
        &self,
        goal: &str,
        cancel_token: CancellationToken,
        event_tx: Option<&UnboundedSender<ReactEvent>>,
    ) -> SessionOutcome {
        let mut session = ReactSession::new(
            self.oracle.as_ref(),
            &self.executor,
            &self.recovery,
            cancel_token,
        )
        .with_max_iterations(self.orchestrator.max_iterations)
        .with_memoization(self.orchestrator.memoize_tool_results);
        if let Some(watch) = &self.watch {
            session = session.with_watch(watch);
        }
        if let Some(tx) = event_tx {
            session = session.with_event_tx(tx);
        }
        react_loop(&session, goal).await
    }
}
