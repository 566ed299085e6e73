//! ReAct 主循环
//!
//! 中断轮询 -> Oracle 决策 -> 执行工具 -> 记录 Observation -> 下一轮；
//! 终止条件：final_answer（Completed）、Oracle 不可用（Failed）、步数用尽 / 取消 / InternalFault（Aborted）。

use std::collections::HashSet;

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::core::{
    ConversationState, Observation, RecoveryAction, RecoveryEngine, SessionStatus, Step,
    StepOrigin,
};
use crate::react::{Decision, DecisionContext, DecisionOracle, DisruptionWatch, ReactEvent, ToolMemo};
use crate::tools::{ToolError, ToolExecutor, DISRUPTION_MONITOR};

/// 无法解析的 Oracle 回复在历史中的 action 名
pub const UNPARSEABLE_REPLY: &str = "(unparseable reply)";

/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;
/// 思考内容展示最大字符数
const THINKING_PREVIEW_CHARS: usize = 800;

/// 会话结果：终态、答复文本与完整会话状态
#[derive(Debug)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub answer: String,
    pub state: ConversationState,
}

/// ReAct 会话配置
pub struct ReactSession<'a> {
    pub oracle: &'a dyn DecisionOracle,
    pub executor: &'a ToolExecutor,
    pub recovery: &'a RecoveryEngine,
    pub cancel_token: CancellationToken,
    pub max_iterations: usize,
    /// 同一会话内复用 (tool, input) 的成功结果
    pub memoize: bool,
    pub watch: Option<&'a DisruptionWatch>,
    pub event_tx: Option<&'a UnboundedSender<ReactEvent>>,
}

impl<'a> ReactSession<'a> {
    pub fn new(
        oracle: &'a dyn DecisionOracle,
        executor: &'a ToolExecutor,
        recovery: &'a RecoveryEngine,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            oracle,
            executor,
            recovery,
            cancel_token,
            max_iterations: 10,
            memoize: false,
            watch: None,
            event_tx: None,
        }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_memoization(mut self, enable: bool) -> Self {
        self.memoize = enable;
        self
    }

    pub fn with_watch(mut self, watch: &'a DisruptionWatch) -> Self {
        self.watch = Some(watch);
        self
    }

    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<ReactEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit(&self, ev: ReactEvent) {
        if let Some(tx) = self.event_tx {
            let _ = tx.send(ev);
        }
    }

    fn finish(&self, mut state: ConversationState, status: SessionStatus, answer: String) -> SessionOutcome {
        state.status = status;
        tracing::info!(
            session_id = %state.session_id,
            status = ?status,
            iterations = state.iteration_count,
            steps = state.steps.len(),
            "Session finished"
        );
        self.emit(ReactEvent::Finished { status });
        SessionOutcome {
            status,
            answer,
            state,
        }
    }
}

/// 执行一次会话；总会以终态返回
pub async fn react_loop(session: &ReactSession<'_>, goal: &str) -> SessionOutcome {
    let mut state = ConversationState::new(goal);
    let tools = session.executor.specs();
    let mut seen_headlines: HashSet<String> = HashSet::new();
    let mut memo = ToolMemo::new();

    tracing::info!(session_id = %state.session_id, goal = %goal, "Session started");

    loop {
        if session.cancel_token.is_cancelled() {
            let answer = state.partial_answer("session cancelled");
            return session.finish(state, SessionStatus::Aborted, answer);
        }
        if state.iteration_count >= session.max_iterations {
            tracing::warn!(max_iterations = session.max_iterations, "Iteration budget exhausted");
            let answer = state.partial_answer(&format!(
                "iteration budget of {} exhausted without a final answer",
                session.max_iterations
            ));
            return session.finish(state, SessionStatus::Aborted, answer);
        }

        session.emit(ReactEvent::StepUpdate {
            step: state.iteration_count + 1,
            max_steps: session.max_iterations,
        });

        if let Some(watch) = session.watch {
            let signals = watch.poll(&state.steps, &mut seen_headlines).await;
            if !signals.is_empty() {
                let headlines: Vec<String> =
                    signals.iter().flat_map(|s| s.headlines.iter().cloned()).collect();
                tracing::info!(count = headlines.len(), "Injecting disruption alert");
                session.emit(ReactEvent::Disruption { headlines });
                let keywords: Vec<&str> = signals.iter().map(|s| s.query_keywords.as_str()).collect();
                state.record(Step {
                    origin: StepOrigin::DisruptionAlert,
                    thought: None,
                    action: DISRUPTION_MONITOR.to_string(),
                    action_input: json!({ "keywords": keywords.join("; ") }),
                    observation: Observation::Disruption { signals },
                });
            }
        }

        session.emit(ReactEvent::Thinking);
        let ctx = DecisionContext {
            goal,
            tools: &tools,
            history: &state.steps,
        };
        let decision = session.oracle.decide(&ctx).await;

        match decision {
            Ok(Decision::FinalAnswer { thought, text }) => {
                if let Some(t) = thought {
                    session.emit(ReactEvent::ThinkingContent { text: truncate(&t, THINKING_PREVIEW_CHARS) });
                }
                return session.finish(state, SessionStatus::Completed, text);
            }
            Ok(Decision::Action { thought, tool, input }) => {
                if let Some(t) = &thought {
                    session.emit(ReactEvent::ThinkingContent { text: truncate(t, THINKING_PREVIEW_CHARS) });
                }
                session.emit(ReactEvent::ToolCall {
                    tool: tool.clone(),
                    args: input.clone(),
                });

                // 中断扫描结果随时间变化，不缓存
                let cacheable = session.memoize && tool != DISRUPTION_MONITOR;
                let (result, attempts) = match memo.get(&tool, &input).filter(|_| cacheable) {
                    Some(cached) => {
                        tracing::debug!(tool = %tool, "Reusing memoized result");
                        (Ok(cached.clone()), 0)
                    }
                    None => {
                        let report = session.executor.execute(&tool, input.clone()).await;
                        (report.result, report.attempts)
                    }
                };

                let observation = match result {
                    Ok(output) => {
                        session.emit(ReactEvent::Observation {
                            tool: tool.clone(),
                            preview: truncate(&output.to_string(), OBSERVATION_PREVIEW_CHARS),
                            attempts,
                        });
                        if cacheable && attempts > 0 {
                            memo.insert(&tool, &input, output.clone());
                        }
                        Observation::Success { output }
                    }
                    Err(error) => {
                        session.emit(ReactEvent::ToolFailure {
                            tool: tool.clone(),
                            kind: error.kind.as_str().to_string(),
                            reason: error.message.clone(),
                        });
                        if session.recovery.on_tool_error(&error) == RecoveryAction::Abort {
                            let reason = format!("{tool} reported an internal fault ({})", error.message);
                            session.emit(ReactEvent::Recovery {
                                action: "Abort".to_string(),
                                detail: reason.clone(),
                            });
                            state.record(Step {
                                origin: StepOrigin::Oracle,
                                thought,
                                action: tool,
                                action_input: input,
                                observation: Observation::Error { error },
                            });
                            let answer = state.partial_answer(&reason);
                            return session.finish(state, SessionStatus::Aborted, answer);
                        }
                        Observation::Error { error }
                    }
                };

                state.record(Step {
                    origin: StepOrigin::Oracle,
                    thought,
                    action: tool,
                    action_input: input,
                    observation,
                });
            }
            Err(e) => match session.recovery.handle(&e) {
                RecoveryAction::RetryWithPrompt(prompt) => {
                    tracing::warn!(error = %e, "Oracle reply unparseable, asking again");
                    session.emit(ReactEvent::Recovery {
                        action: "RetryWithPrompt".to_string(),
                        detail: e.to_string(),
                    });
                    state.record(Step {
                        origin: StepOrigin::Oracle,
                        thought: None,
                        action: UNPARSEABLE_REPLY.to_string(),
                        action_input: Value::Null,
                        observation: Observation::Error {
                            error: ToolError::invalid_input(prompt),
                        },
                    });
                }
                RecoveryAction::Fail => {
                    tracing::error!(error = %e, "Decision oracle unavailable");
                    session.emit(ReactEvent::Recovery {
                        action: "Fail".to_string(),
                        detail: e.to_string(),
                    });
                    let answer = format!("Planning failed: the decision oracle is unavailable ({e}).");
                    return session.finish(state, SessionStatus::Failed, answer);
                }
                RecoveryAction::Abort | RecoveryAction::Observe => {
                    session.emit(ReactEvent::Recovery {
                        action: "Abort".to_string(),
                        detail: e.to_string(),
                    });
                    let answer = state.partial_answer(&e.to_string());
                    return session.finish(state, SessionStatus::Aborted, answer);
                }
            },
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
