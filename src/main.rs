//! supply-pilot - 供应链规划智能体
//!
//! 入口：初始化日志、加载配置、构建 Agent；命令行参数作为一次性目标运行，否则进入交互循环（exit / quit 退出）。
//! 会话运行中按 Ctrl+C 取消（在当前步骤结束后生效）。

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use supply_pilot::config::load_config;
use supply_pilot::core::{AgentBuilder, SessionSupervisor};
use supply_pilot::observability;
use supply_pilot::react::ReactEvent;
use supply_pilot::SupplyAgent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::var("SUPPLY_CONFIG").ok().map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load configuration")?;
    let agent = AgentBuilder::new(cfg)
        .with_collaborators_from_config()
        .build()
        .context("Failed to build agent")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        run_goal(&agent, &args.join(" ")).await;
        return Ok(());
    }

    println!(
        "Supply chain planner is online (tools: {}). Type 'exit' or 'quit' to leave.",
        agent.tool_names().join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let goal = line.trim();
        if goal.is_empty() {
            continue;
        }
        if goal.eq_ignore_ascii_case("exit") || goal.eq_ignore_ascii_case("quit") {
            println!("Shutting down. Goodbye!");
            break;
        }
        run_goal(&agent, goal).await;
    }

    Ok(())
}

async fn run_goal(agent: &SupplyAgent, goal: &str) {
    let supervisor = SessionSupervisor::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            print_event(&ev);
        }
    });

    let outcome = {
        let run = agent.run_with(goal, supervisor.child_token(), Some(&tx));
        tokio::pin!(run);
        loop {
            tokio::select! {
                outcome = &mut run => break outcome,
                _ = tokio::signal::ctrl_c(), if !supervisor.is_cancelled() => {
                    eprintln!("Cancelling after the current step...");
                    supervisor.cancel();
                }
            }
        }
    };
    drop(tx);
    let _ = printer.await;

    println!("\n[{:?}] {}\n", outcome.status, outcome.answer);
}

fn print_event(ev: &ReactEvent) {
    match ev {
        ReactEvent::StepUpdate { step, max_steps } => println!("-- step {step}/{max_steps}"),
        ReactEvent::Thinking => {}
        ReactEvent::ThinkingContent { text } => println!("Thought: {text}"),
        ReactEvent::ToolCall { tool, args } => println!("Action: {tool}\nAction Input: {args}"),
        ReactEvent::Observation { tool, preview, attempts } => {
            if *attempts > 1 {
                println!("Observation ({tool}, {attempts} attempts): {preview}");
            } else {
                println!("Observation ({tool}): {preview}");
            }
        }
        ReactEvent::ToolFailure { tool, kind, reason } => {
            println!("Observation ({tool} failed, {kind}): {reason}")
        }
        ReactEvent::Recovery { action, detail } => println!("Recovery [{action}]: {detail}"),
        ReactEvent::Disruption { headlines } => {
            println!("Disruption alert:");
            for h in headlines {
                println!("  - {h}");
            }
        }
        ReactEvent::Finished { .. } => {}
    }
}
