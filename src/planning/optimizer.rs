//! 库存优化引擎：固定费用补货模型（混合整数规划）
//!
//! 决策变量：整数 q >= 0（补货量），二元 b（是否下单）
//!
//! ```text
//! min  h * (stock + q - demand / 2) + order_cost * b
//! s.t. stock + q >= demand
//!      q <= M * b,  M = max(demand, 1) + stock + 1
//! ```
//!
//! 模型只有一个整数变量和一个二元变量，对 b 分支后每个子问题是 q 上的一维 LP：
//! 目标对 q 单调不减（h >= 0），松弛最优解取可行区间左端点，且左端点本身为整数，
//! 因此两次分支即可得到精确最优解。并列时取最小 q，再取 b = 0。

use serde::{Deserialize, Serialize};

use crate::planning::InventoryPlan;
use crate::tools::ToolError;

/// 一次求解请求（库存与成本参数均为显式入参）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryRequest {
    pub product_id: u64,
    pub demand: i64,
    pub current_stock: i64,
    pub holding_cost_rate: f64,
    pub order_cost: f64,
}

/// 分支子问题的最优解
#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    quantity: i64,
    order_placed: bool,
    objective: f64,
}

/// 线性化后的模型
#[derive(Clone, Debug)]
pub struct FixedChargeModel {
    demand: i64,
    current_stock: i64,
    holding_cost_rate: f64,
    order_cost: f64,
    big_m: i64,
}

impl FixedChargeModel {
    pub fn new(req: &InventoryRequest) -> Result<Self, ToolError> {
        if req.demand < 0 {
            return Err(ToolError::invalid_input(format!(
                "demand must be non-negative, got {}",
                req.demand
            )));
        }
        if req.current_stock < 0 {
            return Err(ToolError::invalid_input(format!(
                "current_stock must be non-negative, got {}",
                req.current_stock
            )));
        }
        for (name, v) in [
            ("holding_cost_rate", req.holding_cost_rate),
            ("order_cost", req.order_cost),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ToolError::invalid_input(format!(
                    "{name} must be a finite non-negative number, got {v}"
                )));
            }
        }
        let big_m = req
            .demand
            .max(1)
            .checked_add(req.current_stock)
            .and_then(|m| m.checked_add(1))
            .ok_or_else(|| ToolError::invalid_input("demand and stock are too large"))?;

        Ok(Self {
            demand: req.demand,
            current_stock: req.current_stock,
            holding_cost_rate: req.holding_cost_rate,
            order_cost: req.order_cost,
            big_m,
        })
    }

    pub fn big_m(&self) -> i64 {
        self.big_m
    }

    /// 目标函数值（线性化形式，order_cost 乘以二元变量 b）
    pub fn objective(&self, quantity: i64, order_placed: bool) -> f64 {
        let b = if order_placed { 1.0 } else { 0.0 };
        self.holding_cost_rate
            * ((self.current_stock + quantity) as f64 - self.demand as f64 / 2.0)
            + self.order_cost * b
    }

    /// 约束检查：需求满足 + big-M 联结
    pub fn is_feasible(&self, quantity: i64, order_placed: bool) -> bool {
        let cap = if order_placed { self.big_m } else { 0 };
        quantity >= 0 && quantity <= cap && self.current_stock + quantity >= self.demand
    }

    /// 固定 b 后的子问题：q ∈ [max(0, demand - stock), M·b]
    fn solve_branch(&self, order_placed: bool) -> Option<Candidate> {
        let lower = (self.demand - self.current_stock).max(0);
        let upper = if order_placed { self.big_m } else { 0 };
        if lower > upper {
            return None;
        }
        Some(Candidate {
            quantity: lower,
            order_placed,
            objective: self.objective(lower, order_placed),
        })
    }

    /// 分支定界：先 b = 0 后 b = 1，严格更优才替换当前最优
    fn solve(&self) -> Option<Candidate> {
        let mut incumbent: Option<Candidate> = None;
        for order_placed in [false, true] {
            let Some(c) = self.solve_branch(order_placed) else {
                tracing::debug!(order_placed, "branch infeasible");
                continue;
            };
            incumbent = match incumbent {
                None => Some(c),
                Some(best) => {
                    let better = c.objective < best.objective
                        || (c.objective == best.objective && c.quantity < best.quantity);
                    Some(if better { c } else { best })
                }
            };
        }
        incumbent
    }
}

/// 求解补货量并生成 InventoryPlan；相同输入得到相同计划
pub fn optimize_inventory(req: &InventoryRequest) -> Result<InventoryPlan, ToolError> {
    let model = FixedChargeModel::new(req)?;
    let best = model.solve().ok_or_else(|| {
        ToolError::internal(format!(
            "inventory model infeasible (demand={}, stock={}, M={})",
            req.demand,
            req.current_stock,
            model.big_m()
        ))
    })?;
    if !model.is_feasible(best.quantity, best.order_placed) {
        return Err(ToolError::internal(format!(
            "solver returned infeasible point q={} b={}",
            best.quantity, best.order_placed
        )));
    }

    tracing::debug!(
        product_id = req.product_id,
        demand = req.demand,
        reorder_quantity = best.quantity,
        total_cost = best.objective,
        "inventory model solved"
    );

    Ok(InventoryPlan {
        product_id: req.product_id,
        current_stock: req.current_stock,
        holding_cost_rate: req.holding_cost_rate,
        order_cost: req.order_cost,
        forecasted_demand: req.demand,
        reorder_quantity: best.quantity as u64,
        order_placed: best.order_placed,
        total_cost: best.objective,
    })
}
