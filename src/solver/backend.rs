//! [`good_lp`] backend for the solver adapter.

use std::time::Instant;

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    variable,
};
use tracing::{debug, info, warn};

use crate::lp::{LinearExpr, LinearProgram, Relation};

use super::{SolveOptions, SolveStatus, Solver, SolverOutcome};

/// Rows without variables are checked against this tolerance, scaled by `|rhs|`.
const CONSTANT_ROW_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    #[cfg(feature = "microlp")]
    MicroLp,
    #[cfg(feature = "clarabel")]
    Clarabel,
}

/// Solves through one of the pure-Rust solvers bundled with `good_lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoodLpSolver {
    backend: Backend,
    name: &'static str,
}

impl GoodLpSolver {
    /// Names of the backends enabled by cargo features.
    pub fn available() -> Vec<&'static str> {
        let mut names = Vec::new();
        #[cfg(feature = "microlp")]
        names.push("microlp");
        #[cfg(feature = "clarabel")]
        names.push("clarabel");
        names
    }

    /// Looks up a backend by name; `None` if it is not compiled in.
    pub fn new(name: &str) -> Option<Self> {
        let backend = match name.to_ascii_lowercase().as_str() {
            #[cfg(feature = "microlp")]
            "microlp" => Backend::MicroLp,
            #[cfg(feature = "clarabel")]
            "clarabel" => Backend::Clarabel,
            _ => return None,
        };
        let name = Self::available()
            .into_iter()
            .find(|n| n.eq_ignore_ascii_case(name))?;
        Some(Self { backend, name })
    }
}

impl Solver for GoodLpSolver {
    fn name(&self) -> &str {
        self.name
    }

    fn solve(&self, program: &LinearProgram, options: &SolveOptions) -> SolverOutcome {
        if let Some(row) = program
            .constraints
            .iter()
            .filter(|c| c.lhs.merged_terms().is_empty())
            .find(|c| !c.is_satisfied(&[], CONSTANT_ROW_TOLERANCE * c.rhs.abs().max(1.0)))
        {
            return SolverOutcome::failed(
                SolveStatus::Infeasible,
                format!("row `{}` has no variables and cannot hold", row.name),
            );
        }
        if options.time_limit.is_some() {
            warn!(solver = self.name, "time limit is not supported by this backend, ignoring");
        }

        if program.variables.is_empty() {
            return SolverOutcome {
                status: SolveStatus::Optimal,
                values: Vec::new(),
                objective_value: program.objective.constant,
                message: String::new(),
            };
        }

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = program
            .variables
            .iter()
            .map(|v| {
                let mut def = variable().min(v.lower);
                if let Some(upper) = v.upper {
                    def = def.max(upper);
                }
                vars.add(def)
            })
            .collect();

        let rows: Vec<good_lp::Constraint> = program
            .constraints
            .iter()
            .filter(|c| !c.lhs.merged_terms().is_empty())
            .map(|c| {
                let lhs = to_expression(&c.lhs, &handles);
                let rhs = c.effective_rhs();
                match c.relation {
                    Relation::Equal => constraint!(lhs == rhs),
                    Relation::LessOrEqual => constraint!(lhs <= rhs),
                    Relation::GreaterOrEqual => constraint!(lhs >= rhs),
                }
            })
            .collect();

        let objective = to_expression(&program.objective, &handles);
        let started = Instant::now();
        let result = match self.backend {
            #[cfg(feature = "microlp")]
            Backend::MicroLp => run(vars.minimise(objective).using(good_lp::microlp), rows, &handles),
            #[cfg(feature = "clarabel")]
            Backend::Clarabel => run(vars.minimise(objective).using(good_lp::clarabel), rows, &handles),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(values) => {
                let objective_value = program.objective.evaluate(&values);
                if options.tee {
                    info!(solver = self.name, elapsed_ms, objective_value, "backend finished");
                } else {
                    debug!(solver = self.name, elapsed_ms, objective_value, "backend finished");
                }
                SolverOutcome {
                    status: SolveStatus::Optimal,
                    values,
                    objective_value,
                    message: String::new(),
                }
            }
            Err(err) => {
                let status = match err {
                    ResolutionError::Infeasible => SolveStatus::Infeasible,
                    ResolutionError::Unbounded => SolveStatus::Unbounded,
                    _ => SolveStatus::Error,
                };
                debug!(solver = self.name, elapsed_ms, %status, "backend failed");
                SolverOutcome::failed(status, err.to_string())
            }
        }
    }
}

/// The objective constant is left out; callers evaluate it separately.
fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::with_capacity(expr.terms.len());
    for (var, coef) in expr.merged_terms() {
        out += coef * handles[var.0];
    }
    out
}

fn run<M>(
    mut problem: M,
    rows: Vec<good_lp::Constraint>,
    handles: &[Variable],
) -> Result<Vec<f64>, ResolutionError>
where
    M: SolverModel<Error = ResolutionError>,
{
    for row in rows {
        problem.add_constraint(row);
    }
    let solution = problem.solve()?;
    Ok(handles.iter().map(|&v| solution.value(v)).collect())
}

#[cfg(all(test, feature = "microlp"))]
mod tests {
    use super::*;
    use crate::lp::VariableId;

    fn single_var(relation: Relation, rhs: f64, cost: f64) -> LinearProgram {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x".into(), 0.0, Some(10.0));
        let mut row = LinearExpr::new();
        row.add_term(x, 1.0);
        lp.add_constraint("row".into(), row, relation, rhs);
        lp.objective.add_term(x, cost);
        lp.objective.add_constant(1.0);
        lp
    }

    fn microlp() -> GoodLpSolver {
        GoodLpSolver::new("microlp").expect("microlp compiled in")
    }

    #[test]
    fn finds_lower_bound_optimum() {
        let lp = single_var(Relation::GreaterOrEqual, 3.0, 2.0);
        let out = microlp().solve(&lp, &SolveOptions::default());
        assert_eq!(out.status, SolveStatus::Optimal);
        assert!((out.values[0] - 3.0).abs() < 1e-6);
        assert!((out.objective_value - 7.0).abs() < 1e-6);
    }

    #[test]
    fn reports_infeasible() {
        let lp = single_var(Relation::GreaterOrEqual, 11.0, 1.0);
        let out = microlp().solve(&lp, &SolveOptions::default());
        assert_eq!(out.status, SolveStatus::Infeasible);
        assert!(out.values.is_empty());
    }

    #[test]
    fn violated_constant_row_is_infeasible() {
        let mut lp = LinearProgram::new();
        lp.add_constraint(
            "balance_electricity_0".into(),
            LinearExpr::constant(5.0),
            Relation::Equal,
            0.0,
        );
        let out = microlp().solve(&lp, &SolveOptions::default());
        assert_eq!(out.status, SolveStatus::Infeasible);
        assert!(out.message.contains("balance_electricity_0"));
    }

    #[test]
    fn unbounded_is_not_optimal() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x".into(), 0.0, None);
        lp.objective.add_term(x, -1.0);
        let out = microlp().solve(&lp, &SolveOptions::default());
        assert_ne!(out.status, SolveStatus::Optimal);
    }

    #[test]
    fn repeated_terms_are_merged() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x".into(), 0.0, None);
        let mut row = LinearExpr::new();
        row.add_term(VariableId(0), 1.0);
        row.add_term(x, 1.0);
        lp.add_constraint("twice".into(), row, Relation::GreaterOrEqual, 4.0);
        lp.objective.add_term(x, 1.0);
        let out = microlp().solve(&lp, &SolveOptions::default());
        assert!((out.values[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(GoodLpSolver::new("MicroLP").map(|s| s.name), Some("microlp"));
        assert!(GoodLpSolver::new("cbc").is_none());
    }
}
