//! Solver-independent description of a linear program.
//!
//! The model builder emits a [`LinearProgram`]; solver backends translate it
//! into their own representation, and [`writer`] renders it as an LP file.

pub mod writer;

use std::fmt;

/// Position of a variable inside its [`LinearProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub usize);

/// A continuous decision variable with simple bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    /// `None` means unbounded above.
    pub upper: Option<f64>,
}

/// `Σ coefficient × variable + constant`.
///
/// Terms are kept in insertion order; repeated variables are merged by
/// backends and the LP writer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    pub terms: Vec<(VariableId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn add_term(&mut self, var: VariableId, coefficient: f64) {
        if coefficient != 0.0 {
            self.terms.push((var, coefficient));
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression against a full primal solution.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    /// Terms with repeated variables merged, sorted by variable, zeros dropped.
    pub fn merged_terms(&self) -> Vec<(VariableId, f64)> {
        let mut terms = self.terms.clone();
        terms.sort_by_key(|(var, _)| *var);
        let mut merged: Vec<(VariableId, f64)> = Vec::with_capacity(terms.len());
        for (var, coef) in terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == var => *acc += coef,
                _ => merged.push((var, coef)),
            }
        }
        merged.retain(|(_, coef)| *coef != 0.0);
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "=",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
        })
    }
}

/// `lhs relation rhs`, where any constant in `lhs` is moved across by the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub lhs: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    /// Right-hand side after moving the constant part of `lhs` across.
    pub fn effective_rhs(&self) -> f64 {
        self.rhs - self.lhs.constant
    }

    /// Whether the row holds for `values` within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.relation {
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
            Relation::LessOrEqual => lhs <= self.rhs + tolerance,
            Relation::GreaterOrEqual => lhs >= self.rhs - tolerance,
        }
    }
}

/// Minimisation problem over continuous variables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearProgram {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: LinearExpr,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: String, lower: f64, upper: Option<f64>) -> VariableId {
        let id = VariableId(self.variables.len());
        self.variables.push(Variable { name, lower, upper });
        id
    }

    pub fn add_constraint(&mut self, name: String, lhs: LinearExpr, relation: Relation, rhs: f64) {
        self.constraints.push(Constraint {
            name,
            lhs,
            relation,
            rhs,
        });
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_terms_combine_and_drop_zeros() {
        let mut e = LinearExpr::new();
        e.add_term(VariableId(2), 1.0);
        e.add_term(VariableId(0), 3.0);
        e.add_term(VariableId(2), -1.0);
        assert_eq!(e.merged_terms(), vec![(VariableId(0), 3.0)]);
    }

    #[test]
    fn constraint_moves_constant_across() {
        let mut lhs = LinearExpr::constant(4.0);
        lhs.add_term(VariableId(0), 1.0);
        let c = Constraint {
            name: "c".into(),
            lhs,
            relation: Relation::Equal,
            rhs: 10.0,
        };
        assert_eq!(c.effective_rhs(), 6.0);
        assert!(c.is_satisfied(&[6.0], 1e-9));
        assert!(!c.is_satisfied(&[5.0], 1e-9));
    }

    #[test]
    fn evaluate_includes_constant() {
        let mut e = LinearExpr::constant(1.5);
        e.add_term(VariableId(1), 2.0);
        assert_eq!(e.evaluate(&[100.0, 3.0]), 7.5);
    }
}
