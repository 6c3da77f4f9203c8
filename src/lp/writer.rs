//! CPLEX LP-format rendering of a [`LinearProgram`], written before solving in debug runs.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use super::{LinearExpr, LinearProgram};

/// Variable standing in for the objective constant; fixed to 1 in `Bounds`.
pub const ONE_VAR_CONSTANT: &str = "ONE_VAR_CONSTANT";

/// Terms per output line before wrapping.
const TERMS_PER_LINE: usize = 8;

/// Renders `program` as LP text.
///
/// # Examples
///
/// ```
/// use esys_opt::lp::{LinearExpr, LinearProgram, Relation, writer::render_lp};
///
/// let mut lp = LinearProgram::new();
/// let x = lp.add_variable("x".into(), 0.0, Some(5.0));
/// let mut row = LinearExpr::new();
/// row.add_term(x, 1.0);
/// lp.add_constraint("cap".into(), row, Relation::LessOrEqual, 3.0);
/// lp.objective.add_term(x, 2.0);
///
/// let text = render_lp(&lp);
/// assert!(text.starts_with("\\* "));
/// assert!(text.contains("cap:"));
/// assert!(text.contains("0 <= x <= 5"));
/// ```
pub fn render_lp(program: &LinearProgram) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\\* esys-opt linear program *\\");
    let _ = writeln!(out);
    let _ = writeln!(out, "min");
    let _ = write!(out, "objective:");
    write_expr(&mut out, program, &program.objective);
    if program.objective.constant != 0.0 {
        let _ = write!(
            out,
            " {} {ONE_VAR_CONSTANT}",
            signed(program.objective.constant)
        );
    }
    if program.objective.is_constant() && program.objective.constant == 0.0 {
        let _ = write!(out, " 0 {ONE_VAR_CONSTANT}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out);
    let _ = writeln!(out, "s.t.");
    for c in &program.constraints {
        let _ = write!(out, "{}:", sanitize(&c.name));
        if c.lhs.is_constant() {
            let _ = write!(out, " 0 {ONE_VAR_CONSTANT}");
        } else {
            write_expr(&mut out, program, &c.lhs);
        }
        let _ = writeln!(out, " {} {}", c.relation, c.effective_rhs());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "bounds");
    for v in &program.variables {
        let name = sanitize(&v.name);
        match v.upper {
            Some(upper) => {
                let _ = writeln!(out, "   {} <= {name} <= {upper}", v.lower);
            }
            None if v.lower == 0.0 => {}
            None => {
                let _ = writeln!(out, "   {name} >= {}", v.lower);
            }
        }
    }
    let _ = writeln!(out, "   {ONE_VAR_CONSTANT} = 1");
    let _ = writeln!(out, "end");
    out
}

/// Writes the LP text to `path`, creating parent directories.
///
/// # Errors
///
/// Returns any I/O error from directory creation or the write itself.
pub fn write_lp(program: &LinearProgram, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_lp(program))
}

fn write_expr(out: &mut String, program: &LinearProgram, expr: &LinearExpr) {
    for (i, (var, coef)) in expr.merged_terms().into_iter().enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            out.push_str("\n   ");
        }
        let _ = write!(
            out,
            " {} {}",
            signed(coef),
            sanitize(&program.variable(var).name)
        );
    }
}

fn signed(value: f64) -> String {
    if value < 0.0 {
        format!("-{}", -value)
    } else {
        format!("+{value}")
    }
}

/// LP names may not contain spaces or most operators.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::Relation;

    #[test]
    fn constant_objective_uses_one_var() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("flow_pv_electricity_0".into(), 0.0, None);
        lp.objective.add_term(x, 3.0);
        lp.objective.add_constant(150.0);
        let text = render_lp(&lp);
        assert!(text.contains("+3 flow_pv_electricity_0 +150 ONE_VAR_CONSTANT"));
        assert!(text.contains("ONE_VAR_CONSTANT = 1"));
        // lower bound 0 without upper is the LP default
        assert!(!text.contains("flow_pv_electricity_0 >="));
    }

    #[test]
    fn row_constant_moves_to_rhs() {
        let mut lp = LinearProgram::new();
        let x = lp.add_variable("x".into(), 0.0, None);
        let mut row = LinearExpr::constant(5.0);
        row.add_term(x, -1.0);
        lp.add_constraint("balance electricity 0".into(), row, Relation::Equal, 0.0);
        let text = render_lp(&lp);
        assert!(text.contains("balance_electricity_0: -1 x = -5"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("esys-opt-lp-{}", std::process::id()));
        let path = dir.join("nested").join("model.lp");
        let lp = LinearProgram::new();
        assert!(write_lp(&lp, &path).is_ok());
        assert!(path.exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
