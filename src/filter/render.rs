//! Filter rendering.
//!
//! `Display` for [`Filter`] produces canonical filter text. Parenthesized
//! groups from the source are rendered as written; for trees built by hand,
//! parentheses are inserted wherever precedence would otherwise regroup the
//! operands, so the output always reparses to an equivalent filter.

use super::ast::Filter;
use std::fmt;

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_ATOM: u8 = 4;

fn precedence(filter: &Filter) -> u8 {
    match filter {
        Filter::Or(..) => PREC_OR,
        Filter::And(..) => PREC_AND,
        Filter::Not(_) => PREC_NOT,
        Filter::Paren(_)
        | Filter::Presence(_)
        | Filter::Compare(..)
        | Filter::ValuePath(..) => PREC_ATOM,
    }
}

/// Render `filter`, wrapping it in parentheses when its precedence is below `min`.
fn write_operand(f: &mut fmt::Formatter<'_>, filter: &Filter, min: u8) -> fmt::Result {
    if precedence(filter) < min {
        write!(f, "({})", filter)
    } else {
        write!(f, "{}", filter)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Or(left, right) => {
                write_operand(f, left, PREC_OR)?;
                f.write_str(" or ")?;
                write_operand(f, right, PREC_OR + 1)
            }
            Filter::And(left, right) => {
                write_operand(f, left, PREC_AND)?;
                f.write_str(" and ")?;
                write_operand(f, right, PREC_AND + 1)
            }
            Filter::Not(inner) => {
                f.write_str("not ")?;
                // `not` only takes a primary, so a nested `not` needs parentheses too.
                write_operand(f, inner, PREC_ATOM)
            }
            Filter::Paren(inner) => write!(f, "({})", inner),
            Filter::Presence(path) => write!(f, "{} pr", path),
            Filter::Compare(path, op, value) => write!(f, "{} {} {}", path, op, value),
            Filter::ValuePath(path, inner) => write!(f, "{}[{}]", path, inner),
        }
    }
}
