//! Expression service for reliability formulas and presence conditions.
//!
//! Reliability formulas produced by a parametric model checker are plain
//! algebraic text (`0.99*D + 0.01`), and presence conditions are Boolean
//! formulas over feature names (`A && !B`). Both are handled by the same
//! small language: Booleans are represented as `0.0`/`1.0`, so a presence
//! condition can be evaluated as an algebraic expression over feature
//! indicator variables.
//!
//! The crate offers three things:
//!
//! - [`tokenize`] and [`substitute`] for token-level rewriting of formula
//!   text (whole identifiers only, never substrings),
//! - [`Expression`] for parsing and numeric evaluation against a variable
//!   interpretation,
//! - [`round_half_up`] and [`format_decimal`] for the fixed-precision
//!   probability literals written into state models.

pub mod error;
pub mod expression;
pub mod lexer;
pub mod number;
pub mod substitute;

pub use error::{ExprError, Result};
pub use expression::{BinaryOp, Expression, Instruction, UnaryOp};
pub use lexer::{tokenize, Token, TokenKind};
pub use number::{format_decimal, round_half_up};
pub use substitute::{identifiers, substitute, substitute_reporting};
