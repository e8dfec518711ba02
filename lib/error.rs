//! Error types for classification, expansion and the perturbative solver.

use std::fmt;
use thiserror::Error;

/// Reasons the generator equations of a given order could not be solved.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolveFailure {
    /// An equation reduced to a non-zero constant.
    #[error("equation {equation} is inconsistent")]
    Inconsistent { equation: String },

    /// The system left unknowns free and free unknowns were rejected.
    #[error("unknowns left undetermined: {}", .unknowns.join(", "))]
    Underdetermined { unknowns: Vec<String> },

    /// An equation is not linear in the unknowns.
    #[error("equation {equation} is not linear in the unknowns")]
    Nonlinear { equation: String },
}

/// Solver step at which a failure occurred.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Classify,
    Ansatz,
    Equation,
    Solve,
    Substitute,
    Correction,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Classify => "classification",
            Self::Ansatz => "ansatz construction",
            Self::Equation => "equation assembly",
            Self::Solve => "generator solve",
            Self::Substitute => "generator substitution",
            Self::Correction => "BCH correction",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// An operator, symbol or subspace is missing something it needs.
    #[error("structural error: {0}")]
    Structural(String),

    /// A matrix does not match the dimension of its subspace.
    #[error(
        "dimension mismatch: {what} has shape {found:?} but subspace `{subspace}` \
        has dimension {expected}"
    )]
    DimensionMismatch {
        what: String,
        subspace: String,
        expected: usize,
        found: (usize, usize),
    },

    /// A power with a negative or non-integer exponent.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("no solution for the generator equations: {0}")]
    Solve(#[from] SolveFailure),

    #[error("the Hamiltonian has no order-0 diagonal component")]
    MissingOrderZero,

    #[error("expansion exceeded the term budget ({terms} > {limit} terms)")]
    BudgetExceeded { terms: usize, limit: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Wraps a failure with the solver order and step that produced it.
    #[error("order {order}, {step}: {source}")]
    AtOrder {
        order: u32,
        step: Step,
        #[source]
        source: Box<Error>,
    },
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self { Self::Config(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach solver order/step context to a failure.
pub(crate) trait AtOrder<T> {
    fn at(self, order: u32, step: Step) -> Result<T>;
}

impl<T, E> AtOrder<T> for std::result::Result<T, E>
where E: Into<Error>
{
    fn at(self, order: u32, step: Step) -> Result<T> {
        self.map_err(|err| {
            Error::AtOrder { order, step, source: Box::new(err.into()) }
        })
    }
}
