#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Order-truncated Schrieffer-Wolff transformations of operator-valued
//! Hamiltonians built from finite-dimensional matrix operators and bosonic
//! ladder operators.

pub mod scalar;
pub mod error;
pub mod config;
pub mod hilbert;
pub mod nd_utils;
pub mod expr;
pub mod algebra;
pub mod decompose;
pub mod classify;
pub mod expansion;
pub mod linsolve;
pub mod ansatz;
pub mod solver;
mod proptests;

pub use error::{ Error, Result, SolveFailure, Step };
pub use config::SolverConfig;
pub use hilbert::{ ProductSpace, SubSpace };
pub use expr::Expr;
pub use solver::{ solve, EffectiveHamiltonian, Solver };
