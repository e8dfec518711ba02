//! Solver configuration, loadable from TOML.

use serde::Deserialize;
use crate::{
    error::{ Error, Result },
    hilbert::SubSpace,
};

/// Default cap on the number of terms held by a single expansion.
pub const DEFAULT_MAX_TERMS: usize = 200_000;

/// Guard on the number of terms an expansion may produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TermBudget {
    pub limit: usize,
}

impl Default for TermBudget {
    fn default() -> Self { Self { limit: DEFAULT_MAX_TERMS } }
}

impl TermBudget {
    pub fn new(limit: usize) -> Self { Self { limit } }

    /// Fail with [`Error::BudgetExceeded`] if `terms` exceeds the limit.
    pub fn check(&self, terms: usize) -> Result<()> {
        if terms > self.limit {
            Err(Error::BudgetExceeded { terms, limit: self.limit })
        } else {
            Ok(())
        }
    }
}

/// Policy for unknowns left undetermined by a consistent generator equation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreeUnknowns {
    /// Pin free unknowns to zero.
    #[default]
    Zero,
    /// Treat free unknowns as a solve failure.
    Reject,
}

/// A `{ name, dim }` entry fixing the position of a subspace in the Kronecker
/// ordering.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubSpaceSpec {
    pub name: String,
    pub dim: usize,
}

impl SubSpaceSpec {
    pub fn new(name: &str, dim: usize) -> Self {
        Self { name: name.to_string(), dim }
    }
}

impl From<&SubSpace> for SubSpaceSpec {
    fn from(sub: &SubSpace) -> Self { Self::new(sub.name(), sub.dim()) }
}

/// Configuration for [`Solver`][crate::solver::Solver].
///
/// ```toml
/// order = 2
/// free_unknowns = "zero"
/// max_terms = 200000
/// subspaces = [
///     { name = "spin", dim = 2 },
///     { name = "charge", dim = 3 },
/// ]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Truncation order; must be at least 1.
    pub order: u32,
    /// Explicit Kronecker ordering of the finite subspaces.
    pub subspaces: Option<Vec<SubSpaceSpec>>,
    pub free_unknowns: FreeUnknowns,
    pub max_terms: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            order: 2,
            subspaces: None,
            free_unknowns: FreeUnknowns::Zero,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

impl SolverConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(Error::Config("order must be at least 1".to_string()));
        }
        if self.max_terms == 0 {
            return Err(Error::Config("max_terms must be positive".to_string()));
        }
        if let Some(specs) = &self.subspaces {
            for (k, spec) in specs.iter().enumerate() {
                if spec.dim == 0 {
                    return Err(Error::Config(
                        format!("subspace `{}` has dimension 0", spec.name)));
                }
                if specs[..k].iter().any(|prev| prev.name == spec.name) {
                    return Err(Error::Config(
                        format!("subspace `{}` is listed more than once", spec.name)));
                }
            }
        }
        Ok(())
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_subspaces<I>(mut self, subspaces: I) -> Self
    where I: IntoIterator<Item = SubSpaceSpec>
    {
        self.subspaces = Some(subspaces.into_iter().collect());
        self
    }

    pub fn with_free_unknowns(mut self, free_unknowns: FreeUnknowns) -> Self {
        self.free_unknowns = free_unknowns;
        self
    }

    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms;
        self
    }

    pub fn budget(&self) -> TermBudget { TermBudget::new(self.max_terms) }

    /// Order the subspaces found in a Hamiltonian according to the
    /// configured list.
    ///
    /// Without a configured list, `found` is returned as is. A configured
    /// entry whose dimension differs from the Hamiltonian's is a
    /// [`Error::DimensionMismatch`]; a subspace in the Hamiltonian missing
    /// from the list is an [`Error::Structural`].
    pub fn resolve_subspaces(&self, found: &[SubSpace]) -> Result<Vec<SubSpace>> {
        let Some(specs) = &self.subspaces else { return Ok(found.to_vec()); };
        for sub in found.iter() {
            match specs.iter().find(|spec| spec.name == sub.name()) {
                None => {
                    return Err(Error::Structural(
                        format!("subspace `{}` is not listed in the configuration", sub)));
                },
                Some(spec) if spec.dim != sub.dim() => {
                    return Err(Error::DimensionMismatch {
                        what: "configured subspace".to_string(),
                        subspace: sub.name().to_string(),
                        expected: sub.dim(),
                        found: (spec.dim, spec.dim),
                    });
                },
                Some(_) => { },
            }
        }
        Ok(specs.iter().map(|spec| SubSpace::new(&spec.name, spec.dim)).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_toml() {
        let config = SolverConfig::from_toml_str(r#"
            order = 3
            free_unknowns = "reject"
            subspaces = [
                { name = "spin", dim = 2 },
                { name = "charge", dim = 3 },
            ]
        "#).unwrap();
        assert_eq!(config.order, 3);
        assert_eq!(config.free_unknowns, FreeUnknowns::Reject);
        assert_eq!(config.max_terms, DEFAULT_MAX_TERMS);
        assert_eq!(config.subspaces.as_ref().unwrap()[1], SubSpaceSpec::new("charge", 3));
    }

    #[test]
    fn defaults_from_empty_toml() {
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn reject_bad_config() {
        assert!(matches!(
            SolverConfig::from_toml_str("order = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SolverConfig::from_toml_str("orders = 2"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SolverConfig::from_toml_str(r#"free_unknowns = "maybe""#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn subspace_resolution() {
        let found = vec![SubSpace::new("b", 3), SubSpace::new("a", 2)];
        let config = SolverConfig::default()
            .with_subspaces([SubSpaceSpec::new("a", 2), SubSpaceSpec::new("b", 3)]);
        let ordered = config.resolve_subspaces(&found).unwrap();
        assert_eq!(ordered, vec![SubSpace::new("a", 2), SubSpace::new("b", 3)]);

        let wrong_dim = SolverConfig::default()
            .with_subspaces([SubSpaceSpec::new("a", 2), SubSpaceSpec::new("b", 4)]);
        assert!(matches!(
            wrong_dim.resolve_subspaces(&found),
            Err(Error::DimensionMismatch { .. })
        ));

        let missing = SolverConfig::default()
            .with_subspaces([SubSpaceSpec::new("a", 2)]);
        assert!(matches!(missing.resolve_subspaces(&found), Err(Error::Structural(_))));

        assert_eq!(SolverConfig::default().resolve_subspaces(&found).unwrap(), found);
    }

    #[test]
    fn budget() {
        let budget = TermBudget::new(10);
        assert!(budget.check(10).is_ok());
        assert!(matches!(
            budget.check(11),
            Err(Error::BudgetExceeded { terms: 11, limit: 10 })
        ));
    }
}
