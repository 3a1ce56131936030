use serde::{Deserialize, Serialize};

/// Target weight of one fund inside a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundAllocation {
    /// Fund identifier, e.g. "110020".
    pub code: String,

    /// Relative weight. Weights need not sum to 100; they are normalised
    /// over the funds that actually have data when a simulation runs.
    pub weight: f64,
}

impl FundAllocation {
    pub fn new(code: impl Into<String>, weight: f64) -> Self {
        Self {
            code: code.into().trim().to_string(),
            weight,
        }
    }
}

/// A named, weighted fund allocation ("Portfolio A" / "Portfolio B").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub name: String,
    pub allocations: Vec<FundAllocation>,
}

impl PortfolioConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allocations: Vec::new(),
        }
    }

    /// Builder-style helper: append an allocation.
    #[must_use]
    pub fn with_fund(mut self, code: impl Into<String>, weight: f64) -> Self {
        self.allocations.push(FundAllocation::new(code, weight));
        self
    }

    pub fn total_weight(&self) -> f64 {
        self.allocations.iter().map(|a| a.weight).sum()
    }

    /// Codes in declaration order, duplicates removed.
    pub fn codes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for a in &self.allocations {
            if !out.contains(&a.code.as_str()) {
                out.push(&a.code);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}
