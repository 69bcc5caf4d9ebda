// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Oracle Statistics
 * Contingency tables of discriminator value vs. response fingerprint and
 * Pearson's chi-square test of independence
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::fingerprint::ResponseFingerprint;
use crate::vector::{Vector, VectorResponse};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::BTreeMap;

/// Significance level for declaring an oracle
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Observed counts: one row per discriminator value, one column per distinct fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingencyTable {
    rows: Vec<String>,
    columns: Vec<ResponseFingerprint>,
    counts: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
}

impl ChiSquareResult {
    pub fn is_significant(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

impl ContingencyTable {
    /// Build from responses; failed samples are not counted
    pub fn from_responses<V: Vector>(responses: &[VectorResponse<V>]) -> Self {
        let mut cells: BTreeMap<String, BTreeMap<ResponseFingerprint, u64>> = BTreeMap::new();
        let mut columns: Vec<ResponseFingerprint> = Vec::new();

        for response in responses {
            let Some(fingerprint) = &response.fingerprint else {
                continue;
            };
            if !columns.contains(fingerprint) {
                columns.push(fingerprint.clone());
            }
            *cells
                .entry(response.vector.name())
                .or_default()
                .entry(fingerprint.clone())
                .or_default() += 1;
        }
        columns.sort();

        let rows: Vec<String> = cells.keys().cloned().collect();
        let counts = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| cells.get(row).and_then(|c| c.get(column)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self { rows, columns, counts }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[ResponseFingerprint] {
        &self.columns
    }

    pub fn count(&self, row: usize, column: usize) -> u64 {
        self.counts
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Pearson's chi-square; `None` for degenerate tables (fewer than two rows or columns)
    pub fn chi_square(&self) -> Option<ChiSquareResult> {
        if self.rows.len() < 2 || self.columns.len() < 2 {
            return None;
        }

        let total = self.total() as f64;
        let row_totals: Vec<f64> = self
            .counts
            .iter()
            .map(|row| row.iter().sum::<u64>() as f64)
            .collect();
        let column_totals: Vec<f64> = (0..self.columns.len())
            .map(|c| self.counts.iter().map(|row| row[c]).sum::<u64>() as f64)
            .collect();

        let mut statistic = 0.0;
        for (r, row) in self.counts.iter().enumerate() {
            for (c, observed) in row.iter().enumerate() {
                let expected = row_totals[r] * column_totals[c] / total;
                if expected > 0.0 {
                    let diff = *observed as f64 - expected;
                    statistic += diff * diff / expected;
                }
            }
        }

        let degrees_of_freedom = (self.rows.len() - 1) * (self.columns.len() - 1);
        let distribution = ChiSquared::new(degrees_of_freedom as f64).ok()?;
        let p_value = (1.0 - distribution.cdf(statistic)).clamp(0.0, 1.0);

        Some(ChiSquareResult {
            statistic,
            degrees_of_freedom,
            p_value,
        })
    }
}
