// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Information Leak Tests
 * Side-channel oracle detection: sampling, escalation and significance
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod statistics;

pub use statistics::{ChiSquareResult, ContingencyTable, SIGNIFICANCE_LEVEL};

use crate::fingerprint::ResponseFingerprint;
use crate::vector::{Vector, VectorResponse};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

/// Samples per discriminator value in the first round
pub const ITERATIONS_PER_HANDSHAKE: usize = 3;

/// Extra samples per discriminator value once answers differ
pub const ADDITIONAL_ITERATIONS: usize = 97;

/// Identifies what a leak test was run against
pub trait TestInfo: Debug + Clone + Send + Sync {
    /// Stable machine-readable name
    fn technical_name(&self) -> String;

    fn printable_name(&self) -> String {
        self.technical_name()
    }
}

/// Responses to one family of vectors, with the statistics over them
#[derive(Debug, Clone)]
pub struct InformationLeakTest<T: TestInfo, V: Vector> {
    info: T,
    responses: Vec<VectorResponse<V>>,
}

impl<T: TestInfo, V: Vector> InformationLeakTest<T, V> {
    pub fn new(info: T, responses: Vec<VectorResponse<V>>) -> Self {
        Self { info, responses }
    }

    pub fn info(&self) -> &T {
        &self.info
    }

    pub fn responses(&self) -> &[VectorResponse<V>] {
        &self.responses
    }

    pub fn extend_with(&mut self, responses: Vec<VectorResponse<V>>) {
        self.responses.extend(responses);
    }

    /// Successful samples
    pub fn sample_count(&self) -> usize {
        self.responses.iter().filter(|r| !r.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_failed()).count()
    }

    pub fn distinct_fingerprints(&self) -> Vec<&ResponseFingerprint> {
        let mut distinct: Vec<&ResponseFingerprint> = Vec::new();
        for fingerprint in self.responses.iter().filter_map(|r| r.fingerprint.as_ref()) {
            if !distinct.contains(&fingerprint) {
                distinct.push(fingerprint);
            }
        }
        distinct
    }

    /// More than one distinct fingerprint among the samples
    pub fn is_distinct_answers(&self) -> bool {
        self.distinct_fingerprints().len() > 1
    }

    pub fn contingency_table(&self) -> ContingencyTable {
        ContingencyTable::from_responses(&self.responses)
    }

    pub fn chi_square(&self) -> Option<ChiSquareResult> {
        self.contingency_table().chi_square()
    }

    pub fn p_value(&self) -> Option<f64> {
        self.chi_square().map(|r| r.p_value)
    }

    /// Responses depend on the discriminator at the configured significance level
    pub fn is_significant_distinct_answers(&self) -> bool {
        self.chi_square().is_some_and(|r| r.is_significant())
    }

    pub fn summary(&self) -> LeakTestSummary {
        LeakTestSummary {
            test: self.info.technical_name(),
            samples: self.sample_count(),
            failed_samples: self.failed_count(),
            distinct_fingerprints: self
                .distinct_fingerprints()
                .into_iter()
                .map(|f| f.to_string())
                .collect(),
            p_value: self.p_value(),
            significant: self.is_significant_distinct_answers(),
        }
    }
}

/// Serializable outcome of one leak test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakTestSummary {
    pub test: String,
    pub samples: usize,
    pub failed_samples: usize,
    pub distinct_fingerprints: Vec<String>,
    pub p_value: Option<f64>,
    pub significant: bool,
}

/// Samples per discriminator value for the two sampling rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    pub initial_per_value: usize,
    pub additional_per_value: usize,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            initial_per_value: ITERATIONS_PER_HANDSHAKE,
            additional_per_value: ADDITIONAL_ITERATIONS,
        }
    }
}

/// Run the initial round and, if answers differ, one escalation round
///
/// `collect(n)` must return `n` samples for every discriminator value.
pub async fn collect_with_escalation<T, V, F, Fut>(
    info: T,
    plan: SamplingPlan,
    mut collect: F,
) -> InformationLeakTest<T, V>
where
    T: TestInfo,
    V: Vector,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Vec<VectorResponse<V>>>,
{
    let initial = collect(plan.initial_per_value).await;
    let mut test = InformationLeakTest::new(info, initial);

    if test.is_distinct_answers() && plan.additional_per_value > 0 {
        debug!(
            test = %test.info().technical_name(),
            samples = test.sample_count(),
            additional_per_value = plan.additional_per_value,
            "Distinct answers, extending leak test"
        );
        let additional = collect(plan.additional_per_value).await;
        test.extend_with(additional);
    }

    test
}
