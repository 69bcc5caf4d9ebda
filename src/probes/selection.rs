// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::types::TestResult;
use std::fmt::Debug;
use std::future::Future;
use tracing::{debug, warn};

/// Answer to one round of offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Offer<T> {
    /// The peer picked this value
    Selected(T),
    /// The peer answered without picking any offered value
    Declined,
    /// The task gave up, nothing is known about this round
    Failed,
}

impl<T> From<Option<T>> for Offer<T> {
    fn from(selected: Option<T>) -> Self {
        match selected {
            Some(value) => Offer::Selected(value),
            None => Offer::Declined,
        }
    }
}

/// Values found by elimination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration<T> {
    pub supported: Vec<T>,

    /// A failed task ended the search before the peer declined
    pub interrupted: bool,
}

impl<T> Enumeration<T> {
    pub fn is_complete(&self) -> bool {
        !self.interrupted
    }

    /// `FALSE` only holds for a finished search
    pub fn verdict(&self, found: bool) -> TestResult {
        settle(found, self.is_complete())
    }
}

/// A negative answer from an unfinished search is `UNCERTAIN`
pub fn settle(found: bool, complete: bool) -> TestResult {
    match (found, complete) {
        (true, _) => TestResult::True,
        (false, true) => TestResult::False,
        (false, false) => TestResult::Uncertain,
    }
}

/// Enumerate supported values by repeatedly offering the remaining candidates
///
/// Each round offers everything not yet selected and removes the peer's
/// choice. Stops when the peer declines, a task fails, the candidates run
/// out, or the peer picks something that was not offered.
pub async fn enumerate_by_elimination<T, F, Fut>(label: &str, candidates: Vec<T>, mut offer: F) -> Enumeration<T>
where
    T: Clone + PartialEq + Debug,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Offer<T>>,
{
    let mut remaining = candidates;
    let mut supported = Vec::new();
    let mut interrupted = false;

    while !remaining.is_empty() {
        let selected = match offer(remaining.clone()).await {
            Offer::Selected(selected) => selected,
            Offer::Declined => break,
            Offer::Failed => {
                warn!(
                    probe = label,
                    found = supported.len(),
                    remaining = remaining.len(),
                    "Task failed, enumeration incomplete"
                );
                interrupted = true;
                break;
            }
        };

        if !remaining.contains(&selected) {
            warn!(
                probe = label,
                selected = ?selected,
                "Peer selected a value that was not offered"
            );
            break;
        }

        debug!(probe = label, selected = ?selected, "Peer selected");
        remaining.retain(|candidate| candidate != &selected);
        supported.push(selected);
    }

    Enumeration { supported, interrupted }
}
