// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::fingerprint::ResponseFingerprint;
use std::fmt::Debug;

/// One variant of a crafted message
///
/// `name` is the discriminator: repeated samples of the same variant must
/// report the same name.
pub trait Vector: Debug + Clone + Send + Sync + 'static {
    fn name(&self) -> String;
}

/// A vector together with the peer's reaction to it
#[derive(Debug, Clone)]
pub struct VectorResponse<V: Vector> {
    pub vector: V,

    /// `None` when the task carrying the vector failed
    pub fingerprint: Option<ResponseFingerprint>,
}

impl<V: Vector> VectorResponse<V> {
    pub fn new(vector: V, fingerprint: Option<ResponseFingerprint>) -> Self {
        Self { vector, fingerprint }
    }

    pub fn is_failed(&self) -> bool {
        self.fingerprint.is_none()
    }
}
