// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::constants::{AlertDescription, MessageType};
use crate::engine::{SocketState, Trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Equality-comparable summary of how the peer reacted to one vector
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResponseFingerprint {
    pub messages: Vec<MessageType>,
    pub alerts: Vec<AlertDescription>,
    pub socket_state: SocketState,

    /// Coarse response time bucket, only set when timing is part of the comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_bucket: Option<u64>,
}

impl ResponseFingerprint {
    pub fn from_trace(trace: &Trace) -> Self {
        Self {
            messages: trace.received.clone(),
            alerts: trace.alerts.clone(),
            socket_state: trace.socket_state,
            timing_bucket: None,
        }
    }

    /// Include the trace's elapsed time, quantised to `bucket` wide slots
    pub fn with_timing(mut self, elapsed: Duration, bucket: Duration) -> Self {
        if !bucket.is_zero() {
            self.timing_bucket = Some((elapsed.as_nanos() / bucket.as_nanos()) as u64);
        }
        self
    }
}

impl fmt::Display for ResponseFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .messages
            .iter()
            .zip(self.alert_labels())
            .map(|(m, alert)| match alert {
                Some(alert) => format!("ALERT({})", alert),
                None => format!("{:?}", m),
            })
            .collect();
        write!(f, "[{}] {:?}", messages.join(","), self.socket_state)?;
        if let Some(bucket) = self.timing_bucket {
            write!(f, " t{}", bucket)?;
        }
        Ok(())
    }
}

impl ResponseFingerprint {
    fn alert_labels(&self) -> impl Iterator<Item = Option<AlertDescription>> + '_ {
        let mut alerts = self.alerts.iter();
        self.messages.iter().map(move |m| {
            if *m == MessageType::Alert {
                alerts.next().copied()
            } else {
                None
            }
        })
    }
}
