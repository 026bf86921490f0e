use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::filing::Outcome;
use crate::{Error, Result};

lazy_static! {
    pub static ref ALARMS_PROCESSED_TOTAL: IntCounter = IntCounter::new(
        "alarm_bridge_alarms_processed_total",
        "Total number of alarm records processed."
    )
    .expect("metric definition is valid");
    pub static ref OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "alarm_bridge_outcomes_total",
            "Alarm records by filing outcome."
        ),
        &["outcome"]
    )
    .expect("metric definition is valid");
    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        registry
            .register(Box::new(ALARMS_PROCESSED_TOTAL.clone()))
            .expect("ALARMS_PROCESSED_TOTAL registers once");
        registry
            .register(Box::new(OUTCOMES_TOTAL.clone()))
            .expect("OUTCOMES_TOTAL registers once");
        registry
    };
}

pub fn record_outcome(outcome: &Outcome) {
    ALARMS_PROCESSED_TOTAL.inc();
    OUTCOMES_TOTAL.with_label_values(&[outcome.label()]).inc();
}

// Function to gather metrics for exposition
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| Error::Internal(format!("Failed to convert metrics to string: {}", e)))
}
