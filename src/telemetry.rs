// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Monitoring points produced by the merge engine.

use std::sync::{Arc, Mutex};

use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorValue {
    Int(i64),
    Float(f64),
}

impl std::fmt::Display for MonitorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorValue::Int(i) => write!(f, "{i}"),
            MonitorValue::Float(x) => write!(f, "{x:.2}"),
        }
    }
}

/// Something that accepts named monitoring points.
pub trait TelemetrySink: Send {
    fn submit(&mut self, name: &str, value: MonitorValue);

    /// Mark a point as no longer valid, e.g. because the process is shutting
    /// down.
    fn invalidate(&mut self, name: &str);
}

/// Writes every point to the log.
#[derive(Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn submit(&mut self, name: &str, value: MonitorValue) {
        debug!("{name} = {value}");
    }

    fn invalidate(&mut self, name: &str) {
        info!("{name} invalidated");
    }
}

/// Keeps every point in memory. Clones share the same record, so a test can
/// hand one clone to an engine and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    points: Arc<Mutex<Vec<(String, Option<MonitorValue>)>>>,
}

impl RecordingTelemetry {
    pub fn new() -> RecordingTelemetry {
        RecordingTelemetry::default()
    }

    /// Every point submitted so far, in order. `None` is an invalidation.
    pub fn points(&self) -> Vec<(String, Option<MonitorValue>)> {
        self.points
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent value of `name`.
    pub fn latest(&self, name: &str) -> Option<Option<MonitorValue>> {
        self.points
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    fn push(&mut self, name: &str, value: Option<MonitorValue>) {
        self.points
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((name.to_string(), value));
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn submit(&mut self, name: &str, value: MonitorValue) {
        self.push(name, Some(value));
    }

    fn invalidate(&mut self, name: &str) {
        self.push(name, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_telemetry_is_shared_between_clones() {
        let recorder = RecordingTelemetry::new();
        let mut sink: Box<dyn TelemetrySink> = Box::new(recorder.clone());
        sink.submit("A", MonitorValue::Int(3));
        sink.submit("B", MonitorValue::Float(1.5));
        sink.submit("A", MonitorValue::Int(4));
        sink.invalidate("B");

        assert_eq!(recorder.points().len(), 4);
        assert_eq!(recorder.latest("A"), Some(Some(MonitorValue::Int(4))));
        assert_eq!(recorder.latest("B"), Some(None));
        assert_eq!(recorder.latest("C"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(MonitorValue::Int(17).to_string(), "17");
        assert_eq!(MonitorValue::Float(17.0).to_string(), "17.00");
    }
}
