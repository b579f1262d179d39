use crate::error::PayloadError;
use chrono::Local;
use serde_json::Value;
use std::collections::VecDeque;

pub const CHART_WINDOW: usize = 12;
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub label: String,
    pub cpu: f64,
    pub ram: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartMetrics {
    pub cpu_percent: f64,
    pub ram_percent: f64,
}

/// Rolling window of CPU/RAM samples.
///
/// Labels, CPU values and RAM values are kept as three parallel sequences
/// that are only ever pushed or popped together, so index `i` of each one
/// always describes the same sample.
#[derive(Clone, Debug)]
pub struct TimeSeriesBuffer {
    capacity: usize,
    labels: VecDeque<String>,
    cpu: VecDeque<f64>,
    ram: VecDeque<f64>,
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::with_capacity(CHART_WINDOW)
    }
}

impl TimeSeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            labels: VecDeque::with_capacity(capacity + 1),
            cpu: VecDeque::with_capacity(capacity + 1),
            ram: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Appends a sample stamped with the local wall clock (second precision).
    pub fn append(&mut self, cpu: f64, ram: f64) {
        self.append_labeled(time_label(), cpu, ram);
    }

    pub fn append_labeled(&mut self, label: impl Into<String>, cpu: f64, ram: f64) {
        self.labels.push_back(label.into());
        self.cpu.push_back(cpu);
        self.ram.push_back(ram);
        while self.labels.len() > self.capacity {
            self.labels.pop_front();
            self.cpu.pop_front();
            self.ram.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<Sample> {
        let last = self.len().checked_sub(1)?;
        Some(Sample {
            label: self.labels[last].clone(),
            cpu: self.cpu[last],
            ram: self.ram[last],
        })
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            labels: self.labels.iter().cloned().collect(),
            cpu: self.cpu.iter().copied().collect(),
            ram: self.ram.iter().copied().collect(),
        }
    }
}

/// Immutable copy of the buffer handed to the chart renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartSnapshot {
    pub labels: Vec<String>,
    pub cpu: Vec<f64>,
    pub ram: Vec<f64>,
}

impl ChartSnapshot {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn cpu_points(&self) -> Vec<(f64, f64)> {
        indexed_points(&self.cpu)
    }

    pub fn ram_points(&self) -> Vec<(f64, f64)> {
        indexed_points(&self.ram)
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.labels
            .iter()
            .zip(self.cpu.iter().zip(self.ram.iter()))
            .map(|(label, (cpu, ram))| Sample {
                label: label.clone(),
                cpu: *cpu,
                ram: *ram,
            })
            .collect()
    }
}

fn indexed_points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| (idx as f64, *value))
        .collect()
}

pub fn time_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Parses one chart-metrics event. Both percentages must be present and
/// numeric, otherwise the whole sample is rejected.
pub fn parse_chart_metrics(data: &str) -> Result<ChartMetrics, PayloadError> {
    let value: Value = serde_json::from_str(data)?;
    let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
    let cpu_percent = percent_field(object, "cpu_percent")?;
    let ram_percent = percent_field(object, "ram_percent")?;
    Ok(ChartMetrics {
        cpu_percent,
        ram_percent,
    })
}

fn percent_field(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<f64, PayloadError> {
    let raw = object.get(field).ok_or(PayloadError::MissingField(field))?;
    let value = raw.as_f64().ok_or_else(|| PayloadError::InvalidField {
        field,
        reason: format!("expected number, got {raw}"),
    })?;
    if !value.is_finite() {
        return Err(PayloadError::InvalidField {
            field,
            reason: "not a finite number".to_string(),
        });
    }
    Ok(value.clamp(PERCENT_MIN, PERCENT_MAX))
}
