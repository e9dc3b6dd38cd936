use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated over one layout run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayoutMetrics {
    folders: u64,
    buildings: u64,
    tiers: u64,
    connectors: u64,
    crossings: u64,
    region_probes: u64,
    warnings: u64,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_folder(&mut self) {
        self.folders = self.folders.saturating_add(1);
    }

    pub fn record_building(&mut self, tier_count: usize) {
        self.buildings = self.buildings.saturating_add(1);
        self.tiers = self.tiers.saturating_add(tier_count as u64);
    }

    pub fn record_connector(&mut self, crossings: usize) {
        self.connectors = self.connectors.saturating_add(1);
        self.crossings = self.crossings.saturating_add(crossings as u64);
    }

    pub fn record_region_probes(&mut self, probes: usize) {
        if probes > 0 {
            self.region_probes = self.region_probes.saturating_add(probes as u64);
        }
    }

    pub fn record_warnings(&mut self, count: usize) {
        self.warnings = self.warnings.saturating_add(count as u64);
    }

    pub fn snapshot(&self, elapsed: Duration) -> MetricSnapshot {
        MetricSnapshot {
            elapsed_us: elapsed.as_micros() as u64,
            folders: self.folders,
            buildings: self.buildings,
            tiers: self.tiers,
            connectors: self.connectors,
            crossings: self.crossings,
            region_probes: self.region_probes,
            warnings: self.warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub elapsed_us: u64,
    pub folders: u64,
    pub buildings: u64,
    pub tiers: u64,
    pub connectors: u64,
    pub crossings: u64,
    pub region_probes: u64,
    pub warnings: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("elapsed_us".to_string(), json!(self.elapsed_us));
        map.insert("folders".to_string(), json!(self.folders));
        map.insert("buildings".to_string(), json!(self.buildings));
        map.insert("tiers".to_string(), json!(self.tiers));
        map.insert("connectors".to_string(), json!(self.connectors));
        map.insert("crossings".to_string(), json!(self.crossings));
        map.insert("region_probes".to_string(), json!(self.region_probes));
        map.insert("warnings".to_string(), json!(self.warnings));
        map
    }
}
