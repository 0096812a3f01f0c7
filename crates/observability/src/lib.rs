//! agora-observability – Logging-Setup und Prometheus-Metriken
//!
//! Die Instrumentierung ist vom Transport getrennt: dieses Crate haelt
//! Registry, Zaehler und Text-Export; wo der Host die Werte ausliefert
//! (HTTP, Log, Dialog) ist seine Sache.

pub mod logging;
pub mod metrics;

pub use metrics::AgoraMetriken;
