//! Prometheus-kompatible Metriken fuer Agora
//!
//! Registrierte Metriken:
//! - `agora_connected_clients` – Gauge: Aktuell verbundene Clients (Server)
//! - `agora_speex_packets_sent_total` – Counter: Gesendete SPEEX-Pakete
//! - `agora_speex_packets_received_total` – Counter: Empfangene SPEEX-Pakete
//! - `agora_speex_packets_forwarded_total` – Counter: Weitergeleitete SPEEX-Pakete
//! - `agora_video_packets_sent_total` – Counter: Gesendete Video-Pakete
//! - `agora_video_packets_received_total` – Counter: Empfangene Video-Pakete
//! - `agora_video_packets_forwarded_total` – Counter: Weitergeleitete Video-Pakete
//!
//! Jede Instanz traegt ihre eigene Registry; der Export liefert das
//! Prometheus-Textformat. Einen Auslieferungsweg (HTTP o. ae.) stellt
//! das Host-Framework.

use anyhow::Result;
use prometheus::{Counter, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Agora-Prometheus-Metriken
#[derive(Clone)]
pub struct AgoraMetriken {
    pub registry: Arc<Registry>,

    /// Anzahl aktuell verbundener Clients (nur serverseitig gepflegt)
    pub connected_clients: Gauge,

    // Audio-Metriken
    pub speex_packets_sent_total: Counter,
    pub speex_packets_received_total: Counter,
    pub speex_packets_forwarded_total: Counter,

    // Video-Metriken
    pub video_packets_sent_total: Counter,
    pub video_packets_received_total: Counter,
    pub video_packets_forwarded_total: Counter,
}

impl AgoraMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connected_clients = Gauge::with_opts(Opts::new(
            "agora_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let speex_packets_sent_total = Counter::with_opts(Opts::new(
            "agora_speex_packets_sent_total",
            "Gesamtanzahl gesendeter SPEEX-Pakete",
        ))?;
        registry.register(Box::new(speex_packets_sent_total.clone()))?;

        let speex_packets_received_total = Counter::with_opts(Opts::new(
            "agora_speex_packets_received_total",
            "Gesamtanzahl empfangener SPEEX-Pakete",
        ))?;
        registry.register(Box::new(speex_packets_received_total.clone()))?;

        let speex_packets_forwarded_total = Counter::with_opts(Opts::new(
            "agora_speex_packets_forwarded_total",
            "Gesamtanzahl im Fan-out weitergeleiteter SPEEX-Pakete",
        ))?;
        registry.register(Box::new(speex_packets_forwarded_total.clone()))?;

        let video_packets_sent_total = Counter::with_opts(Opts::new(
            "agora_video_packets_sent_total",
            "Gesamtanzahl gesendeter Video-Pakete",
        ))?;
        registry.register(Box::new(video_packets_sent_total.clone()))?;

        let video_packets_received_total = Counter::with_opts(Opts::new(
            "agora_video_packets_received_total",
            "Gesamtanzahl empfangener Video-Pakete",
        ))?;
        registry.register(Box::new(video_packets_received_total.clone()))?;

        let video_packets_forwarded_total = Counter::with_opts(Opts::new(
            "agora_video_packets_forwarded_total",
            "Gesamtanzahl im Fan-out weitergeleiteter Video-Pakete",
        ))?;
        registry.register(Box::new(video_packets_forwarded_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            speex_packets_sent_total,
            speex_packets_received_total,
            speex_packets_forwarded_total,
            video_packets_sent_total,
            video_packets_received_total,
            video_packets_forwarded_total,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
