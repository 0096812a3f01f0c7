//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};

/// Vollstaendige Agora-Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Audio-Einstellungen
    pub audio: AudioEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Audio-Einstellungen des Servers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Obergrenze fuer den Kapazitaets-Hinweis im Connect-Request;
    /// schuetzt vor Clients, die beliebig grosse Warteschlangen anfordern
    pub max_paket_puffer_kapazitaet: u32,
    /// Warteschlangen-Tiefe wenn der Client keinen Hinweis schickt
    pub standard_paket_puffer_kapazitaet: u32,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            max_paket_puffer_kapazitaet: 256,
            standard_paket_puffer_kapazitaet: 16,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config.validieren()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft die Konfiguration auf zulaessige Werte
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !agora_observability::logging::log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Unbekanntes Log-Level: {}", self.logging.level);
        }
        if !agora_observability::logging::log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Unbekanntes Log-Format: {}", self.logging.format);
        }
        if self.audio.max_paket_puffer_kapazitaet == 0 {
            anyhow::bail!("max_paket_puffer_kapazitaet muss > 0 sein");
        }
        Ok(())
    }

    /// Klemmt den Kapazitaets-Hinweis eines Clients auf das konfigurierte
    /// Maximum; ein Hinweis von 0 faellt auf den Standard zurueck.
    pub fn kapazitaet_klemmen(&self, hinweis: u32) -> usize {
        if hinweis == 0 {
            self.audio.standard_paket_puffer_kapazitaet as usize
        } else {
            hinweis.min(self.audio.max_paket_puffer_kapazitaet) as usize
        }
    }
}
