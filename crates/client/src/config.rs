//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist (Audio 16 kHz, kein Video).

use serde::{Deserialize, Serialize};

use agora_core::{AgoraError, VideoTransform};

/// Vollstaendige Agora-Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgoraConfig {
    /// Audio-Einstellungen (SPEEX)
    pub audio: AudioEinstellungen,
    /// Video-Einstellungen (Theora)
    pub video: VideoEinstellungen,
}

/// Audio-Einstellungen des lokalen Clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Encoder-Abtastrate in Hz (8000 / 16000 / 32000)
    pub speex_sample_rate: u32,
    /// Frame-Dauer des Encoders in Samples
    pub speex_frame_groesse: u32,
    /// Tiefe der Jitter-Warteschlange jedes entfernten Clients (Pakete);
    /// reist auch als Kapazitaets-Hinweis im Connect-Request
    pub jitter_puffer_groesse: u32,
    /// Audio-Uebertragung pausiert starten
    pub pause_beim_start: bool,
}

impl Default for AudioEinstellungen {
    fn default() -> Self {
        Self {
            speex_sample_rate: 16_000,
            speex_frame_groesse: 320,
            jitter_puffer_groesse: 16,
            pause_beim_start: false,
        }
    }
}

/// Angefordertes Aufnahmeformat des Videogeraets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFormat {
    pub breite: u32,
    pub hoehe: u32,
}

impl Default for VideoFormat {
    fn default() -> Self {
        Self {
            breite: 640,
            hoehe: 480,
        }
    }
}

/// Video-Einstellungen des lokalen Clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoEinstellungen {
    /// Selektor des Aufnahmegeraets; `None` = kein Video fuer die Sitzung
    pub geraet_name: Option<String>,
    /// Angefordertes Pixel-Format und Abmessungen
    pub format: VideoFormat,
    /// Theora Ziel-Bitrate in bit/s (0 = Qualitaetsmodus)
    pub theora_bitrate: u32,
    /// Theora Qualitaet 0..63
    pub theora_qualitaet: u32,
    /// Theora Keyframe-Abstand in Frames
    pub theora_gop_groesse: u32,
    /// Billboard-Platzierung im lokalen physischen Raum
    pub transform: VideoTransform,
    /// Billboard-Breite und -Hoehe in Videoraum-Einheiten
    pub groesse: [f64; 2],
    /// Video-Uebertragung pausiert starten
    pub pause_beim_start: bool,
}

impl Default for VideoEinstellungen {
    fn default() -> Self {
        Self {
            geraet_name: None,
            format: VideoFormat::default(),
            theora_bitrate: 0,
            theora_qualitaet: 32,
            theora_gop_groesse: 64,
            transform: VideoTransform::identitaet(),
            groesse: [4.0, 3.0],
            pause_beim_start: false,
        }
    }
}

impl AgoraConfig {
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
    pub fn validieren(&self) -> agora_core::Result<()> {
        if ![8_000, 16_000, 32_000].contains(&self.audio.speex_sample_rate) {
            return Err(AgoraError::Konfiguration(format!(
                "Unzulaessige SPEEX-Abtastrate: {} Hz",
                self.audio.speex_sample_rate
            )));
        }
        if self.audio.speex_frame_groesse == 0 {
            return Err(AgoraError::Konfiguration(
                "speex_frame_groesse muss > 0 sein".into(),
            ));
        }
        if self.audio.jitter_puffer_groesse == 0 {
            return Err(AgoraError::Konfiguration(
                "jitter_puffer_groesse muss > 0 sein".into(),
            ));
        }
        if self.video.groesse[0] <= 0.0 || self.video.groesse[1] <= 0.0 {
            return Err(AgoraError::Konfiguration(
                "video.groesse muss positiv sein".into(),
            ));
        }
        Ok(())
    }

    /// Ob diese Konfiguration einen Video-Strom vorsieht
    pub fn video_gewuenscht(&self) -> bool {
        self.video.geraet_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = AgoraConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.audio.speex_sample_rate, 16_000);
        assert_eq!(cfg.audio.jitter_puffer_groesse, 16);
        assert!(!cfg.video_gewuenscht());
    }

    #[test]
    fn unzulaessige_abtastrate_abgelehnt() {
        let mut cfg = AgoraConfig::default();
        cfg.audio.speex_sample_rate = 44_100;
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [audio]
            speex_sample_rate = 8000
            jitter_puffer_groesse = 32

            [video]
            geraet_name = "/dev/video0"
            theora_qualitaet = 48
        "#;
        let cfg: AgoraConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.audio.speex_sample_rate, 8000);
        assert_eq!(cfg.audio.jitter_puffer_groesse, 32);
        assert!(cfg.video_gewuenscht());
        assert_eq!(cfg.video.theora_qualitaet, 48);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.audio.speex_frame_groesse, 320);
        assert_eq!(cfg.video.format, VideoFormat::default());
    }
}
