//! SPEEX Encoder/Decoder Schnittstelle
//!
//! Die eigentlichen Codec-Bibliotheken liegen ausserhalb dieses Repos;
//! hier stehen die Transformationen Frame-rein / Paket-raus als Traits.
//! Ein Encoder meldet beim Start seine Frame-Groesse (Samples pro Frame)
//! und seine Paket-Groesse (Bytes pro kodiertem Paket); beide sind fuer
//! die Dauer der Sitzung fix – Pakete sind durch ihre feste Groesse
//! selbstbegrenzt und tragen keine Zeitstempel auf dem Draht.

use crate::error::{AudioError, AudioResult};

/// Zulaessige SPEEX-Abtastraten in Hz
pub const ZULAESSIGE_SAMPLE_RATES: [u32; 3] = [8_000, 16_000, 32_000];

/// Konfiguration des SPEEX-Encoders
#[derive(Debug, Clone)]
pub struct SpeexConfig {
    /// Abtastrate in Hz (8000 / 16000 / 32000)
    pub sample_rate: u32,
    /// Frame-Dauer in Samples
    pub frame_groesse: u32,
}

impl Default for SpeexConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_groesse: 320,
        }
    }
}

impl SpeexConfig {
    /// Prueft die Konfiguration auf zulaessige Werte
    pub fn validieren(&self) -> AudioResult<()> {
        if !ZULAESSIGE_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(AudioError::Konfiguration(format!(
                "Unzulaessige Abtastrate: {} Hz",
                self.sample_rate
            )));
        }
        if self.frame_groesse == 0 {
            return Err(AudioError::Konfiguration(
                "Frame-Groesse muss > 0 sein".into(),
            ));
        }
        Ok(())
    }
}

/// SPEEX-Encoder: kodiert einen i16-PCM-Frame in ein Paket fester Groesse
pub trait SpeexEncoder: Send {
    /// Samples pro Frame
    fn frame_groesse(&self) -> usize;

    /// Bytes pro kodiertem Paket
    fn paket_groesse(&self) -> usize;

    /// Kodiert genau `frame_groesse()` Samples in genau
    /// `paket_groesse()` Paket-Bytes
    fn encode(&mut self, pcm: &[i16], paket: &mut [u8]) -> AudioResult<()>;
}

/// SPEEX-Decoder: dekodiert ein Paket fester Groesse in einen PCM-Frame
///
/// Muss mit den beim Connect uebermittelten Groessen des Senders
/// konstruiert werden.
pub trait SpeexDecoder: Send {
    /// Samples pro Frame
    fn frame_groesse(&self) -> usize;

    /// Bytes pro kodiertem Paket
    fn paket_groesse(&self) -> usize;

    /// Dekodiert genau `paket_groesse()` Paket-Bytes in genau
    /// `frame_groesse()` Samples
    fn decode(&mut self, paket: &[u8], pcm: &mut [i16]) -> AudioResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let config = SpeexConfig::default();
        assert!(config.validieren().is_ok());
        assert_eq!(config.sample_rate, 16_000);
    }

    #[test]
    fn unzulaessige_abtastrate() {
        let config = SpeexConfig {
            sample_rate: 44_100,
            frame_groesse: 320,
        };
        assert!(config.validieren().is_err());
    }

    #[test]
    fn leere_frame_groesse() {
        let config = SpeexConfig {
            sample_rate: 16_000,
            frame_groesse: 0,
        };
        assert!(config.validieren().is_err());
    }
}
