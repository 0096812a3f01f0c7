//! Fehlertypen fuer die Video-Strecke

use thiserror::Error;

/// Alle moeglichen Fehler der Video-Strecke
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video-Geraet nicht gefunden: {0}")]
    GeraetNichtGefunden(String),

    #[error("Stream-Fehler: {0}")]
    StreamFehler(String),

    #[error("Codec-Fehler: {0}")]
    CodecFehler(String),

    #[error("Ungueltiges Frame-Format: {0}")]
    FrameFormat(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

pub type VideoResult<T> = Result<T, VideoError>;
