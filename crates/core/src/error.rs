//! Fehlertypen fuer Agora
//!
//! Zentraler Fehler-Enum der alle moeglichen Fehlerzustaende abdeckt.
//! Untermodule definieren eigene Fehler und konvertieren via `#[from]`
//! oder ueber die String-Varianten.

use thiserror::Error;

/// Globaler Result-Alias fuer Agora
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Alle moeglichen Fehler im Agora-System
#[derive(Debug, Error)]
pub enum AgoraError {
    // --- Verbindung & Protokoll ---
    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    // --- Medien ---
    #[error("Audiofehler: {0}")]
    Audio(String),

    #[error("Videofehler: {0}")]
    Video(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AgoraError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler die Verbindung beenden muss
    ///
    /// Auf der Medienebene ist Verlust dem Blockieren vorzuziehen; nur
    /// Abweichungen vom Rahmenformat sind fatal fuer die Verbindung.
    pub fn ist_fatal(&self) -> bool {
        matches!(
            self,
            Self::Protokoll(_) | Self::Verbindung(_) | Self::Getrennt(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = AgoraError::Protokoll("Laengen-Konflikt".into());
        assert_eq!(e.to_string(), "Protokollfehler: Laengen-Konflikt");
    }

    #[test]
    fn fatal_erkennung() {
        assert!(AgoraError::Protokoll("x".into()).ist_fatal());
        assert!(!AgoraError::Audio("Paket verworfen".into()).ist_fatal());
    }
}
