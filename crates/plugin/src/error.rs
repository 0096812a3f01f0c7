//! Fehlertypen der Plugin-Schnittstelle

use agora_core::ClientId;
use agora_protocol::ProtocolError;
use thiserror::Error;

/// Fehler die ein Protokoll-Plugin an das Host-Framework meldet
#[derive(Debug, Error)]
pub enum PluginError {
    /// Abweichung vom Drahtformat; fatal fuer die Verbindung,
    /// nie fuer den Prozess
    #[error(transparent)]
    Protokoll(#[from] ProtocolError),

    /// Ein per-Client-Hook traf auf eine ID ohne Zustandseintrag
    #[error("Unbekannter Client: {0}")]
    UnbekannterClient(ClientId),

    #[error("Protokoll bereits registriert: {0}")]
    BereitsRegistriert(String),

    #[error("Verbindung abgelehnt: {0}")]
    VerbindungAbgelehnt(String),

    #[error("Geraet nicht verfuegbar: {0}")]
    Geraet(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

/// Result-Alias fuer die Plugin-Schnittstelle
pub type PluginResult<T> = Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige_unbekannter_client() {
        let e = PluginError::UnbekannterClient(ClientId(3));
        assert_eq!(e.to_string(), "Unbekannter Client: client:3");
    }

    #[test]
    fn protokollfehler_konvertierung() {
        let e: PluginError = ProtocolError::UnerwartetesEnde.into();
        assert!(e.to_string().contains("Nachrichtenende"));
    }
}
