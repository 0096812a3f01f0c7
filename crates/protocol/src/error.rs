//! Fehlertypen fuer das Agora-Drahtformat

use thiserror::Error;

/// Alle moeglichen Fehler beim Lesen und Schreiben von Nachrichtenkoerpern
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unerwartetes Nachrichtenende")]
    UnerwartetesEnde,

    #[error("Laengen-Konflikt: {erwartet} Bytes angekuendigt, {gelesen} gelesen")]
    LaengenKonflikt { erwartet: usize, gelesen: usize },

    #[error("Paket zu gross: {laenge} Bytes (Maximum: {maximum} Bytes)")]
    PaketZuGross { laenge: usize, maximum: usize },

    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
