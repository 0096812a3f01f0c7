//! Theora Encoder/Decoder Schnittstelle
//!
//! Die Codec-Bibliothek liegt ausserhalb dieses Repos; hier stehen die
//! Transformationen als Traits plus der unkomprimierte Y'CbCr 4:2:0
//! Frame. Der Encoder erzeugt bei seiner Initialisierung einmalig den
//! Header-Blob, den jeder Decoder vor dem ersten Frame benoetigt; der
//! Blob reist ausschliesslich in den Connect-Nachrichten.

use agora_protocol::VideoPacket;

use crate::error::{VideoError, VideoResult};

// ---------------------------------------------------------------------------
// TheoraFrame
// ---------------------------------------------------------------------------

/// Unkomprimierter Frame in Y'CbCr 4:2:0 Planarform
///
/// Die Luma-Ebene hat volle Aufloesung, beide Chroma-Ebenen sind in
/// beiden Richtungen halbiert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TheoraFrame {
    pub breite: u32,
    pub hoehe: u32,
    pub y: Vec<u8>,
    pub cb: Vec<u8>,
    pub cr: Vec<u8>,
}

impl TheoraFrame {
    /// Erstellt einen schwarzen Frame der gegebenen Abmessungen.
    ///
    /// # Panics
    /// Wenn Breite oder Hoehe ungerade sind (4:2:0 verlangt gerade Masse).
    pub fn leer(breite: u32, hoehe: u32) -> Self {
        assert!(
            breite % 2 == 0 && hoehe % 2 == 0,
            "4:2:0 verlangt gerade Abmessungen"
        );
        let luma = (breite * hoehe) as usize;
        let chroma = luma / 4;
        Self {
            breite,
            hoehe,
            y: vec![16; luma],
            cb: vec![128; chroma],
            cr: vec![128; chroma],
        }
    }

    /// Prueft ob die Ebenen zu den Abmessungen passen
    pub fn ist_konsistent(&self) -> bool {
        let luma = (self.breite * self.hoehe) as usize;
        self.y.len() == luma && self.cb.len() == luma / 4 && self.cr.len() == luma / 4
    }
}

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Encoder-Abstimmung; `bitrate == 0` schaltet auf reine Qualitaetsregelung
#[derive(Debug, Clone)]
pub struct TheoraConfig {
    pub breite: u32,
    pub hoehe: u32,
    /// Ziel-Bitrate in bit/s (0 = Qualitaetsmodus)
    pub bitrate: u32,
    /// Qualitaet 0..63 (nur im Qualitaetsmodus)
    pub qualitaet: u32,
    /// Keyframe-Abstand in Frames
    pub gop_groesse: u32,
}

impl Default for TheoraConfig {
    fn default() -> Self {
        Self {
            breite: 640,
            hoehe: 480,
            bitrate: 0,
            qualitaet: 32,
            gop_groesse: 64,
        }
    }
}

impl TheoraConfig {
    pub fn validieren(&self) -> VideoResult<()> {
        if self.breite == 0 || self.hoehe == 0 {
            return Err(VideoError::Konfiguration(
                "Abmessungen muessen > 0 sein".into(),
            ));
        }
        if self.breite % 2 != 0 || self.hoehe % 2 != 0 {
            return Err(VideoError::Konfiguration(
                "4:2:0 verlangt gerade Abmessungen".into(),
            ));
        }
        if self.qualitaet > 63 {
            return Err(VideoError::Konfiguration(format!(
                "Qualitaet {} ausserhalb 0..63",
                self.qualitaet
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Codec-Traits
// ---------------------------------------------------------------------------

/// Theora-Encoder: roher Frame rein, null oder mehr Pakete raus
///
/// Keyframe-Politik (Intra-Abstand) ist Sache des Encoders selbst.
pub trait TheoraEncoder: Send {
    /// Der bei der Initialisierung erzeugte Header-Blob
    fn headers(&self) -> &[u8];

    /// Kodiert einen Frame; liefert alle dabei fertiggestellten Pakete
    fn encode(&mut self, frame: &TheoraFrame) -> VideoResult<Vec<VideoPacket>>;
}

/// Theora-Decoder: Paket rein, null oder ein Frame raus
///
/// Wird mit dem Header-Blob des Senders konstruiert.
pub trait TheoraDecoder: Send {
    fn decode(&mut self, paket: &VideoPacket) -> VideoResult<Option<TheoraFrame>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leerer_frame_ist_konsistent() {
        let frame = TheoraFrame::leer(64, 48);
        assert!(frame.ist_konsistent());
        assert_eq!(frame.y.len(), 64 * 48);
        assert_eq!(frame.cb.len(), 64 * 48 / 4);
    }

    #[test]
    #[should_panic(expected = "gerade Abmessungen")]
    fn ungerade_abmessungen_panik() {
        TheoraFrame::leer(63, 48);
    }

    #[test]
    fn config_validierung() {
        assert!(TheoraConfig::default().validieren().is_ok());
        let schlecht = TheoraConfig {
            qualitaet: 99,
            ..TheoraConfig::default()
        };
        assert!(schlecht.validieren().is_err());
    }
}
