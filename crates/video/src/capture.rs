//! Video-Capture-Schnittstelle
//!
//! Das Aufnahmegeraet arbeitet im Push-Modus: sein Treiber-Thread ruft
//! fuer jeden rohen Frame den registrierten Callback. Der Extraktor
//! wandelt das Geraeteformat nach Y'CbCr 4:2:0; beide Implementierungen
//! stellt der Host ueber die Medienfabrik.

use crate::codec::TheoraFrame;
use crate::error::VideoResult;

/// Pixelformat eines rohen Kamera-Frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Gepacktes YUV 4:2:2 (2 Bytes pro Pixel)
    Yuyv,
    /// 24-bit RGB (3 Bytes pro Pixel)
    Rgb24,
}

/// Roher Frame aus dem Aufnahmegeraet
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub breite: u32,
    pub hoehe: u32,
    pub format: PixelFormat,
    pub daten: Vec<u8>,
}

/// Extraktor: Geraeteformat -> Y'CbCr 4:2:0
pub trait BildExtraktor: Send {
    fn extrahiere(&mut self, roh: &FrameBuffer, ziel: &mut TheoraFrame) -> VideoResult<()>;
}

/// Push-Modus-Aufnahmegeraet
///
/// `starten` registriert den Frame-Callback und beginnt die Aufnahme;
/// der Callback laeuft auf dem Treiber-Thread des Geraets. Drop stoppt
/// die Aufnahme.
pub trait VideoQuelle: Send {
    /// Abmessungen der gelieferten Frames
    fn format(&self) -> (u32, u32);

    /// Startet die Aufnahme mit dem gegebenen Callback
    fn starten(&mut self, callback: Box<dyn FnMut(&FrameBuffer) + Send>) -> VideoResult<()>;

    /// Stoppt die Aufnahme
    fn stoppen(&mut self);
}
