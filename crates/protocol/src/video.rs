//! Video-Pakete auf dem Draht
//!
//! Ein Video-Paket ist eine opake Bytefolge variabler Laenge mit
//! vorangestellter u32-Laenge. Die einmaligen Theora-Stream-Header werden
//! im Connect-Forward uebertragen, gewoehnliche komprimierte Frames im
//! Server-Update.

use crate::error::{ProtocolError, ProtocolResult};
use crate::pipe::Pipe;

/// Obergrenze fuer ein einzelnes Video-Paket (1 MB)
pub const MAX_PAKET_LAENGE: usize = 1024 * 1024;

/// Ein komprimiertes Video-Paket (opak fuer den Server)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPacket {
    pub daten: Vec<u8>,
}

impl VideoPacket {
    pub fn neu(daten: Vec<u8>) -> Self {
        Self { daten }
    }

    pub fn laenge(&self) -> usize {
        self.daten.len()
    }

    /// Drahtgroesse inklusive Laengenfeld
    pub fn draht_groesse(&self) -> usize {
        4 + self.daten.len()
    }

    /// Liest ein Paket von der Pipe
    pub fn lesen(pipe: &mut dyn Pipe) -> ProtocolResult<Self> {
        let laenge = pipe.read_u32()? as usize;
        if laenge > MAX_PAKET_LAENGE {
            return Err(ProtocolError::PaketZuGross {
                laenge,
                maximum: MAX_PAKET_LAENGE,
            });
        }
        let mut daten = vec![0u8; laenge];
        pipe.read_bytes(&mut daten)?;
        Ok(Self { daten })
    }

    /// Schreibt das Paket auf die Pipe
    pub fn schreiben(&self, pipe: &mut dyn Pipe) -> ProtocolResult<()> {
        pipe.write_u32(self.daten.len() as u32)?;
        pipe.write_bytes(&self.daten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::SpeicherPipe;

    #[test]
    fn paket_round_trip() {
        let paket = VideoPacket::neu(vec![9, 8, 7, 6]);
        let mut pipe = SpeicherPipe::neu();
        paket.schreiben(&mut pipe).unwrap();
        assert_eq!(pipe.laenge(), paket.draht_groesse());
        assert_eq!(VideoPacket::lesen(&mut pipe).unwrap(), paket);
    }

    #[test]
    fn leeres_paket() {
        let paket = VideoPacket::default();
        let mut pipe = SpeicherPipe::neu();
        paket.schreiben(&mut pipe).unwrap();
        assert_eq!(VideoPacket::lesen(&mut pipe).unwrap().laenge(), 0);
    }

    #[test]
    fn ablehnung_zu_grosses_paket() {
        let mut pipe = SpeicherPipe::neu();
        pipe.write_u32(2 * 1024 * 1024).unwrap();
        let fehler = VideoPacket::lesen(&mut pipe);
        assert!(matches!(fehler, Err(ProtocolError::PaketZuGross { .. })));
    }
}
