//! Typisierte Lese- und Schreiboperationen auf der Kollaborations-Pipe
//!
//! Das Host-Framework stellt eine byteorientierte, laengen-gerahmte
//! Verbindung bereit; Agora besitzt nur die Nachrichtenkoerper. Alle
//! Mehrbyte-Ganzzahlen und Skalare stehen in Little-Endian auf dem Draht;
//! die Endian-Umsetzung beider Seiten uebernimmt die Pipe.
//!
//! [`StreamPipe`] bedient beliebige `Read + Write` Transporte,
//! [`SpeicherPipe`] haelt die Bytes in einem `BytesMut` und dient als
//! In-Prozess-Transport fuer Tests und den Server-Tick.

use bytes::{Buf, BufMut, BytesMut};
use std::io::{Read, Write};

use agora_core::{Point, Scalar, VideoTransform};

use crate::error::{ProtocolError, ProtocolResult};

// ---------------------------------------------------------------------------
// Pipe-Trait
// ---------------------------------------------------------------------------

/// Byteorientierte Pipe mit typisierten Zugriffen
///
/// Die Geometrie-Methoden sind ueber den Primitiven vorimplementiert und
/// damit fuer alle Transporte identisch.
pub trait Pipe {
    fn read_u8(&mut self) -> ProtocolResult<u8>;
    fn read_u16(&mut self) -> ProtocolResult<u16>;
    fn read_u32(&mut self) -> ProtocolResult<u32>;
    fn read_skalar(&mut self) -> ProtocolResult<Scalar>;
    fn read_bytes(&mut self, ziel: &mut [u8]) -> ProtocolResult<()>;

    fn write_u8(&mut self, wert: u8) -> ProtocolResult<()>;
    fn write_u16(&mut self, wert: u16) -> ProtocolResult<()>;
    fn write_u32(&mut self, wert: u32) -> ProtocolResult<()>;
    fn write_skalar(&mut self, wert: Scalar) -> ProtocolResult<()>;
    fn write_bytes(&mut self, daten: &[u8]) -> ProtocolResult<()>;

    /// Liest einen Punkt als drei Skalare
    fn read_point(&mut self) -> ProtocolResult<Point> {
        Ok(Point::neu(
            self.read_skalar()?,
            self.read_skalar()?,
            self.read_skalar()?,
        ))
    }

    /// Schreibt einen Punkt als drei Skalare
    fn write_point(&mut self, p: &Point) -> ProtocolResult<()> {
        self.write_skalar(p.x)?;
        self.write_skalar(p.y)?;
        self.write_skalar(p.z)
    }

    /// Liest eine Billboard-Transformation (Translation, Quaternion,
    /// uniforme Skalierung: 8 Skalare)
    fn read_transform(&mut self) -> ProtocolResult<VideoTransform> {
        let translation = self.read_point()?;
        let mut rotation = [0.0; 4];
        for r in rotation.iter_mut() {
            *r = self.read_skalar()?;
        }
        let skalierung = self.read_skalar()?;
        Ok(VideoTransform {
            translation,
            rotation,
            skalierung,
        })
    }

    /// Schreibt eine Billboard-Transformation (8 Skalare)
    fn write_transform(&mut self, t: &VideoTransform) -> ProtocolResult<()> {
        self.write_point(&t.translation)?;
        for r in &t.rotation {
            self.write_skalar(*r)?;
        }
        self.write_skalar(t.skalierung)
    }
}

/// Drahtgroesse eines Skalars in Bytes
pub const SKALAR_GROESSE: usize = std::mem::size_of::<Scalar>();

/// Drahtgroesse einer Billboard-Transformation in Bytes
pub const TRANSFORM_GROESSE: usize = 8 * SKALAR_GROESSE;

// ---------------------------------------------------------------------------
// StreamPipe
// ---------------------------------------------------------------------------

/// Pipe ueber einem blockierenden `Read + Write` Transport
pub struct StreamPipe<S> {
    strom: S,
}

impl<S: Read + Write> StreamPipe<S> {
    pub fn neu(strom: S) -> Self {
        Self { strom }
    }

    /// Gibt den inneren Transport zurueck
    pub fn in_strom(self) -> S {
        self.strom
    }

    fn read_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let mut puffer = [0u8; N];
        self.strom.read_exact(&mut puffer).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::UnerwartetesEnde
            } else {
                ProtocolError::Io(e)
            }
        })?;
        Ok(puffer)
    }
}

impl<S: Read + Write> Pipe for StreamPipe<S> {
    fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> ProtocolResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> ProtocolResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_skalar(&mut self) -> ProtocolResult<Scalar> {
        Ok(Scalar::from_le_bytes(self.read_array()?))
    }

    fn read_bytes(&mut self, ziel: &mut [u8]) -> ProtocolResult<()> {
        self.strom.read_exact(ziel).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::UnerwartetesEnde
            } else {
                ProtocolError::Io(e)
            }
        })
    }

    fn write_u8(&mut self, wert: u8) -> ProtocolResult<()> {
        Ok(self.strom.write_all(&[wert])?)
    }

    fn write_u16(&mut self, wert: u16) -> ProtocolResult<()> {
        Ok(self.strom.write_all(&wert.to_le_bytes())?)
    }

    fn write_u32(&mut self, wert: u32) -> ProtocolResult<()> {
        Ok(self.strom.write_all(&wert.to_le_bytes())?)
    }

    fn write_skalar(&mut self, wert: Scalar) -> ProtocolResult<()> {
        Ok(self.strom.write_all(&wert.to_le_bytes())?)
    }

    fn write_bytes(&mut self, daten: &[u8]) -> ProtocolResult<()> {
        Ok(self.strom.write_all(daten)?)
    }
}

// ---------------------------------------------------------------------------
// SpeicherPipe
// ---------------------------------------------------------------------------

/// In-Speicher-Pipe ueber einem `BytesMut`
///
/// Schreibzugriffe haengen hinten an, Lesezugriffe verbrauchen vorne.
#[derive(Default)]
pub struct SpeicherPipe {
    puffer: BytesMut,
}

impl SpeicherPipe {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl noch nicht gelesener Bytes
    pub fn laenge(&self) -> usize {
        self.puffer.len()
    }

    pub fn ist_leer(&self) -> bool {
        self.puffer.is_empty()
    }

    fn pruefe_rest(&self, benoetigt: usize) -> ProtocolResult<()> {
        if self.puffer.remaining() < benoetigt {
            return Err(ProtocolError::UnerwartetesEnde);
        }
        Ok(())
    }
}

impl Pipe for SpeicherPipe {
    fn read_u8(&mut self) -> ProtocolResult<u8> {
        self.pruefe_rest(1)?;
        Ok(self.puffer.get_u8())
    }

    fn read_u16(&mut self) -> ProtocolResult<u16> {
        self.pruefe_rest(2)?;
        Ok(self.puffer.get_u16_le())
    }

    fn read_u32(&mut self) -> ProtocolResult<u32> {
        self.pruefe_rest(4)?;
        Ok(self.puffer.get_u32_le())
    }

    fn read_skalar(&mut self) -> ProtocolResult<Scalar> {
        self.pruefe_rest(SKALAR_GROESSE)?;
        Ok(self.puffer.get_f64_le())
    }

    fn read_bytes(&mut self, ziel: &mut [u8]) -> ProtocolResult<()> {
        self.pruefe_rest(ziel.len())?;
        self.puffer.copy_to_slice(ziel);
        Ok(())
    }

    fn write_u8(&mut self, wert: u8) -> ProtocolResult<()> {
        self.puffer.put_u8(wert);
        Ok(())
    }

    fn write_u16(&mut self, wert: u16) -> ProtocolResult<()> {
        self.puffer.put_u16_le(wert);
        Ok(())
    }

    fn write_u32(&mut self, wert: u32) -> ProtocolResult<()> {
        self.puffer.put_u32_le(wert);
        Ok(())
    }

    fn write_skalar(&mut self, wert: Scalar) -> ProtocolResult<()> {
        self.puffer.put_f64_le(wert);
        Ok(())
    }

    fn write_bytes(&mut self, daten: &[u8]) -> ProtocolResult<()> {
        self.puffer.put_slice(daten);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speicher_pipe_primitive_round_trip() {
        let mut pipe = SpeicherPipe::neu();
        pipe.write_u8(0xAB).unwrap();
        pipe.write_u16(0x1234).unwrap();
        pipe.write_u32(0xDEADBEEF).unwrap();
        pipe.write_skalar(-2.5).unwrap();
        pipe.write_bytes(&[1, 2, 3]).unwrap();

        assert_eq!(pipe.read_u8().unwrap(), 0xAB);
        assert_eq!(pipe.read_u16().unwrap(), 0x1234);
        assert_eq!(pipe.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(pipe.read_skalar().unwrap(), -2.5);
        let mut drei = [0u8; 3];
        pipe.read_bytes(&mut drei).unwrap();
        assert_eq!(drei, [1, 2, 3]);
        assert!(pipe.ist_leer());
    }

    #[test]
    fn speicher_pipe_unerwartetes_ende() {
        let mut pipe = SpeicherPipe::neu();
        pipe.write_u8(1).unwrap();
        let fehler = pipe.read_u32();
        assert!(matches!(fehler, Err(ProtocolError::UnerwartetesEnde)));
    }

    #[test]
    fn stream_pipe_round_trip() {
        let mut puffer: Vec<u8> = Vec::new();
        {
            let mut pipe = StreamPipe::neu(std::io::Cursor::new(&mut puffer));
            pipe.write_u32(99).unwrap();
            pipe.write_skalar(1.5).unwrap();
        }
        let mut pipe = StreamPipe::neu(std::io::Cursor::new(&mut puffer));
        assert_eq!(pipe.read_u32().unwrap(), 99);
        assert_eq!(pipe.read_skalar().unwrap(), 1.5);
    }

    #[test]
    fn transform_round_trip() {
        let t = VideoTransform {
            translation: Point::neu(1.0, 2.0, 3.0),
            rotation: [0.0, 0.5, 0.5, 0.707],
            skalierung: 2.25,
        };
        let mut pipe = SpeicherPipe::neu();
        pipe.write_transform(&t).unwrap();
        assert_eq!(pipe.laenge(), TRANSFORM_GROESSE);
        assert_eq!(pipe.read_transform().unwrap(), t);
    }
}
