//! Nachrichtenkoerper des Agora-Unterprotokolls
//!
//! Das Host-Framework rahmt jede Nachricht mit ihrer Laenge; Agora besitzt
//! nur die Koerper. Vier Koerper existieren:
//!
//! - **Connect-Request** (Client -> Server): feste Stream-Parameter plus
//!   Kapazitaets-Hinweis und, bei Video, die Theora-Header und die
//!   virtuelle Videogroesse.
//! - **Connect-Forward** (Server -> Client, einmal pro Quelle): identisch
//!   zum Connect-Request ohne den Kapazitaets-Hinweis.
//! - **Client-Update** (Client -> Server, jeder Tick) und
//!   **Server-Update** (Server -> Client, pro Quelle und Tick): gleiches
//!   Layout, geparst gegen die beim Connect fixierten Stream-Parameter.
//!
//! Der Connect-Request wird gegen die vom Host gemeldete Koerperlaenge
//! geprueft; jede Abweichung ist ein Protokollfehler und verwirft den
//! Verbindungsversuch.

use agora_core::{Point, Scalar, VideoTransform};

use crate::error::{ProtocolError, ProtocolResult};
use crate::pipe::{Pipe, SKALAR_GROESSE};
use crate::video::{VideoPacket, MAX_PAKET_LAENGE};

/// Stabiler Protokollname fuer die Registrierung beim Host-Framework
pub const PROTOKOLL_NAME: &str = "Agora";

/// Agora definiert keine eigenen Nachrichten-IDs; alle Koerper reisen in
/// den Nachrichten des Host-Rahmenprotokolls.
pub const ANZAHL_NACHRICHTEN: u32 = 0;

// ---------------------------------------------------------------------------
// Stream-Parameter
// ---------------------------------------------------------------------------

/// Beim Connect fixierte Parameter eines Quell-Streams
///
/// `speex_frame_groesse == 0` bedeutet: diese Quelle sendet fuer die Dauer
/// der Sitzung kein Audio. `hat_theora == false`: kein Video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParameter {
    /// Samples pro SPEEX-Frame (0 = kein Audio)
    pub speex_frame_groesse: u32,
    /// Bytes pro kodiertem SPEEX-Paket
    pub speex_paket_groesse: u32,
    /// Ob die Quelle einen Theora-Strom sendet
    pub hat_theora: bool,
}

impl StreamParameter {
    pub fn sendet_audio(&self) -> bool {
        self.speex_frame_groesse > 0
    }
}

// ---------------------------------------------------------------------------
// Theora-Ankuendigung
// ---------------------------------------------------------------------------

/// Video-Anteil der Connect-Koerper: die unveraenderlichen Stream-Header
/// und die Billboard-Groesse im Video-Raum
#[derive(Debug, Clone, PartialEq)]
pub struct TheoraAnkuendigung {
    /// Theora-Header-Blob, einmal beim Encoder-Start erzeugt
    pub headers: Vec<u8>,
    /// Breite und Hoehe des Billboards in Videoraum-Einheiten
    pub video_groesse: [Scalar; 2],
}

impl TheoraAnkuendigung {
    fn draht_groesse(&self) -> usize {
        4 + self.headers.len() + 2 * SKALAR_GROESSE
    }

    fn lesen(pipe: &mut dyn Pipe) -> ProtocolResult<Self> {
        let header_laenge = pipe.read_u32()? as usize;
        if header_laenge > MAX_PAKET_LAENGE {
            return Err(ProtocolError::PaketZuGross {
                laenge: header_laenge,
                maximum: MAX_PAKET_LAENGE,
            });
        }
        let mut headers = vec![0u8; header_laenge];
        pipe.read_bytes(&mut headers)?;
        let video_groesse = [pipe.read_skalar()?, pipe.read_skalar()?];
        Ok(Self {
            headers,
            video_groesse,
        })
    }

    fn schreiben(&self, pipe: &mut dyn Pipe) -> ProtocolResult<()> {
        pipe.write_u32(self.headers.len() as u32)?;
        pipe.write_bytes(&self.headers)?;
        pipe.write_skalar(self.video_groesse[0])?;
        pipe.write_skalar(self.video_groesse[1])
    }
}

// ---------------------------------------------------------------------------
// Connect-Request
// ---------------------------------------------------------------------------

/// Connect-Request-Koerper (Client -> Server)
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRequest {
    pub speex_frame_groesse: u32,
    pub speex_paket_groesse: u32,
    /// Gewuenschte Tiefe der serverseitigen Paket-Warteschlange; der
    /// Server klemmt den Wert auf sein konfiguriertes Maximum.
    pub speex_paket_puffer_kapazitaet: u32,
    pub theora: Option<TheoraAnkuendigung>,
}

impl ConnectRequest {
    /// Drahtgroesse des Koerpers in Bytes
    pub fn draht_groesse(&self) -> usize {
        let mut groesse = 3 * 4 + 1;
        if let Some(theora) = &self.theora {
            groesse += theora.draht_groesse();
        }
        groesse
    }

    /// Liest den Koerper und prueft ihn gegen die vom Host gemeldete
    /// Koerperlaenge.
    ///
    /// Jede Abweichung zwischen angekuendigten und gelesenen Bytes ist ein
    /// Protokollfehler; der Verbindungsversuch ist zu verwerfen.
    pub fn lesen(pipe: &mut dyn Pipe, nachrichten_laenge: usize) -> ProtocolResult<Self> {
        let speex_frame_groesse = pipe.read_u32()?;
        let speex_paket_groesse = pipe.read_u32()?;
        let speex_paket_puffer_kapazitaet = pipe.read_u32()?;
        let hat_theora = pipe.read_u8()? != 0;
        let mut gelesen = 3 * 4 + 1;

        let theora = if hat_theora {
            let ankuendigung = TheoraAnkuendigung::lesen(pipe)?;
            gelesen += ankuendigung.draht_groesse();
            Some(ankuendigung)
        } else {
            None
        };

        if gelesen != nachrichten_laenge {
            return Err(ProtocolError::LaengenKonflikt {
                erwartet: nachrichten_laenge,
                gelesen,
            });
        }

        Ok(Self {
            speex_frame_groesse,
            speex_paket_groesse,
            speex_paket_puffer_kapazitaet,
            theora,
        })
    }

    pub fn schreiben(&self, pipe: &mut dyn Pipe) -> ProtocolResult<()> {
        pipe.write_u32(self.speex_frame_groesse)?;
        pipe.write_u32(self.speex_paket_groesse)?;
        pipe.write_u32(self.speex_paket_puffer_kapazitaet)?;
        match &self.theora {
            Some(theora) => {
                pipe.write_u8(1)?;
                theora.schreiben(pipe)
            }
            None => pipe.write_u8(0),
        }
    }

    pub fn parameter(&self) -> StreamParameter {
        StreamParameter {
            speex_frame_groesse: self.speex_frame_groesse,
            speex_paket_groesse: self.speex_paket_groesse,
            hat_theora: self.theora.is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// Connect-Forward
// ---------------------------------------------------------------------------

/// Connect-Forward-Koerper (Server -> Ziel-Client, einmal pro Quelle)
///
/// Wird gesendet sobald das Ziel von der Existenz der Quelle erfaehrt –
/// auch wenn das Ziel der Spaeteinsteiger ist. Ein Spaeteinsteiger erhaelt
/// so die vollstaendigen Theora-Header vor dem ersten Video-Paket.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectForward {
    pub speex_frame_groesse: u32,
    pub speex_paket_groesse: u32,
    pub theora: Option<TheoraAnkuendigung>,
}

impl ConnectForward {
    pub fn lesen(pipe: &mut dyn Pipe) -> ProtocolResult<Self> {
        let speex_frame_groesse = pipe.read_u32()?;
        let speex_paket_groesse = pipe.read_u32()?;
        let theora = if pipe.read_u8()? != 0 {
            Some(TheoraAnkuendigung::lesen(pipe)?)
        } else {
            None
        };
        Ok(Self {
            speex_frame_groesse,
            speex_paket_groesse,
            theora,
        })
    }

    pub fn schreiben(&self, pipe: &mut dyn Pipe) -> ProtocolResult<()> {
        pipe.write_u32(self.speex_frame_groesse)?;
        pipe.write_u32(self.speex_paket_groesse)?;
        match &self.theora {
            Some(theora) => {
                pipe.write_u8(1)?;
                theora.schreiben(pipe)
            }
            None => pipe.write_u8(0),
        }
    }

    pub fn parameter(&self) -> StreamParameter {
        StreamParameter {
            speex_frame_groesse: self.speex_frame_groesse,
            speex_paket_groesse: self.speex_paket_groesse,
            hat_theora: self.theora.is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// Update-Koerper
// ---------------------------------------------------------------------------

/// Audio-Anteil eines Update-Koerpers
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpdate {
    /// SPEEX-Pakete in Senderreihenfolge, jedes exakt
    /// `speex_paket_groesse` Bytes
    pub pakete: Vec<Vec<u8>>,
    /// Aktuelle Kopfposition des Senders im Navigationsraum
    pub kopf_position: Point,
}

/// Video-Anteil eines Update-Koerpers
#[derive(Debug, Clone, PartialEq)]
pub struct VideoUpdate {
    /// Hoechstens ein neues Paket pro Tick; `None` wenn der Encoder in
    /// diesem Tick nichts geliefert hat
    pub paket: Option<VideoPacket>,
    /// Aktuelle Billboard-Transformation des Senders
    pub transform: VideoTransform,
}

/// Client-Update und Server-Update teilen dieses Layout; geparst wird
/// gegen die Stream-Parameter der Quelle.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateNachricht {
    pub audio: Option<AudioUpdate>,
    pub video: Option<VideoUpdate>,
}

impl UpdateNachricht {
    /// Liest einen Update-Koerper anhand der fixierten Stream-Parameter
    pub fn lesen(pipe: &mut dyn Pipe, parameter: &StreamParameter) -> ProtocolResult<Self> {
        let audio = if parameter.sendet_audio() {
            let anzahl = pipe.read_u16()? as usize;
            let paket_groesse = parameter.speex_paket_groesse as usize;
            let mut pakete = Vec::with_capacity(anzahl);
            for _ in 0..anzahl {
                let mut paket = vec![0u8; paket_groesse];
                pipe.read_bytes(&mut paket)?;
                pakete.push(paket);
            }
            let kopf_position = pipe.read_point()?;
            Some(AudioUpdate {
                pakete,
                kopf_position,
            })
        } else {
            None
        };

        let video = if parameter.hat_theora {
            let paket = if pipe.read_u8()? != 0 {
                Some(VideoPacket::lesen(pipe)?)
            } else {
                None
            };
            let transform = pipe.read_transform()?;
            Some(VideoUpdate { paket, transform })
        } else {
            None
        };

        Ok(Self { audio, video })
    }

    /// Schreibt einen Update-Koerper; die Anteile muessen zu den
    /// Stream-Parametern der Quelle passen.
    pub fn schreiben(
        &self,
        pipe: &mut dyn Pipe,
        parameter: &StreamParameter,
    ) -> ProtocolResult<()> {
        if parameter.sendet_audio() != self.audio.is_some()
            || parameter.hat_theora != self.video.is_some()
        {
            return Err(ProtocolError::UngueltigeNachricht(
                "Update passt nicht zu den Stream-Parametern".into(),
            ));
        }

        if let Some(audio) = &self.audio {
            pipe.write_u16(audio.pakete.len() as u16)?;
            for paket in &audio.pakete {
                if paket.len() != parameter.speex_paket_groesse as usize {
                    return Err(ProtocolError::UngueltigeNachricht(format!(
                        "SPEEX-Paket hat {} Bytes, erwartet {}",
                        paket.len(),
                        parameter.speex_paket_groesse
                    )));
                }
                pipe.write_bytes(paket)?;
            }
            pipe.write_point(&audio.kopf_position)?;
        }

        if let Some(video) = &self.video {
            match &video.paket {
                Some(paket) => {
                    pipe.write_u8(1)?;
                    paket.schreiben(pipe)?;
                }
                None => pipe.write_u8(0)?,
            }
            pipe.write_transform(&video.transform)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
