//! Theora Encoder-Pumpe
//!
//! Capture und Kodierung laufen entkoppelt: der Geraete-Callback
//! extrahiert jeden rohen Frame nach Y'CbCr 4:2:0 und veroeffentlicht
//! ihn im Frame-Triple-Buffer (Geraeterate); der Client-Update-Tick
//! holt, falls vorhanden, den neuesten Frame, fuettert den Encoder und
//! behaelt nur das juengste Paket im Ausgangs-Triple-Buffer (Tick-Rate).
//! Ueberzaehlige Frames fallen am Triple-Buffer weg – der neueste
//! gewinnt.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use agora_buffers::{TripleBuffer, TripleConsumer, TripleProducer};
use agora_protocol::VideoPacket;

use crate::capture::{BildExtraktor, VideoQuelle};
use crate::codec::{TheoraEncoder, TheoraFrame};
use crate::error::VideoResult;

/// Encoder-Pumpe: Geraete-Callback -> Frame-Slot -> Theora -> Paket-Slot
pub struct VideoEncoderPumpe {
    /// Tick-Seite des Frame-Slots
    frame_eingang: Mutex<TripleConsumer<TheoraFrame>>,
    encoder: Mutex<Box<dyn TheoraEncoder>>,
    /// Beim Encoder-Start eingefangener Header-Blob
    headers: Vec<u8>,
    paket_ausgang: Mutex<TripleProducer<VideoPacket>>,
    paket_entnahme: Mutex<TripleConsumer<VideoPacket>>,
    pausiert: Arc<AtomicBool>,
    codec_fehler: AtomicU64,
    /// Haelt das Geraet am Leben; Drop stoppt die Aufnahme
    _quelle: Box<dyn VideoQuelle>,
}

impl VideoEncoderPumpe {
    /// Oeffnet die Pumpe: startet das Geraet mit dem Extraktions-Callback
    /// und faengt die Encoder-Header ein.
    pub fn starten(
        mut quelle: Box<dyn VideoQuelle>,
        mut extraktor: Box<dyn BildExtraktor>,
        encoder: Box<dyn TheoraEncoder>,
        pausiert_beim_start: bool,
    ) -> VideoResult<Self> {
        let (breite, hoehe) = quelle.format();
        let (mut frame_tx, frame_rx) = TripleBuffer::neu(TheoraFrame::leer(breite, hoehe));
        let (paket_tx, paket_rx) = TripleBuffer::neu(VideoPacket::default());

        let pausiert = Arc::new(AtomicBool::new(pausiert_beim_start));
        let headers = encoder.headers().to_vec();

        // Callback auf dem Treiber-Thread: extrahieren und veroeffentlichen
        let pausiert_cb = Arc::clone(&pausiert);
        quelle.starten(Box::new(move |roh| {
            if pausiert_cb.load(Ordering::Acquire) {
                return;
            }
            match extraktor.extrahiere(roh, frame_tx.naechster_wert()) {
                Ok(()) => frame_tx.veroeffentlichen(),
                Err(e) => warn!("Frame-Extraktion fehlgeschlagen: {}", e),
            }
        }))?;

        debug!(breite, hoehe, header_bytes = headers.len(), "Video-Pumpe gestartet");

        Ok(Self {
            frame_eingang: Mutex::new(frame_rx),
            encoder: Mutex::new(encoder),
            headers,
            paket_ausgang: Mutex::new(paket_tx),
            paket_entnahme: Mutex::new(paket_rx),
            pausiert,
            codec_fehler: AtomicU64::new(0),
            _quelle: quelle,
        })
    }

    /// Der beim Encoder-Start erzeugte Header-Blob; reist nur im
    /// Connect-Request
    pub fn headers(&self) -> &[u8] {
        &self.headers
    }

    /// Tick-Seite: kodiert den neuesten Frame, falls einer ansteht.
    ///
    /// Der Encoder darf pro Frame mehrere Pakete liefern; nur das
    /// juengste bleibt fuer den naechsten Client-Update erhalten.
    pub fn tick(&self) {
        let mut frame_eingang = self.frame_eingang.lock();
        if !frame_eingang.neuer_wert() {
            return;
        }
        match self.encoder.lock().encode(frame_eingang.aktueller_wert()) {
            Ok(pakete) => {
                if let Some(paket) = pakete.into_iter().last() {
                    self.paket_ausgang.lock().schreiben(paket);
                }
            }
            Err(e) => {
                // Einzelner Frame faellt aus, der Strom laeuft weiter
                self.codec_fehler.fetch_add(1, Ordering::Relaxed);
                warn!("Theora-Encode fehlgeschlagen: {}", e);
            }
        }
    }

    /// Entnimmt das seit dem letzten Aufruf erzeugte Paket, falls eines
    /// veroeffentlicht wurde
    pub fn neues_paket(&self) -> Option<VideoPacket> {
        let mut entnahme = self.paket_entnahme.lock();
        if entnahme.neuer_wert() {
            Some(entnahme.aktueller_wert().clone())
        } else {
            None
        }
    }

    /// Reicht den zuletzt uebernommenen unkomprimierten Frame weiter,
    /// etwa an eine lokale Vorschau
    pub fn mit_aktuellem_frame<R>(&self, f: impl FnOnce(&TheoraFrame) -> R) -> R {
        let frame_eingang = self.frame_eingang.lock();
        f(frame_eingang.aktueller_wert())
    }

    /// Setzt oder loest die Pause; das Geraet laeuft weiter, Frames
    /// werden im Callback verworfen
    pub fn pausieren(&self, pausiert: bool) {
        self.pausiert.store(pausiert, Ordering::Release);
        debug!(pausiert, "Video-Pause umgeschaltet");
    }

    pub fn ist_pausiert(&self) -> bool {
        self.pausiert.load(Ordering::Acquire)
    }

    /// Anzahl wegen Codec-Fehlern ausgefallener Frames
    pub fn codec_fehler(&self) -> u64 {
        self.codec_fehler.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
