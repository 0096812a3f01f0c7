//! Theora Decoder-Thread pro entferntem Client
//!
//! Der Thread blockiert auf einer Condvar, bis der Empfangs-Thread ein
//! neues Paket in den Paket-Triple-Buffer gelegt und geweckt hat,
//! dekodiert es und veroeffentlicht den Frame im Frame-Triple-Buffer.
//! Frames, die schneller eintreffen als der Renderer sie abholt, fallen
//! am Triple-Buffer weg (der neueste gewinnt).
//!
//! Jeder Weckruf prueft zuerst die Beenden-Flagge; die Zerstoerung des
//! Remote-Zustands setzt sie, weckt den Thread und joint ihn.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use agora_buffers::{TripleConsumer, TripleProducer};
use agora_protocol::VideoPacket;

use crate::codec::{TheoraDecoder, TheoraFrame};

/// Weckmechanismus zwischen Empfangs-Thread und Decoder-Thread
struct Weckruf {
    signal: Mutex<bool>,
    bereit: Condvar,
}

/// Decoder-Thread-Handle; Drop beendet und joint den Thread
pub struct VideoDecoderThread {
    weckruf: Arc<Weckruf>,
    beenden: Arc<AtomicBool>,
    codec_fehler: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl VideoDecoderThread {
    /// Startet den Thread mit dem Decoder des Senders.
    ///
    /// `paket_eingang` liefert die vom Empfangs-Thread veroeffentlichten
    /// Pakete, `frame_ausgang` nimmt die dekodierten Frames auf.
    pub fn starten(
        mut decoder: Box<dyn TheoraDecoder>,
        mut paket_eingang: TripleConsumer<VideoPacket>,
        mut frame_ausgang: TripleProducer<TheoraFrame>,
    ) -> Self {
        let weckruf = Arc::new(Weckruf {
            signal: Mutex::new(false),
            bereit: Condvar::new(),
        });
        let beenden = Arc::new(AtomicBool::new(false));
        let codec_fehler = Arc::new(AtomicU64::new(0));

        let thread = {
            let weckruf = Arc::clone(&weckruf);
            let beenden = Arc::clone(&beenden);
            let codec_fehler = Arc::clone(&codec_fehler);
            std::thread::Builder::new()
                .name("agora-theora-dec".into())
                .spawn(move || loop {
                    {
                        let mut signal = weckruf.signal.lock();
                        while !*signal && !beenden.load(Ordering::Acquire) {
                            weckruf.bereit.wait(&mut signal);
                        }
                        *signal = false;
                    }
                    if beenden.load(Ordering::Acquire) {
                        break;
                    }
                    if !paket_eingang.neuer_wert() {
                        continue;
                    }
                    match decoder.decode(paket_eingang.aktueller_wert()) {
                        Ok(Some(frame)) => {
                            *frame_ausgang.naechster_wert() = frame;
                            frame_ausgang.veroeffentlichen();
                        }
                        Ok(None) => {}
                        Err(e) => {
                            // Einzelnes Paket verwerfen, Strom fortsetzen
                            codec_fehler.fetch_add(1, Ordering::Relaxed);
                            warn!("Theora-Decode fehlgeschlagen: {}", e);
                        }
                    }
                })
                .expect("Decoder-Thread konnte nicht gestartet werden")
        };

        debug!("Video-Decoder-Thread gestartet");

        Self {
            weckruf,
            beenden,
            codec_fehler,
            thread: Some(thread),
        }
    }

    /// Weckt den Thread nach Veroeffentlichung eines neuen Pakets;
    /// vom Empfangs-Thread gerufen
    pub fn wecken(&self) {
        let mut signal = self.weckruf.signal.lock();
        *signal = true;
        self.weckruf.bereit.notify_one();
    }

    /// Anzahl wegen Codec-Fehlern verworfener Pakete
    pub fn codec_fehler(&self) -> u64 {
        self.codec_fehler.load(Ordering::Relaxed)
    }
}

impl Drop for VideoDecoderThread {
    fn drop(&mut self) {
        self.beenden.store(true, Ordering::Release);
        self.weckruf.bereit.notify_one();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        debug!("Video-Decoder-Thread beendet");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{VideoError, VideoResult};
    use agora_buffers::TripleBuffer;
    use std::time::Duration;

    /// Decoder: Paket [kennung] -> Frame mit Luma = kennung
    struct KennungsDecoder;

    impl TheoraDecoder for KennungsDecoder {
        fn decode(&mut self, paket: &VideoPacket) -> VideoResult<Option<TheoraFrame>> {
            match paket.daten.first() {
                Some(&0xEE) => Err(VideoError::CodecFehler("Testpaket ungueltig".into())),
                Some(&kennung) => {
                    let mut frame = TheoraFrame::leer(4, 4);
                    frame.y.fill(kennung);
                    Ok(Some(frame))
                }
                None => Ok(None),
            }
        }
    }

    fn warte_auf<F: FnMut() -> bool>(mut bedingung: F) {
        for _ in 0..500 {
            if bedingung() {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("Bedingung nicht innerhalb der Frist erreicht");
    }

    #[test]
    fn dekodiert_nach_weckruf() {
        let (mut paket_tx, paket_rx) = TripleBuffer::neu(VideoPacket::default());
        let (frame_tx, mut frame_rx) = TripleBuffer::neu(TheoraFrame::default());

        let thread = VideoDecoderThread::starten(Box::new(KennungsDecoder), paket_rx, frame_tx);

        paket_tx.schreiben(VideoPacket::neu(vec![7]));
        thread.wecken();

        warte_auf(|| frame_rx.neuer_wert());
        assert_eq!(frame_rx.aktueller_wert().y[0], 7);
    }

    #[test]
    fn fehlerhaftes_paket_wird_gezaehlt() {
        let (mut paket_tx, paket_rx) = TripleBuffer::neu(VideoPacket::default());
        let (frame_tx, _frame_rx) = TripleBuffer::neu(TheoraFrame::default());

        let thread = VideoDecoderThread::starten(Box::new(KennungsDecoder), paket_rx, frame_tx);

        paket_tx.schreiben(VideoPacket::neu(vec![0xEE]));
        thread.wecken();

        warte_auf(|| thread.codec_fehler() == 1);
    }

    #[test]
    fn drop_beendet_den_thread() {
        let (_paket_tx, paket_rx) = TripleBuffer::neu(VideoPacket::default());
        let (frame_tx, _frame_rx) = TripleBuffer::neu(TheoraFrame::default());

        let thread = VideoDecoderThread::starten(Box::new(KennungsDecoder), paket_rx, frame_tx);
        // Drop ohne jeden Weckruf darf nicht haengen
        drop(thread);
    }

    #[test]
    fn weckruf_ohne_paket_ist_harmlos() {
        let (_paket_tx, paket_rx) = TripleBuffer::neu(VideoPacket::default());
        let (frame_tx, mut frame_rx) = TripleBuffer::neu(TheoraFrame::default());

        let thread = VideoDecoderThread::starten(Box::new(KennungsDecoder), paket_rx, frame_tx);
        thread.wecken();
        std::thread::sleep(Duration::from_millis(20));
        assert!(!frame_rx.neuer_wert());
    }
}
