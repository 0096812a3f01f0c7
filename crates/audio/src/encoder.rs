//! SPEEX Encoder-Pumpe
//!
//! Ein Hintergrund-Thread liest PCM aus dem Capture-Ring, kodiert jeden
//! Frame und legt das Paket (exakt `paket_groesse` Bytes) in einen
//! internen Dropout-Buffer. Der Client-Update-Tick sperrt den Buffer,
//! entnimmt alle anstehenden Pakete und entsperrt.
//!
//! Eine gesetzte Pause-Flagge unterbricht die Kodierung ohne den Encoder
//! abzubauen; der Capture-Ring wird dabei geleert, damit nach dem
//! Fortsetzen kein veralteter Schwall kodiert wird.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer};
use tracing::{debug, warn};

use agora_buffers::{DropoutBuffer, DropoutConsumer};

use crate::capture::CaptureConsumer;
use crate::codec::SpeexEncoder;

/// Wartezeit des Encoder-Threads wenn kein voller Frame ansteht
const POLL_INTERVALL: Duration = Duration::from_millis(2);
/// Wartezeit des Encoder-Threads im pausierten Zustand
const PAUSE_INTERVALL: Duration = Duration::from_millis(20);

/// Encoder-Pumpe: Capture-Ring -> SPEEX -> Paket-Warteschlange
pub struct EncoderPumpe {
    frame_groesse: usize,
    paket_groesse: usize,
    pausiert: Arc<AtomicBool>,
    laeuft: Arc<AtomicBool>,
    codec_fehler: Arc<AtomicU64>,
    /// Tick-Seite der Paket-Warteschlange
    ausgang: Mutex<DropoutConsumer<u8>>,
    thread: Option<JoinHandle<()>>,
}

impl EncoderPumpe {
    /// Startet die Pumpe mit dem gegebenen Encoder und Capture-Ring.
    ///
    /// `paket_puffer_kapazitaet` ist die Tiefe der internen
    /// Paket-Warteschlange; laeuft sie ueber, faellt das aelteste Paket
    /// weg, nie das neueste.
    pub fn starten(
        mut encoder: Box<dyn SpeexEncoder>,
        mut eingang: CaptureConsumer,
        paket_puffer_kapazitaet: usize,
        pausiert_beim_start: bool,
    ) -> Self {
        let frame_groesse = encoder.frame_groesse();
        let paket_groesse = encoder.paket_groesse();
        let (mut paket_tx, paket_rx) =
            DropoutBuffer::neu::<u8>(paket_groesse, paket_puffer_kapazitaet);

        let pausiert = Arc::new(AtomicBool::new(pausiert_beim_start));
        let laeuft = Arc::new(AtomicBool::new(true));
        let codec_fehler = Arc::new(AtomicU64::new(0));

        let thread = {
            let pausiert = Arc::clone(&pausiert);
            let laeuft = Arc::clone(&laeuft);
            let codec_fehler = Arc::clone(&codec_fehler);
            std::thread::Builder::new()
                .name("agora-speex-enc".into())
                .spawn(move || {
                    let mut pcm = vec![0i16; frame_groesse];
                    let mut paket = vec![0u8; paket_groesse];
                    while laeuft.load(Ordering::Acquire) {
                        if pausiert.load(Ordering::Acquire) {
                            eingang.clear();
                            std::thread::sleep(PAUSE_INTERVALL);
                            continue;
                        }
                        if eingang.occupied_len() < frame_groesse {
                            std::thread::sleep(POLL_INTERVALL);
                            continue;
                        }
                        eingang.pop_slice(&mut pcm);
                        match encoder.encode(&pcm, &mut paket) {
                            Ok(()) => {
                                paket_tx.push_segment(&paket);
                            }
                            Err(e) => {
                                // Einzelner Codec-Fehler: Paket fallen
                                // lassen, Strom fortsetzen
                                codec_fehler.fetch_add(1, Ordering::Relaxed);
                                warn!("SPEEX-Encode fehlgeschlagen: {}", e);
                            }
                        }
                    }
                })
                .expect("Encoder-Thread konnte nicht gestartet werden")
        };

        debug!(
            frame_groesse,
            paket_groesse, paket_puffer_kapazitaet, "Encoder-Pumpe gestartet"
        );

        Self {
            frame_groesse,
            paket_groesse,
            pausiert,
            laeuft,
            codec_fehler,
            ausgang: Mutex::new(paket_rx),
            thread: Some(thread),
        }
    }

    /// Samples pro Frame des laufenden Encoders
    pub fn frame_groesse(&self) -> usize {
        self.frame_groesse
    }

    /// Bytes pro kodiertem Paket
    pub fn paket_groesse(&self) -> usize {
        self.paket_groesse
    }

    /// Setzt oder loest die Pause; der Encoder bleibt bestehen
    pub fn pausieren(&self, pausiert: bool) {
        self.pausiert.store(pausiert, Ordering::Release);
        debug!(pausiert, "Audio-Pause umgeschaltet");
    }

    pub fn ist_pausiert(&self) -> bool {
        self.pausiert.load(Ordering::Acquire)
    }

    /// Anzahl verworfener Frames wegen Codec-Fehlern
    pub fn codec_fehler(&self) -> u64 {
        self.codec_fehler.load(Ordering::Relaxed)
    }

    /// Entnimmt alle anstehenden Pakete fuer den Client-Update-Tick.
    ///
    /// Sperrt die Warteschlange, kopiert die Pakete in Senderreihenfolge
    /// heraus und gibt sie als verbraucht frei. Im pausierten Zustand
    /// (oder ohne Nachschub) ist das Ergebnis leer.
    pub fn entnehme_pakete(&self) -> Vec<Vec<u8>> {
        let mut ausgang = self.ausgang.lock();
        let anzahl = ausgang.sperren();
        let mut pakete = Vec::with_capacity(anzahl);
        for i in 0..anzahl {
            pakete.push(ausgang.gesperrtes_segment(i).to_vec());
        }
        ausgang.entsperren();
        pakete
    }
}

impl Drop for EncoderPumpe {
    fn drop(&mut self) {
        self.laeuft.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
