//! Jitter-gepufferte Audio-Wiedergabe pro entferntem Client
//!
//! Die Wiedergabe laeuft ueber eine Streaming-Quelle mit umlaufenden
//! Puffern (OpenAL-Semantik): verarbeitete Puffer werden zurueckgeholt,
//! aus der Paket-Warteschlange nachgefuellt und wieder eingereiht. Die
//! Quelle selbst stellt der Host ueber die Medienfabrik.
//!
//! Unterlaeufe aeussern sich als stille Luecke – die Quelle stoppt und
//! wird beim naechsten Nachschub neu gestartet (fruehestens ab zwei
//! eingereihten Puffern). Ueberlaeufe verlieren die aeltesten Pakete am
//! Kopf der Warteschlange: die Gegenwart bleibt, das Veraltete faellt.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

use agora_buffers::DropoutConsumer;

use crate::codec::SpeexDecoder;
use crate::error::AudioResult;

/// Handle auf einen Wiedergabepuffer der Streaming-Quelle
pub type PufferId = u32;

/// Mindestzahl eingereihter Puffer bevor eine gestoppte Quelle neu startet
const MINDEST_PUFFER_FUER_START: usize = 2;

// ---------------------------------------------------------------------------
// StreamingQuelle
// ---------------------------------------------------------------------------

/// Streaming-Audioquelle mit umlaufenden Puffern
///
/// Re-Expression der OpenAL-Quelle: Puffer werden einmal erzeugt, mit
/// PCM gefuellt an die Quelle gehaengt und nach dem Abspielen als
/// "verarbeitet" zurueckgeholt.
pub trait StreamingQuelle: Send {
    /// Erzeugt `anzahl` Wiedergabepuffer und gibt ihre Handles zurueck
    fn erzeuge_puffer(&mut self, anzahl: usize) -> AudioResult<Vec<PufferId>>;

    /// Holt alle fertig abgespielten Puffer von der Quelle zurueck
    fn verarbeitete_puffer(&mut self) -> Vec<PufferId>;

    /// Laedt PCM in einen Puffer und haengt ihn an die Quelle
    fn puffer_einreihen(&mut self, id: PufferId, pcm: &[i16], sample_rate: u32)
        -> AudioResult<()>;

    /// Anzahl aktuell eingereihter Puffer
    fn eingereihte_puffer(&self) -> usize;

    /// Ob die Quelle gerade abspielt
    fn spielt(&self) -> bool;

    /// Startet die Wiedergabe
    fn abspielen(&mut self) -> AudioResult<()>;
}

// ---------------------------------------------------------------------------
// PlaybackPumpe
// ---------------------------------------------------------------------------

/// Wiedergabe-Pumpe eines entfernten Clients
///
/// Wird erst bei der ersten Aktivierung des Audio-Render-Kontexts
/// erzeugt. Haelt den SPEEX-Decoder (konstruiert mit den Groessen des
/// Senders), den Stapel freier Puffer und die Consumer-Haelfte der
/// Jitter-Warteschlange.
pub struct PlaybackPumpe {
    decoder: Box<dyn SpeexDecoder>,
    quelle: Box<dyn StreamingQuelle>,
    /// Stapel freier Puffer-Handles
    freie_puffer: Vec<PufferId>,
    eingang: DropoutConsumer<u8>,
    sample_rate: u32,
    /// Wiederverwendeter PCM-Frame
    pcm: Vec<i16>,
    codec_fehler: AtomicU64,
}

impl PlaybackPumpe {
    /// Erzeugt die Pumpe und reserviert `anzahl_puffer` Wiedergabepuffer.
    pub fn neu(
        decoder: Box<dyn SpeexDecoder>,
        mut quelle: Box<dyn StreamingQuelle>,
        eingang: DropoutConsumer<u8>,
        anzahl_puffer: usize,
        sample_rate: u32,
    ) -> AudioResult<Self> {
        if eingang.segment_laenge() != decoder.paket_groesse() {
            return Err(crate::error::AudioError::Konfiguration(format!(
                "Warteschlange traegt {}-Byte-Segmente, Decoder erwartet {}",
                eingang.segment_laenge(),
                decoder.paket_groesse()
            )));
        }
        let freie_puffer = quelle.erzeuge_puffer(anzahl_puffer)?;
        let frame_groesse = decoder.frame_groesse();
        debug!(anzahl_puffer, frame_groesse, "Playback-Pumpe erzeugt");
        Ok(Self {
            decoder,
            quelle,
            freie_puffer,
            eingang,
            sample_rate,
            pcm: vec![0i16; frame_groesse],
            codec_fehler: AtomicU64::new(0),
        })
    }

    /// Ein Durchlauf der Wiedergabeschleife; vom AL-Render-Pass des
    /// Haupt-Threads getrieben.
    pub fn al_render(&mut self) -> AudioResult<()> {
        // 1. Verarbeitete Puffer zurueck auf den Freistapel
        let verarbeitet = self.quelle.verarbeitete_puffer();
        self.freie_puffer.extend(verarbeitet);

        // 2. Solange freie Puffer und Pakete da sind: dekodieren und
        //    einreihen; nur tatsaechlich verbrauchte Pakete verlassen
        //    die Warteschlange
        let anstehend = self.eingang.sperren();
        let mut verbraucht = 0usize;
        while verbraucht < anstehend && !self.freie_puffer.is_empty() {
            let paket = self.eingang.gesperrtes_segment(verbraucht);
            match self.decoder.decode(paket, &mut self.pcm) {
                Ok(()) => {
                    let id = self
                        .freie_puffer
                        .pop()
                        .expect("Freistapel leer trotz Schleifenbedingung");
                    self.quelle
                        .puffer_einreihen(id, &self.pcm, self.sample_rate)?;
                }
                Err(e) => {
                    // Einzelnes Paket verwerfen, Strom fortsetzen
                    self.codec_fehler.fetch_add(1, Ordering::Relaxed);
                    warn!("SPEEX-Decode fehlgeschlagen: {}", e);
                }
            }
            verbraucht += 1;
        }
        self.eingang.entsperren_teilweise(verbraucht);

        // 3. Gestoppte Quelle neu starten sobald genug Vorlauf da ist
        if !self.quelle.spielt() && self.quelle.eingereihte_puffer() >= MINDEST_PUFFER_FUER_START {
            trace!("Quelle neu gestartet");
            self.quelle.abspielen()?;
        }

        Ok(())
    }

    /// Anzahl wegen Codec-Fehlern verworfener Pakete
    pub fn codec_fehler(&self) -> u64 {
        self.codec_fehler.load(Ordering::Relaxed)
    }

    /// Ob die Quelle gerade abspielt
    pub fn spielt(&self) -> bool {
        self.quelle.spielt()
    }

    /// Anzahl noch nicht dekodierter Pakete in der Jitter-Warteschlange
    pub fn anstehende_pakete(&self) -> usize {
        self.eingang.fuellstand()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SpeexDecoder;
    use crate::error::{AudioError, AudioResult};
    use agora_buffers::DropoutBuffer;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Test-Decoder: Paket-Bytes sind Little-Endian i16-Samples
    struct KopierDecoder {
        frame: usize,
    }

    impl SpeexDecoder for KopierDecoder {
        fn frame_groesse(&self) -> usize {
            self.frame
        }
        fn paket_groesse(&self) -> usize {
            self.frame * 2
        }
        fn decode(&mut self, paket: &[u8], pcm: &mut [i16]) -> AudioResult<()> {
            if paket.iter().all(|&b| b == 0xFF) {
                return Err(AudioError::CodecFehler("Testpaket ungueltig".into()));
            }
            for (i, zelle) in pcm.iter_mut().enumerate() {
                *zelle = i16::from_le_bytes([paket[2 * i], paket[2 * i + 1]]);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct QuellenZustand {
        naechste_id: PufferId,
        eingereiht: Vec<(PufferId, Vec<i16>)>,
        verarbeitet: Vec<PufferId>,
        spielt: bool,
        starts: usize,
    }

    /// Nachgebildete Streaming-Quelle; der Test behaelt einen Klon und
    /// simuliert das Abspielen von Hand
    #[derive(Clone, Default)]
    struct TestQuelle(Arc<Mutex<QuellenZustand>>);

    impl TestQuelle {
        /// Simuliert das Abspielen der vordersten `n` Puffer
        fn spiele_ab(&self, n: usize) {
            let mut z = self.0.lock();
            for _ in 0..n.min(z.eingereiht.len()) {
                let (id, _) = z.eingereiht.remove(0);
                z.verarbeitet.push(id);
            }
            if z.eingereiht.is_empty() {
                z.spielt = false;
            }
        }

        fn starts(&self) -> usize {
            self.0.lock().starts
        }
    }

    impl StreamingQuelle for TestQuelle {
        fn erzeuge_puffer(&mut self, anzahl: usize) -> AudioResult<Vec<PufferId>> {
            let mut z = self.0.lock();
            let start = z.naechste_id;
            z.naechste_id += anzahl as PufferId;
            Ok((start..z.naechste_id).collect())
        }
        fn verarbeitete_puffer(&mut self) -> Vec<PufferId> {
            std::mem::take(&mut self.0.lock().verarbeitet)
        }
        fn puffer_einreihen(
            &mut self,
            id: PufferId,
            pcm: &[i16],
            _sample_rate: u32,
        ) -> AudioResult<()> {
            self.0.lock().eingereiht.push((id, pcm.to_vec()));
            Ok(())
        }
        fn eingereihte_puffer(&self) -> usize {
            self.0.lock().eingereiht.len()
        }
        fn spielt(&self) -> bool {
            self.0.lock().spielt
        }
        fn abspielen(&mut self) -> AudioResult<()> {
            let mut z = self.0.lock();
            z.spielt = true;
            z.starts += 1;
            Ok(())
        }
    }

    fn paket_aus_samples(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn dekodiert_und_reiht_ein() {
        let (mut tx, rx) = DropoutBuffer::neu::<u8>(4, 8);
        tx.push_segment(&paket_aus_samples(&[10, 20]));
        tx.push_segment(&paket_aus_samples(&[30, 40]));

        let mut pumpe = PlaybackPumpe::neu(
            Box::new(KopierDecoder { frame: 2 }),
            Box::new(TestQuelle::default()),
            rx,
            4,
            16_000,
        )
        .unwrap();

        pumpe.al_render().unwrap();
        assert!(pumpe.spielt(), "Quelle muss ab 2 Puffern starten");
        assert_eq!(pumpe.anstehende_pakete(), 0);
    }

    #[test]
    fn startet_nicht_unter_zwei_puffern() {
        let (mut tx, rx) = DropoutBuffer::neu::<u8>(4, 8);
        tx.push_segment(&paket_aus_samples(&[10, 20]));

        let mut pumpe = PlaybackPumpe::neu(
            Box::new(KopierDecoder { frame: 2 }),
            Box::new(TestQuelle::default()),
            rx,
            4,
            16_000,
        )
        .unwrap();

        pumpe.al_render().unwrap();
        assert!(
            !pumpe.spielt(),
            "Ein einzelner Puffer startet die Quelle nicht"
        );
    }

    #[test]
    fn unterlauf_stoppt_und_nachschub_startet_neu() {
        let (mut tx, rx) = DropoutBuffer::neu::<u8>(4, 8);
        tx.push_segment(&paket_aus_samples(&[1, 2]));
        tx.push_segment(&paket_aus_samples(&[3, 4]));

        let quelle = TestQuelle::default();
        let mut pumpe = PlaybackPumpe::neu(
            Box::new(KopierDecoder { frame: 2 }),
            Box::new(quelle.clone()),
            rx,
            4,
            16_000,
        )
        .unwrap();

        pumpe.al_render().unwrap();
        assert!(pumpe.spielt());

        // Unterlauf: alles abgespielt, kein Nachschub
        quelle.spiele_ab(2);
        pumpe.al_render().unwrap();
        assert!(!pumpe.spielt(), "Unterlauf stoppt die Quelle");

        // Nachschub laesst die Wiedergabe natuerlich wieder anlaufen
        tx.push_segment(&paket_aus_samples(&[5, 6]));
        tx.push_segment(&paket_aus_samples(&[7, 8]));
        pumpe.al_render().unwrap();
        assert!(pumpe.spielt(), "Nachschub startet die Quelle neu");
        assert_eq!(quelle.starts(), 2, "Neustart, keine Neuanlage");
    }

    #[test]
    fn fehlerhaftes_paket_wird_verworfen() {
        let (mut tx, rx) = DropoutBuffer::neu::<u8>(4, 8);
        tx.push_segment(&[0xFF; 4]); // Decoder lehnt ab
        tx.push_segment(&paket_aus_samples(&[7, 8]));
        tx.push_segment(&paket_aus_samples(&[9, 10]));

        let mut pumpe = PlaybackPumpe::neu(
            Box::new(KopierDecoder { frame: 2 }),
            Box::new(TestQuelle::default()),
            rx,
            4,
            16_000,
        )
        .unwrap();

        pumpe.al_render().unwrap();
        assert_eq!(pumpe.codec_fehler(), 1);
        assert!(pumpe.spielt(), "Die gueltigen Pakete laufen weiter");
    }

    #[test]
    fn mehr_pakete_als_freie_puffer_bleiben_stehen() {
        let (mut tx, rx) = DropoutBuffer::neu::<u8>(4, 8);
        for i in 0..5i16 {
            tx.push_segment(&paket_aus_samples(&[i, i]));
        }

        // Nur 3 Wiedergabepuffer: 2 Pakete muessen warten
        let mut pumpe = PlaybackPumpe::neu(
            Box::new(KopierDecoder { frame: 2 }),
            Box::new(TestQuelle::default()),
            rx,
            3,
            16_000,
        )
        .unwrap();

        pumpe.al_render().unwrap();
        assert_eq!(
            pumpe.anstehende_pakete(),
            2,
            "Unverbrauchte Pakete bleiben stehen"
        );
    }
}
