//! Gemeinsame Test-Doubles: Codecs, Geraete und die Medienfabrik
//!
//! Die Fakes sind bewusst durchschaubar: der SPEEX-Doppel kopiert
//! Samples als Little-Endian-Bytes (Paket = 2x Frame-Groesse), der
//! Theora-Doppel transportiert eine Ein-Byte-Kennung vom Roh-Frame bis
//! in die Luma-Ebene des dekodierten Frames.

use std::sync::Arc;

use parking_lot::Mutex;

use agora_audio::{
    capture_ring, CaptureConfig, CaptureConsumer, CaptureProducer, MikrofonQuelle, PufferId,
    SpeexConfig, SpeexDecoder, SpeexEncoder, StreamingQuelle,
};
use agora_audio::{AudioError, AudioResult};
use agora_client::{MedienFabrik, VideoFormat};
use agora_video::{
    BildExtraktor, FrameBuffer, PixelFormat, TheoraConfig, TheoraDecoder, TheoraEncoder,
    TheoraFrame, VideoQuelle,
};
use agora_video::{VideoError, VideoResult};
use agora_protocol::VideoPacket;

/// Header-Blob, den der Theora-Doppel-Encoder erzeugt und den jeder
/// Doppel-Decoder bit-genau erwartet
pub const TEST_HEADERS: &[u8] = &[0x80, b't', b'h', b'e', b'o', b'r', b'a', 1, 2, 3];

// ---------------------------------------------------------------------------
// SPEEX-Doubles
// ---------------------------------------------------------------------------

pub struct KopierEncoder {
    frame: usize,
}

impl SpeexEncoder for KopierEncoder {
    fn frame_groesse(&self) -> usize {
        self.frame
    }
    fn paket_groesse(&self) -> usize {
        self.frame * 2
    }
    fn encode(&mut self, pcm: &[i16], paket: &mut [u8]) -> AudioResult<()> {
        for (i, s) in pcm.iter().enumerate() {
            paket[2 * i..2 * i + 2].copy_from_slice(&s.to_le_bytes());
        }
        Ok(())
    }
}

pub struct KopierDecoder {
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
        for (i, zelle) in pcm.iter_mut().enumerate() {
            *zelle = i16::from_le_bytes([paket[2 * i], paket[2 * i + 1]]);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Audio-Geraete-Doubles
// ---------------------------------------------------------------------------

pub struct TestMikrofon {
    rate: u32,
}

impl MikrofonQuelle for TestMikrofon {
    fn sample_rate(&self) -> u32 {
        self.rate
    }
}

#[derive(Default)]
pub struct QuellenZustand {
    naechste_id: PufferId,
    eingereiht: Vec<(PufferId, Vec<i16>)>,
    verarbeitet: Vec<PufferId>,
    spielt: bool,
    starts: usize,
    abgespielt: Vec<Vec<i16>>,
}

/// Streaming-Quelle, deren Abspielen der Test von Hand vorantreibt
#[derive(Clone, Default)]
pub struct TestQuelle(Arc<Mutex<QuellenZustand>>);

impl TestQuelle {
    /// Spielt alle eingereihten Puffer ab und haelt die PCM-Frames fest
    pub fn spiele_alles_ab(&self) {
        let mut z = self.0.lock();
        while !z.eingereiht.is_empty() {
            let (id, pcm) = z.eingereiht.remove(0);
            z.verarbeitet.push(id);
            z.abgespielt.push(pcm);
        }
        z.spielt = false;
    }

    pub fn abgespielte(&self) -> Vec<Vec<i16>> {
        self.0.lock().abgespielt.clone()
    }

    pub fn spielt(&self) -> bool {
        self.0.lock().spielt
    }

    pub fn starts(&self) -> usize {
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
    fn puffer_einreihen(&mut self, id: PufferId, pcm: &[i16], _sample_rate: u32) -> AudioResult<()> {
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

// ---------------------------------------------------------------------------
// Video-Doubles
// ---------------------------------------------------------------------------

type FrameCallback = Arc<Mutex<Option<Box<dyn FnMut(&FrameBuffer) + Send>>>>;

pub struct TestVideoQuelle {
    format: (u32, u32),
    callback: FrameCallback,
}

/// Test-Handle, ueber das Frames von Hand geliefert werden
#[derive(Clone)]
pub struct FrameAusloeser {
    callback: FrameCallback,
    format: (u32, u32),
}

impl FrameAusloeser {
    /// Liefert einen Roh-Frame mit der gegebenen Kennung im ersten Byte
    pub fn liefere(&self, kennung: u8) {
        let (breite, hoehe) = self.format;
        let roh = FrameBuffer {
            breite,
            hoehe,
            format: PixelFormat::Yuyv,
            daten: vec![kennung; (breite * hoehe * 2) as usize],
        };
        if let Some(callback) = self.callback.lock().as_mut() {
            callback(&roh);
        }
    }
}

impl VideoQuelle for TestVideoQuelle {
    fn format(&self) -> (u32, u32) {
        self.format
    }
    fn starten(&mut self, callback: Box<dyn FnMut(&FrameBuffer) + Send>) -> VideoResult<()> {
        *self.callback.lock() = Some(callback);
        Ok(())
    }
    fn stoppen(&mut self) {
        *self.callback.lock() = None;
    }
}

pub struct KennungsExtraktor;

impl BildExtraktor for KennungsExtraktor {
    fn extrahiere(&mut self, roh: &FrameBuffer, ziel: &mut TheoraFrame) -> VideoResult<()> {
        ziel.y.fill(roh.daten[0]);
        Ok(())
    }
}

pub struct KennungsEncoder {
    headers: Vec<u8>,
}

impl TheoraEncoder for KennungsEncoder {
    fn headers(&self) -> &[u8] {
        &self.headers
    }
    fn encode(&mut self, frame: &TheoraFrame) -> VideoResult<Vec<VideoPacket>> {
        Ok(vec![VideoPacket::neu(vec![frame.y[0]])])
    }
}

pub struct KennungsDecoder;

impl TheoraDecoder for KennungsDecoder {
    fn decode(&mut self, paket: &VideoPacket) -> VideoResult<Option<TheoraFrame>> {
        match paket.daten.first() {
            Some(&kennung) => {
                let mut frame = TheoraFrame::leer(8, 8);
                frame.y.fill(kennung);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// TestFabrik
// ---------------------------------------------------------------------------

/// Medienfabrik fuer Tests; merkt sich erzeugte Geraete, damit der Test
/// Mikrofon-Samples einspeisen, Frames ausloesen und das Abspielen
/// vorantreiben kann.
pub struct TestFabrik {
    audio_verfuegbar: bool,
    /// Producer-Haelfte des zuletzt geoeffneten Mikrofons
    mikrofon: Mutex<Option<CaptureProducer>>,
    /// Alle erzeugten Streaming-Quellen in Erzeugungsreihenfolge
    quellen: Mutex<Vec<TestQuelle>>,
    /// Ausloeser des zuletzt geoeffneten Videogeraets
    ausloeser: Mutex<Option<FrameAusloeser>>,
}

impl TestFabrik {
    pub fn mit_audio() -> Arc<Self> {
        Arc::new(Self {
            audio_verfuegbar: true,
            mikrofon: Mutex::new(None),
            quellen: Mutex::new(Vec::new()),
            ausloeser: Mutex::new(None),
        })
    }

    /// Fabrik ohne Mikrofon: der Client faellt in den Nur-Empfangs-Betrieb
    pub fn nur_empfang() -> Arc<Self> {
        Arc::new(Self {
            audio_verfuegbar: false,
            mikrofon: Mutex::new(None),
            quellen: Mutex::new(Vec::new()),
            ausloeser: Mutex::new(None),
        })
    }

    /// Holt die Producer-Haelfte des geoeffneten Mikrofons ab
    pub fn mikrofon_produzent(&self) -> CaptureProducer {
        self.mikrofon
            .lock()
            .take()
            .expect("Mikrofon wurde nicht geoeffnet")
    }

    /// Anzahl bislang erzeugter Streaming-Quellen
    pub fn anzahl_quellen(&self) -> usize {
        self.quellen.lock().len()
    }

    /// Die zuletzt erzeugte Streaming-Quelle
    pub fn letzte_quelle(&self) -> TestQuelle {
        self.quellen
            .lock()
            .last()
            .expect("Keine Streaming-Quelle erzeugt")
            .clone()
    }

    /// Der Frame-Ausloeser des geoeffneten Videogeraets
    pub fn frame_ausloeser(&self) -> FrameAusloeser {
        self.ausloeser
            .lock()
            .clone()
            .expect("Videogeraet wurde nicht geoeffnet")
    }
}

impl MedienFabrik for TestFabrik {
    fn mikrofon_oeffnen(
        &self,
        config: &CaptureConfig,
    ) -> AudioResult<(Box<dyn MikrofonQuelle>, CaptureConsumer)> {
        if !self.audio_verfuegbar {
            return Err(AudioError::KeinStandardEingabegeraet);
        }
        let (produzent, konsument) = capture_ring(config);
        *self.mikrofon.lock() = Some(produzent);
        Ok((
            Box::new(TestMikrofon {
                rate: config.sample_rate,
            }),
            konsument,
        ))
    }

    fn speex_encoder(&self, config: &SpeexConfig) -> AudioResult<Box<dyn SpeexEncoder>> {
        Ok(Box::new(KopierEncoder {
            frame: config.frame_groesse as usize,
        }))
    }

    fn speex_decoder(
        &self,
        frame_groesse: usize,
        paket_groesse: usize,
    ) -> AudioResult<Box<dyn SpeexDecoder>> {
        if paket_groesse != frame_groesse * 2 {
            return Err(AudioError::CodecFehler(format!(
                "Unerwartete Paket-Groesse {} fuer Frame {}",
                paket_groesse, frame_groesse
            )));
        }
        Ok(Box::new(KopierDecoder {
            frame: frame_groesse,
        }))
    }

    fn streaming_quelle(&self) -> AudioResult<Box<dyn StreamingQuelle>> {
        let quelle = TestQuelle::default();
        self.quellen.lock().push(quelle.clone());
        Ok(Box::new(quelle))
    }

    fn video_geraet_oeffnen(
        &self,
        _name: &str,
        format: &VideoFormat,
    ) -> VideoResult<Box<dyn VideoQuelle>> {
        let callback: FrameCallback = Arc::new(Mutex::new(None));
        *self.ausloeser.lock() = Some(FrameAusloeser {
            callback: Arc::clone(&callback),
            format: (format.breite, format.hoehe),
        });
        Ok(Box::new(TestVideoQuelle {
            format: (format.breite, format.hoehe),
            callback,
        }))
    }

    fn bild_extraktor(&self, _format: &VideoFormat) -> VideoResult<Box<dyn BildExtraktor>> {
        Ok(Box::new(KennungsExtraktor))
    }

    fn theora_encoder(&self, _config: &TheoraConfig) -> VideoResult<Box<dyn TheoraEncoder>> {
        Ok(Box::new(KennungsEncoder {
            headers: TEST_HEADERS.to_vec(),
        }))
    }

    fn theora_decoder(&self, headers: &[u8]) -> VideoResult<Box<dyn TheoraDecoder>> {
        // Ein Spaeteinsteiger muss den Blob bit-genau erhalten haben
        if headers != TEST_HEADERS {
            return Err(VideoError::CodecFehler("Unbekannter Header-Blob".into()));
        }
        Ok(Box::new(KennungsDecoder))
    }
}
