//! Zustand eines entfernten Clients
//!
//! Wird beim Connect-Forward angelegt und vom Host-Framework besessen.
//! Der Empfangs-Thread schreibt in die Producer-Haelften der Kanaele,
//! Haupt-Thread und Decoder-Thread lesen die Consumer-Haelften; geteilt
//! wird ausschliesslich ueber Dropout- und Triple-Buffer.
//!
//! Die Wiedergabe-Pumpe entsteht erst bei der ersten Aktivierung des
//! Audio-Render-Kontexts; der Video-Decoder-Thread startet beim Connect
//! und wird beim Drop dieses Zustands beendet und gejoint.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use agora_audio::PlaybackPumpe;
use agora_buffers::{
    DropoutBuffer, DropoutConsumer, DropoutProducer, TripleBuffer, TripleConsumer, TripleProducer,
};
use agora_core::{Point, Scalar, VideoTransform};
use agora_plugin::PluginResult;
use agora_protocol::{ConnectForward, Pipe, StreamParameter, UpdateNachricht, VideoPacket};
use agora_video::{TheoraFrame, VideoDecoderThread};

use crate::fabrik::MedienFabrik;

/// Billboard-Geometrie eines entfernten Video-Streams im
/// Navigationsraum des Senders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    /// Eckpunkte gegen den Uhrzeigersinn, beginnend unten links
    pub ecken: [Point; 4],
}

/// Zusammenfassung eines verarbeiteten Server-Updates (fuer Zaehler)
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateZusammenfassung {
    /// Anzahl empfangener SPEEX-Pakete
    pub audio_pakete: usize,
    /// Ob das Update ein Video-Paket trug
    pub hat_video_paket: bool,
}

/// Audio-Empfangsseite eines entfernten Clients
struct AudioEmpfang {
    /// Empfangs-Thread-Seite der Jitter-Warteschlange
    eingang: Mutex<DropoutProducer<u8>>,
    /// Consumer-Haelfte; wandert bei der ersten AL-Aktivierung in die Pumpe
    ausgang: Mutex<Option<DropoutConsumer<u8>>>,
    /// Lazy erzeugte Wiedergabe-Pumpe
    playback: Mutex<Option<PlaybackPumpe>>,
}

/// Video-Empfangsseite eines entfernten Clients
struct VideoEmpfang {
    paket_eingang: Mutex<TripleProducer<VideoPacket>>,
    frame_ausgang: Mutex<TripleConsumer<TheoraFrame>>,
    transform_eingang: Mutex<TripleProducer<VideoTransform>>,
    transform_ausgang: Mutex<TripleConsumer<VideoTransform>>,
    /// `None` wenn der Decoder nicht konstruierbar war; Pakete werden
    /// dann gelesen und verworfen, das Drahtformat bleibt intakt
    decoder: Option<VideoDecoderThread>,
    video_groesse: [Scalar; 2],
}

/// Protokoll-Zustand eines entfernten Clients
pub struct RemoteClientState {
    parameter: StreamParameter,
    audio: Option<AudioEmpfang>,
    video: Option<VideoEmpfang>,
    kopf_eingang: Mutex<TripleProducer<Point>>,
    kopf_ausgang: Mutex<TripleConsumer<Point>>,
    fabrik: Arc<dyn MedienFabrik>,
    jitter_puffer_groesse: usize,
    sample_rate: u32,
}

impl RemoteClientState {
    /// Legt den Zustand aus einem Connect-Forward an.
    ///
    /// Bei `hat_theora` startet sofort der Decoder-Thread; schlaegt die
    /// Decoder-Konstruktion fehl, bleibt der Stream stumm, aber die
    /// Update-Koerper werden weiterhin korrekt gelesen.
    pub fn neu(
        weiterleitung: &ConnectForward,
        fabrik: Arc<dyn MedienFabrik>,
        jitter_puffer_groesse: usize,
        sample_rate: u32,
    ) -> Self {
        let parameter = weiterleitung.parameter();

        let audio = parameter.sendet_audio().then(|| {
            let (eingang, ausgang) = DropoutBuffer::neu::<u8>(
                weiterleitung.speex_paket_groesse as usize,
                jitter_puffer_groesse,
            );
            AudioEmpfang {
                eingang: Mutex::new(eingang),
                ausgang: Mutex::new(Some(ausgang)),
                playback: Mutex::new(None),
            }
        });

        let video = weiterleitung.theora.as_ref().map(|ankuendigung| {
            let (paket_eingang, paket_ausgang) = TripleBuffer::neu(VideoPacket::default());
            let (frame_eingang, frame_ausgang) = TripleBuffer::neu(TheoraFrame::default());
            let decoder = match fabrik.theora_decoder(&ankuendigung.headers) {
                Ok(decoder) => Some(VideoDecoderThread::starten(
                    decoder,
                    paket_ausgang,
                    frame_eingang,
                )),
                Err(e) => {
                    warn!("Theora-Decoder nicht konstruierbar: {}", e);
                    None
                }
            };
            let (transform_eingang, transform_ausgang) =
                TripleBuffer::neu(VideoTransform::identitaet());
            VideoEmpfang {
                paket_eingang: Mutex::new(paket_eingang),
                frame_ausgang: Mutex::new(frame_ausgang),
                transform_eingang: Mutex::new(transform_eingang),
                transform_ausgang: Mutex::new(transform_ausgang),
                decoder,
                video_groesse: ankuendigung.video_groesse,
            }
        });

        let (kopf_eingang, kopf_ausgang) = TripleBuffer::neu(Point::default());

        info!(
            audio = parameter.sendet_audio(),
            video = parameter.hat_theora,
            "Entfernter Client angelegt"
        );

        Self {
            parameter,
            audio,
            video,
            kopf_eingang: Mutex::new(kopf_eingang),
            kopf_ausgang: Mutex::new(kopf_ausgang),
            fabrik,
            jitter_puffer_groesse,
            sample_rate,
        }
    }

    /// Fixierte Stream-Parameter dieses Senders
    pub fn parameter(&self) -> &StreamParameter {
        &self.parameter
    }

    // -----------------------------------------------------------------------
    // Empfangs-Thread
    // -----------------------------------------------------------------------

    /// Liest einen Server-Update-Koerper dieses Senders und verteilt ihn
    /// in die Kanaele; laeuft auf dem Empfangs-Thread des Hosts.
    pub fn verarbeite_server_update(
        &self,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<UpdateZusammenfassung> {
        let update = UpdateNachricht::lesen(pipe, &self.parameter)?;
        let mut zusammenfassung = UpdateZusammenfassung::default();

        if let (Some(audio), Some(empfang)) = (&update.audio, &self.audio) {
            let mut eingang = empfang.eingang.lock();
            for paket in &audio.pakete {
                eingang.push_segment(paket);
            }
            self.kopf_eingang.lock().schreiben(audio.kopf_position);
            zusammenfassung.audio_pakete = audio.pakete.len();
        }

        if let (Some(video), Some(empfang)) = (update.video, &self.video) {
            if let Some(paket) = video.paket {
                empfang.paket_eingang.lock().schreiben(paket);
                if let Some(decoder) = &empfang.decoder {
                    decoder.wecken();
                }
                zusammenfassung.hat_video_paket = true;
            }
            empfang.transform_eingang.lock().schreiben(video.transform);
        }

        Ok(zusammenfassung)
    }

    // -----------------------------------------------------------------------
    // Haupt-Thread
    // -----------------------------------------------------------------------

    /// Tick-Hook: uebernimmt die juengste Kopfposition und
    /// Billboard-Transformation
    pub fn frame(&self) {
        self.kopf_ausgang.lock().neuer_wert();
        if let Some(video) = &self.video {
            video.transform_ausgang.lock().neuer_wert();
        }
    }

    /// Zuletzt uebernommene Kopfposition des Senders
    pub fn kopf_position(&self) -> Point {
        *self.kopf_ausgang.lock().aktueller_wert()
    }

    /// GL-Render-Pass: uebernimmt den juengsten dekodierten Frame
    pub fn gl_render(&self) {
        if let Some(video) = &self.video {
            video.frame_ausgang.lock().neuer_wert();
        }
    }

    /// Reicht den aktuell uebernommenen Frame an den Renderer
    pub fn mit_video_frame<R>(&self, f: impl FnOnce(&TheoraFrame) -> R) -> Option<R> {
        let video = self.video.as_ref()?;
        let frame_ausgang = video.frame_ausgang.lock();
        let frame = frame_ausgang.aktueller_wert();
        if frame.breite == 0 {
            // Noch kein Frame dekodiert
            return None;
        }
        Some(f(frame))
    }

    /// Billboard-Ecken aus der juengsten Transformation und der beim
    /// Connect fixierten Videogroesse
    pub fn billboard(&self) -> Option<Billboard> {
        let video = self.video.as_ref()?;
        let transform = *video.transform_ausgang.lock().aktueller_wert();
        let [breite, hoehe] = video.video_groesse;
        Some(Billboard {
            ecken: [
                transform.transformiere(Point::neu(0.0, 0.0, 0.0)),
                transform.transformiere(Point::neu(breite, 0.0, 0.0)),
                transform.transformiere(Point::neu(breite, hoehe, 0.0)),
                transform.transformiere(Point::neu(0.0, hoehe, 0.0)),
            ],
        })
    }

    /// AL-Render-Pass: erzeugt bei der ersten Aktivierung die
    /// Wiedergabe-Pumpe und treibt danach ihre Schleife.
    pub fn al_render(&self) {
        let Some(empfang) = &self.audio else {
            return;
        };
        let mut playback = empfang.playback.lock();

        if playback.is_none() {
            let Some(ausgang) = empfang.ausgang.lock().take() else {
                // Frueherer Aufbau ist fehlgeschlagen; stumm bleiben
                return;
            };
            let aufbau = self
                .fabrik
                .speex_decoder(
                    self.parameter.speex_frame_groesse as usize,
                    self.parameter.speex_paket_groesse as usize,
                )
                .and_then(|decoder| {
                    let quelle = self.fabrik.streaming_quelle()?;
                    PlaybackPumpe::neu(
                        decoder,
                        quelle,
                        ausgang,
                        self.jitter_puffer_groesse,
                        self.sample_rate,
                    )
                });
            match aufbau {
                Ok(pumpe) => {
                    debug!("Wiedergabe-Pumpe angelegt");
                    *playback = Some(pumpe);
                }
                Err(e) => {
                    warn!("Wiedergabe nicht verfuegbar: {}", e);
                    return;
                }
            }
        }

        if let Some(pumpe) = playback.as_mut() {
            if let Err(e) = pumpe.al_render() {
                warn!("Wiedergabe-Schleife fehlgeschlagen: {}", e);
            }
        }
    }

    /// Ob die Wiedergabequelle dieses Senders gerade abspielt
    pub fn spielt(&self) -> bool {
        self.audio
            .as_ref()
            .and_then(|empfang| {
                empfang
                    .playback
                    .lock()
                    .as_ref()
                    .map(|pumpe| pumpe.spielt())
            })
            .unwrap_or(false)
    }

    /// Ob fuer diesen Sender ein Decoder-Thread laeuft
    pub fn hat_video_decoder(&self) -> bool {
        self.video
            .as_ref()
            .is_some_and(|video| video.decoder.is_some())
    }
}
