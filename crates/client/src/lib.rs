//! agora-client – Client-Plugin des Agora-Protokolls
//!
//! Multiplext Echtzeit-Audio (SPEEX) und -Video (Theora) samt raeumlicher
//! Metadaten ueber die Kollaborations-Pipe des Host-Frameworks. Der
//! lokale Client erzeugt hoechstens einen Audio- und einen Video-Strom;
//! fuer jeden entfernten Client haelt er einen [`RemoteClientState`] mit
//! Jitter-Warteschlange, Decoder-Thread und Render-Zubringern.
//!
//! Geraete und Codecs kommen ueber die [`MedienFabrik`]; scheitert die
//! Geraete-Oeffnung, bleibt der Client im Nur-Empfangs-Betrieb
//! funktionsfaehig (`speex_frame_groesse = 0`, kein Theora).

pub mod config;
pub mod fabrik;
pub mod remote;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use agora_audio::{CaptureConfig, EncoderPumpe, MikrofonQuelle, SpeexConfig};
use agora_core::{ClientId, Point, VideoTransform};
use agora_observability::AgoraMetriken;
use agora_plugin::{PluginResult, ProtocolClient};
use agora_protocol::{
    AudioUpdate, ConnectForward, ConnectRequest, Pipe, StreamParameter, TheoraAnkuendigung,
    UpdateNachricht, VideoUpdate, ANZAHL_NACHRICHTEN, PROTOKOLL_NAME,
};
use agora_video::{TheoraConfig, TheoraFrame, VideoEncoderPumpe};

pub use config::{AgoraConfig, VideoFormat};
pub use fabrik::MedienFabrik;
pub use remote::{Billboard, RemoteClientState, UpdateZusammenfassung};

/// Sende-Seite des lokalen Audio-Stroms
struct AudioSender {
    pumpe: EncoderPumpe,
    /// Haelt den Capture-Strom am Leben
    _mikrofon: Box<dyn MikrofonQuelle>,
}

/// Client-Objekt des Agora-Protokolls
pub struct AgoraClient {
    config: AgoraConfig,
    fabrik: Arc<dyn MedienFabrik>,
    /// `None` = Nur-Empfangs-Betrieb
    audio: Mutex<Option<AudioSender>>,
    video: Mutex<Option<VideoEncoderPumpe>>,
    /// Vom Host pro Tick gesetzte lokale Kopfposition
    lokale_kopf_position: Mutex<Point>,
    /// Aktuelle Billboard-Platzierung des lokalen Videos
    video_transform: Mutex<VideoTransform>,
    /// Sichtbarkeit der lokalen Video-Vorschau
    lokales_video_sichtbar: Mutex<bool>,
    metriken: AgoraMetriken,
}

impl AgoraClient {
    /// Erzeugt den Agora-Client und oeffnet Mikrofon und Videogeraet.
    ///
    /// Geraete-Fehler degradieren zum Nur-Empfangs-Betrieb statt den
    /// Aufbau scheitern zu lassen.
    pub fn neu(config: AgoraConfig, fabrik: Arc<dyn MedienFabrik>) -> Self {
        let audio = Self::audio_aufbauen(&config, fabrik.as_ref());
        let video = Self::video_aufbauen(&config, fabrik.as_ref());

        info!(
            audio = audio.is_some(),
            video = video.is_some(),
            "Agora-Client erzeugt"
        );

        Self {
            video_transform: Mutex::new(config.video.transform),
            config,
            fabrik,
            audio: Mutex::new(audio),
            video: Mutex::new(video),
            lokale_kopf_position: Mutex::new(Point::default()),
            lokales_video_sichtbar: Mutex::new(false),
            metriken: AgoraMetriken::neu().expect("Metriken-Initialisierung fehlgeschlagen"),
        }
    }

    fn audio_aufbauen(config: &AgoraConfig, fabrik: &dyn MedienFabrik) -> Option<AudioSender> {
        let capture_config = CaptureConfig {
            sample_rate: config.audio.speex_sample_rate,
            puffer_groesse: (config.audio.speex_sample_rate as usize) * 2,
        };
        let speex_config = SpeexConfig {
            sample_rate: config.audio.speex_sample_rate,
            frame_groesse: config.audio.speex_frame_groesse,
        };
        let aufbau = fabrik.mikrofon_oeffnen(&capture_config).and_then(|(mikrofon, ring)| {
            let encoder = fabrik.speex_encoder(&speex_config)?;
            Ok(AudioSender {
                pumpe: EncoderPumpe::starten(
                    encoder,
                    ring,
                    config.audio.jitter_puffer_groesse as usize,
                    config.audio.pause_beim_start,
                ),
                _mikrofon: mikrofon,
            })
        });
        match aufbau {
            Ok(sender) => Some(sender),
            Err(e) => {
                warn!("Kein Audio-Sendebetrieb: {}", e);
                None
            }
        }
    }

    fn video_aufbauen(config: &AgoraConfig, fabrik: &dyn MedienFabrik) -> Option<VideoEncoderPumpe> {
        let geraet_name = config.video.geraet_name.as_deref()?;
        let theora_config = TheoraConfig {
            breite: config.video.format.breite,
            hoehe: config.video.format.hoehe,
            bitrate: config.video.theora_bitrate,
            qualitaet: config.video.theora_qualitaet,
            gop_groesse: config.video.theora_gop_groesse,
        };
        let aufbau = (|| {
            theora_config.validieren()?;
            let quelle = fabrik.video_geraet_oeffnen(geraet_name, &config.video.format)?;
            let extraktor = fabrik.bild_extraktor(&config.video.format)?;
            let encoder = fabrik.theora_encoder(&theora_config)?;
            VideoEncoderPumpe::starten(quelle, extraktor, encoder, config.video.pause_beim_start)
        })();
        match aufbau {
            Ok(pumpe) => Some(pumpe),
            Err(e) => {
                warn!("Kein Video-Sendebetrieb: {}", e);
                None
            }
        }
    }

    /// Stream-Parameter, wie sie der Connect-Request ankuendigt
    pub fn lokale_parameter(&self) -> StreamParameter {
        let audio = self.audio.lock();
        let (frame, paket) = audio
            .as_ref()
            .map(|sender| {
                (
                    sender.pumpe.frame_groesse() as u32,
                    sender.pumpe.paket_groesse() as u32,
                )
            })
            .unwrap_or((0, 0));
        StreamParameter {
            speex_frame_groesse: frame,
            speex_paket_groesse: paket,
            hat_theora: self.video.lock().is_some(),
        }
    }

    // -----------------------------------------------------------------------
    // Vom Host bediente Oberflaeche
    // -----------------------------------------------------------------------

    /// Setzt die lokale Kopfposition; vom Host einmal pro Tick gerufen
    pub fn setze_kopf_position(&self, position: Point) {
        *self.lokale_kopf_position.lock() = position;
    }

    /// Verschiebt das lokale Video-Billboard
    pub fn setze_video_transform(&self, transform: VideoTransform) {
        *self.video_transform.lock() = transform;
    }

    /// Pausiert oder setzt die Audio-Uebertragung fort, ohne den
    /// Encoder abzubauen
    pub fn audio_pausieren(&self, pausiert: bool) {
        if let Some(sender) = self.audio.lock().as_ref() {
            sender.pumpe.pausieren(pausiert);
        }
    }

    pub fn ist_audio_pausiert(&self) -> bool {
        self.audio
            .lock()
            .as_ref()
            .map(|sender| sender.pumpe.ist_pausiert())
            .unwrap_or(false)
    }

    /// Pausiert oder setzt die Video-Uebertragung fort
    pub fn video_pausieren(&self, pausiert: bool) {
        if let Some(pumpe) = self.video.lock().as_ref() {
            pumpe.pausieren(pausiert);
        }
    }

    pub fn ist_video_pausiert(&self) -> bool {
        self.video
            .lock()
            .as_ref()
            .map(|pumpe| pumpe.ist_pausiert())
            .unwrap_or(false)
    }

    /// Schaltet die lokale Video-Vorschau um
    pub fn lokales_video_anzeigen(&self, sichtbar: bool) {
        *self.lokales_video_sichtbar.lock() = sichtbar;
    }

    pub fn ist_lokales_video_sichtbar(&self) -> bool {
        *self.lokales_video_sichtbar.lock()
    }

    /// Reicht den zuletzt kodierten lokalen Frame an die Vorschau
    pub fn mit_lokalem_frame<R>(&self, f: impl FnOnce(&TheoraFrame) -> R) -> Option<R> {
        let video = self.video.lock();
        video.as_ref().map(|pumpe| pumpe.mit_aktuellem_frame(f))
    }

    pub fn konfiguration(&self) -> &AgoraConfig {
        &self.config
    }

    /// Prometheus-Metriken dieses Clients; der Host liefert sie aus
    pub fn metriken(&self) -> &AgoraMetriken {
        &self.metriken
    }
}

impl ProtocolClient for AgoraClient {
    type Remote = RemoteClientState;

    fn name(&self) -> &'static str {
        PROTOKOLL_NAME
    }

    fn anzahl_nachrichten(&self) -> u32 {
        ANZAHL_NACHRICHTEN
    }

    fn sende_connect_request(&self, pipe: &mut dyn Pipe) -> PluginResult<()> {
        let parameter = self.lokale_parameter();
        let theora = self.video.lock().as_ref().map(|pumpe| TheoraAnkuendigung {
            headers: pumpe.headers().to_vec(),
            video_groesse: self.config.video.groesse,
        });
        let anfrage = ConnectRequest {
            speex_frame_groesse: parameter.speex_frame_groesse,
            speex_paket_groesse: parameter.speex_paket_groesse,
            speex_paket_puffer_kapazitaet: self.config.audio.jitter_puffer_groesse,
            theora,
        };
        debug!(
            audio = parameter.sendet_audio(),
            video = parameter.hat_theora,
            "Connect-Request gesendet"
        );
        anfrage.schreiben(pipe)?;
        Ok(())
    }

    fn empfange_connect_reply(&self, _pipe: &mut dyn Pipe) -> PluginResult<()> {
        // Agora haengt der Antwort keinen eigenen Koerper an
        info!("Mit Kollaborations-Server verbunden");
        Ok(())
    }

    fn empfange_connect_reject(&self, _pipe: &mut dyn Pipe) -> PluginResult<()> {
        // Sende-Betrieb abbauen; bestehende Remote-Zustaende bleiben
        // unberuehrt, das Host-Framework raeumt die Sitzung ab
        warn!("Verbindung vom Server abgelehnt, Sendebetrieb eingestellt");
        *self.audio.lock() = None;
        *self.video.lock() = None;
        Ok(())
    }

    fn sende_client_update(&self, pipe: &mut dyn Pipe) -> PluginResult<()> {
        let parameter = self.lokale_parameter();

        let audio = {
            let sender = self.audio.lock();
            sender.as_ref().map(|sender| AudioUpdate {
                pakete: sender.pumpe.entnehme_pakete(),
                kopf_position: *self.lokale_kopf_position.lock(),
            })
        };

        let video = {
            let pumpe = self.video.lock();
            pumpe.as_ref().map(|pumpe| VideoUpdate {
                paket: pumpe.neues_paket(),
                transform: *self.video_transform.lock(),
            })
        };

        if let Some(audio) = &audio {
            self.metriken
                .speex_packets_sent_total
                .inc_by(audio.pakete.len() as f64);
        }
        if video.as_ref().is_some_and(|video| video.paket.is_some()) {
            self.metriken.video_packets_sent_total.inc();
        }

        UpdateNachricht { audio, video }.schreiben(pipe, &parameter)?;
        Ok(())
    }

    fn empfange_client_connect(
        &self,
        id: ClientId,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<Self::Remote> {
        let weiterleitung = ConnectForward::lesen(pipe)?;
        info!(client = %id, "Connect-Forward empfangen");
        Ok(RemoteClientState::neu(
            &weiterleitung,
            Arc::clone(&self.fabrik),
            self.config.audio.jitter_puffer_groesse as usize,
            self.config.audio.speex_sample_rate,
        ))
    }

    fn empfange_server_update(
        &self,
        remote: &Self::Remote,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()> {
        let zusammenfassung = remote.verarbeite_server_update(pipe)?;
        self.metriken
            .speex_packets_received_total
            .inc_by(zusammenfassung.audio_pakete as f64);
        if zusammenfassung.hat_video_paket {
            self.metriken.video_packets_received_total.inc();
        }
        Ok(())
    }

    fn empfange_client_disconnect(&self, id: ClientId, remote: Self::Remote) {
        // Drop beendet Decoder-Thread und Wiedergabe
        info!(client = %id, "Entfernter Client getrennt");
        drop(remote);
    }

    fn frame(&self) {
        // Kodierung laeuft mit Tick-Rate, Capture mit Geraeterate
        if let Some(pumpe) = self.video.lock().as_ref() {
            pumpe.tick();
        }
    }

    fn frame_remote(&self, remote: &Self::Remote) {
        remote.frame();
    }

    fn gl_render_action(&self, remote: &Self::Remote) {
        remote.gl_render();
    }

    fn al_render_action(&self, remote: &Self::Remote) {
        remote.al_render();
    }
}
