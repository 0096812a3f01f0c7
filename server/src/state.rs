//! Per-Client-Zustand des Agora-Servers
//!
//! Der Empfangs-Thread eines Clients schreibt in die Producer-Haelften,
//! der Server-Tick liest die Consumer-Haelften; beide Seiten tragen
//! eigene Mutexe, sodass Empfang und Fan-out nie um dasselbe Lock
//! konkurrieren. Der Theora-Header-Blob ist nach dem Connect
//! unveraenderlich und wird fuer Spaeteinsteiger vorgehalten.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use agora_buffers::{
    DropoutBuffer, DropoutConsumer, DropoutProducer, TripleBuffer, TripleConsumer, TripleProducer,
};
use agora_core::{Point, Scalar, VideoTransform};
use agora_protocol::{ConnectRequest, StreamParameter, VideoPacket};

/// Audio-Seite eines Clients auf dem Server
pub(crate) struct AudioZustand {
    /// Empfangs-Thread-Seite der Paket-Warteschlange
    pub eingang: Mutex<DropoutProducer<u8>>,
    /// Tick-Seite der Paket-Warteschlange
    pub ausgang: Mutex<DropoutConsumer<u8>>,
    /// Juengste Kopfposition des Clients
    pub kopf_position: Mutex<Point>,
}

/// Video-Seite eines Clients auf dem Server
pub(crate) struct VideoZustand {
    /// Unveraenderlicher Header-Blob fuer Spaeteinsteiger
    pub theora_headers: Vec<u8>,
    pub video_groesse: [Scalar; 2],
    pub paket_eingang: Mutex<TripleProducer<VideoPacket>>,
    pub paket_ausgang: Mutex<TripleConsumer<VideoPacket>>,
    pub transform_eingang: Mutex<TripleProducer<VideoTransform>>,
    pub transform_ausgang: Mutex<TripleConsumer<VideoTransform>>,
}

/// Vollstaendiger Zustandsblock eines verbundenen Clients
pub(crate) struct ClientState {
    pub parameter: StreamParameter,
    pub audio: Option<AudioZustand>,
    pub video: Option<VideoZustand>,
    /// Phase-1-Schnappschuss: Anzahl eingefrorener SPEEX-Pakete
    pub anzahl_gesperrte_pakete: AtomicUsize,
    /// Phase-1-Schnappschuss: ob ein frisches Video-Paket vorliegt
    pub hat_neues_video_paket: AtomicBool,
}

impl ClientState {
    /// Legt den Zustand aus einem gueltigen Connect-Request an;
    /// `paket_puffer_kapazitaet` ist der bereits geklemmte Hinweis.
    pub fn aus_anfrage(anfrage: ConnectRequest, paket_puffer_kapazitaet: usize) -> Self {
        let parameter = anfrage.parameter();

        let audio = parameter.sendet_audio().then(|| {
            let (eingang, ausgang) = DropoutBuffer::neu::<u8>(
                anfrage.speex_paket_groesse as usize,
                paket_puffer_kapazitaet,
            );
            AudioZustand {
                eingang: Mutex::new(eingang),
                ausgang: Mutex::new(ausgang),
                kopf_position: Mutex::new(Point::default()),
            }
        });

        let video = anfrage.theora.map(|ankuendigung| {
            let (paket_eingang, paket_ausgang) = TripleBuffer::neu(VideoPacket::default());
            let (transform_eingang, transform_ausgang) =
                TripleBuffer::neu(VideoTransform::identitaet());
            VideoZustand {
                theora_headers: ankuendigung.headers,
                video_groesse: ankuendigung.video_groesse,
                paket_eingang: Mutex::new(paket_eingang),
                paket_ausgang: Mutex::new(paket_ausgang),
                transform_eingang: Mutex::new(transform_eingang),
                transform_ausgang: Mutex::new(transform_ausgang),
            }
        });

        Self {
            parameter,
            audio,
            video,
            anzahl_gesperrte_pakete: AtomicUsize::new(0),
            hat_neues_video_paket: AtomicBool::new(false),
        }
    }

    /// Phase-1-Schnappschuss lesen (nur auf dem Tick-Thread gueltig)
    pub fn gesperrte_pakete(&self) -> usize {
        self.anzahl_gesperrte_pakete.load(Ordering::Acquire)
    }

    pub fn setze_gesperrte_pakete(&self, anzahl: usize) {
        self.anzahl_gesperrte_pakete.store(anzahl, Ordering::Release);
    }

    pub fn neues_video_paket(&self) -> bool {
        self.hat_neues_video_paket.load(Ordering::Acquire)
    }

    pub fn setze_neues_video_paket(&self, frisch: bool) {
        self.hat_neues_video_paket.store(frisch, Ordering::Release);
    }
}
