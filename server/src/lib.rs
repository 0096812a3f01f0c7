//! agora-server – Server-Plugin des Agora-Protokolls
//!
//! Der Server ist ein reiner N:N-Weiterleiter: er mischt nicht, kodiert
//! nicht um und haelt pro Client nur den Zustand, den der Fan-out
//! braucht. Der Tick des Host-Frameworks laeuft in drei Phasen:
//!
//! 1. `vor_server_update` friert fuer jede Quelle den Paketstapel und
//!    die Video-Frische ein.
//! 2. `sende_server_update` schreibt fuer jedes Paar (Quelle, Ziel)
//!    denselben eingefrorenen Schnappschuss.
//! 3. `nach_server_update` gibt die Stapel frei.
//!
//! Damit erhaelt jedes Ziel innerhalb eines Ticks denselben Stand jeder
//! Quelle, und kein Empfangs-Thread blockiert waehrend des Fan-outs.

pub mod config;
mod state;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use agora_core::ClientId;
use agora_observability::AgoraMetriken;
use agora_plugin::{PluginError, PluginResult, ProtocolServer};
use agora_protocol::{
    ConnectForward, ConnectRequest, Pipe, TheoraAnkuendigung, UpdateNachricht,
    ANZAHL_NACHRICHTEN, PROTOKOLL_NAME,
};

pub use config::ServerConfig;
use state::ClientState;

/// Server-Objekt des Agora-Protokolls
pub struct AgoraServer {
    config: ServerConfig,
    /// Seitentabelle: per-Client-Zustand, adressiert ueber die Host-ID
    clients: DashMap<ClientId, ClientState>,
    metriken: AgoraMetriken,
}

impl AgoraServer {
    pub fn neu(config: ServerConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
            metriken: AgoraMetriken::neu().expect("Metriken-Initialisierung fehlgeschlagen"),
        }
    }

    /// Anzahl aktuell bekannter Clients
    pub fn anzahl_clients(&self) -> usize {
        self.clients.len()
    }

    /// Prometheus-Metriken dieses Servers; der Host liefert sie aus
    pub fn metriken(&self) -> &AgoraMetriken {
        &self.metriken
    }

    fn client(
        &self,
        id: ClientId,
        hook: &'static str,
    ) -> PluginResult<dashmap::mapref::one::Ref<'_, ClientId, ClientState>> {
        self.clients.get(&id).ok_or_else(|| {
            // Zustand fehlt obwohl der Host die ID kennt
            error!(client = %id, hook, "Client-Zustand fehlt");
            PluginError::UnbekannterClient(id)
        })
    }
}

impl ProtocolServer for AgoraServer {
    fn name(&self) -> &'static str {
        PROTOKOLL_NAME
    }

    fn anzahl_nachrichten(&self) -> u32 {
        ANZAHL_NACHRICHTEN
    }

    fn empfange_connect_request(
        &self,
        id: ClientId,
        nachrichten_laenge: usize,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()> {
        // Bei jedem Fehler hier bleibt kein Zustandsobjekt zurueck;
        // das Host-Framework verwirft den Verbindungsversuch
        let anfrage = ConnectRequest::lesen(pipe, nachrichten_laenge)?;
        let kapazitaet = self
            .config
            .kapazitaet_klemmen(anfrage.speex_paket_puffer_kapazitaet);
        if kapazitaet < anfrage.speex_paket_puffer_kapazitaet as usize {
            warn!(
                client = %id,
                hinweis = anfrage.speex_paket_puffer_kapazitaet,
                kapazitaet,
                "Kapazitaets-Hinweis geklemmt"
            );
        }

        info!(
            client = %id,
            audio = anfrage.parameter().sendet_audio(),
            video = anfrage.parameter().hat_theora,
            kapazitaet,
            "Client verbunden"
        );
        if self
            .clients
            .insert(id, ClientState::aus_anfrage(anfrage, kapazitaet))
            .is_some()
        {
            warn!(client = %id, "Bestehender Client-Zustand ersetzt");
        }
        self.metriken
            .connected_clients
            .set(self.clients.len() as f64);
        Ok(())
    }

    fn empfange_client_update(&self, id: ClientId, pipe: &mut dyn Pipe) -> PluginResult<()> {
        let client = self.client(id, "empfange_client_update")?;
        let update = UpdateNachricht::lesen(pipe, &client.parameter)?;

        if let (Some(audio), Some(zustand)) = (&update.audio, &client.audio) {
            let mut eingang = zustand.eingang.lock();
            for paket in &audio.pakete {
                eingang.push_segment(paket);
            }
            *zustand.kopf_position.lock() = audio.kopf_position;
            self.metriken
                .speex_packets_received_total
                .inc_by(audio.pakete.len() as f64);
        }

        if let (Some(video), Some(zustand)) = (update.video, &client.video) {
            if let Some(paket) = video.paket {
                zustand.paket_eingang.lock().schreiben(paket);
                self.metriken.video_packets_received_total.inc();
            }
            zustand.transform_eingang.lock().schreiben(video.transform);
        }

        Ok(())
    }

    fn sende_client_connect(
        &self,
        quelle: ClientId,
        ziel: ClientId,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()> {
        let client = self.client(quelle, "sende_client_connect")?;
        let weiterleitung = ConnectForward {
            speex_frame_groesse: client.parameter.speex_frame_groesse,
            speex_paket_groesse: client.parameter.speex_paket_groesse,
            theora: client.video.as_ref().map(|video| TheoraAnkuendigung {
                headers: video.theora_headers.clone(),
                video_groesse: video.video_groesse,
            }),
        };
        weiterleitung.schreiben(pipe)?;
        debug!(quelle = %quelle, ziel = %ziel, "Connect-Forward gesendet");
        Ok(())
    }

    fn vor_server_update(&self, id: ClientId) -> PluginResult<()> {
        let client = self.client(id, "vor_server_update")?;

        let anzahl = match &client.audio {
            Some(zustand) => zustand.ausgang.lock().sperren(),
            None => 0,
        };
        client.setze_gesperrte_pakete(anzahl);

        let frisch = match &client.video {
            Some(zustand) => {
                // Transformation im selben Zug uebernehmen; sie wird in
                // jedem Server-Update geschrieben, frisch oder nicht
                zustand.transform_ausgang.lock().neuer_wert();
                zustand.paket_ausgang.lock().neuer_wert()
            }
            None => false,
        };
        client.setze_neues_video_paket(frisch);

        Ok(())
    }

    fn sende_server_update(
        &self,
        quelle: ClientId,
        _ziel: ClientId,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()> {
        let client = self.client(quelle, "sende_server_update")?;

        if let Some(zustand) = &client.audio {
            let anzahl = client.gesperrte_pakete();
            pipe.write_u16(anzahl as u16)?;
            let ausgang = zustand.ausgang.lock();
            for i in 0..anzahl {
                pipe.write_bytes(ausgang.gesperrtes_segment(i))?;
            }
            drop(ausgang);
            pipe.write_point(&zustand.kopf_position.lock())?;
            self.metriken
                .speex_packets_forwarded_total
                .inc_by(anzahl as f64);
        }

        if let Some(zustand) = &client.video {
            if client.neues_video_paket() {
                pipe.write_u8(1)?;
                zustand.paket_ausgang.lock().aktueller_wert().schreiben(pipe)?;
                self.metriken.video_packets_forwarded_total.inc();
            } else {
                pipe.write_u8(0)?;
            }
            pipe.write_transform(zustand.transform_ausgang.lock().aktueller_wert())?;
        }

        Ok(())
    }

    fn nach_server_update(&self, id: ClientId) -> PluginResult<()> {
        let client = self.client(id, "nach_server_update")?;
        if let Some(zustand) = &client.audio {
            zustand.ausgang.lock().entsperren();
        }
        client.setze_gesperrte_pakete(0);
        Ok(())
    }

    fn empfange_client_disconnect(&self, id: ClientId) {
        if self.clients.remove(&id).is_some() {
            info!(client = %id, "Client getrennt");
        } else {
            warn!(client = %id, "Trennung fuer unbekannten Client");
        }
        self.metriken
            .connected_clients
            .set(self.clients.len() as f64);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
