//! Server-seitiger Plugin-Vertrag des Host-Frameworks
//!
//! Der Server-Tick laeuft in drei Phasen: `vor_server_update` friert fuer
//! jede Quelle einen Paketstapel und die Video-Frische ein,
//! `sende_server_update` schreibt fuer jedes Paar (Quelle, Ziel) den
//! eingefrorenen Schnappschuss, `nach_server_update` gibt die Stapel
//! frei. So erhaelt jedes Ziel innerhalb eines Ticks denselben Stand
//! jeder Quelle, und kein Producer blockiert waehrend des Fan-outs.

use agora_core::ClientId;
use agora_protocol::Pipe;

use crate::error::PluginResult;

/// Vertrag eines server-seitigen Protokoll-Plugins
///
/// Der per-Client-Zustand lebt in einer protokolleigenen Seitentabelle,
/// adressiert ueber die vom Host vergebene [`ClientId`].
pub trait ProtocolServer: Send + Sync {
    /// Stabiler Protokollname
    fn name(&self) -> &'static str;

    /// Anzahl protokolleigener Nachrichten-IDs
    fn anzahl_nachrichten(&self) -> u32;

    /// Liest den Connect-Request-Koerper eines neuen Clients und legt
    /// dessen Zustand an.
    ///
    /// `nachrichten_laenge` ist die vom Host gemeldete Koerperlaenge;
    /// jede Abweichung ist ein Protokollfehler und es darf kein
    /// Zustandsobjekt zurueckbleiben.
    fn empfange_connect_request(
        &self,
        id: ClientId,
        nachrichten_laenge: usize,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()>;

    /// Liest den Client-Update-Koerper eines Clients (Empfangs-Thread)
    fn empfange_client_update(&self, id: ClientId, pipe: &mut dyn Pipe) -> PluginResult<()>;

    /// Schreibt den Connect-Forward-Koerper der Quelle an ein Ziel, das
    /// gerade von ihr erfaehrt – auch an Spaeteinsteiger
    fn sende_client_connect(
        &self,
        quelle: ClientId,
        ziel: ClientId,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()>;

    /// Schreibt den Server-Update-Koerper der Quelle an ein Ziel,
    /// basierend auf dem in Phase 1 eingefrorenen Schnappschuss
    fn sende_server_update(
        &self,
        quelle: ClientId,
        ziel: ClientId,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()>;

    /// Phase 1: friert den Paketstapel und die Video-Frische der Quelle ein
    fn vor_server_update(&self, id: ClientId) -> PluginResult<()>;

    /// Phase 3: gibt den Paketstapel der Quelle frei
    fn nach_server_update(&self, id: ClientId) -> PluginResult<()>;

    /// Ein Client hat die Verbindung getrennt; der Zustand wird entfernt
    fn empfange_client_disconnect(&self, id: ClientId);
}
