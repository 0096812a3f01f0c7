//! Client-seitiger Plugin-Vertrag des Host-Frameworks
//!
//! Das Host-Framework besitzt Transport, Frame-Tick und Client-Lifecycle;
//! ein Protokoll-Plugin haengt sich ueber diese Hooks ein. Die Receive-
//! Hooks laufen auf dem Empfangs-Thread des Hosts, die Frame- und
//! Render-Hooks auf dem Haupt-Thread – Implementierungen muessen daher
//! `Send + Sync` sein und ihren Zustand intern einteilen.

use agora_core::ClientId;
use agora_protocol::Pipe;

use crate::error::PluginResult;

/// Vertrag eines client-seitigen Protokoll-Plugins
pub trait ProtocolClient: Send + Sync {
    /// Protokoll-spezifischer Zustand pro entferntem Client; das
    /// Host-Framework besitzt ihn und reicht ihn in die Hooks zurueck.
    type Remote: Send + Sync;

    /// Stabiler Protokollname fuer die Registrierung
    fn name(&self) -> &'static str;

    /// Anzahl protokolleigener Nachrichten-IDs
    fn anzahl_nachrichten(&self) -> u32;

    /// Haengt den Connect-Request-Koerper an die Verbindungsanfrage an
    fn sende_connect_request(&self, pipe: &mut dyn Pipe) -> PluginResult<()>;

    /// Verarbeitet den Koerper einer positiven Verbindungsantwort
    fn empfange_connect_reply(&self, pipe: &mut dyn Pipe) -> PluginResult<()>;

    /// Verarbeitet eine Ablehnung; das Plugin faellt in einen
    /// unverbundenen Zustand zurueck
    fn empfange_connect_reject(&self, pipe: &mut dyn Pipe) -> PluginResult<()>;

    /// Schreibt den Client-Update-Koerper des laufenden Ticks
    fn sende_client_update(&self, pipe: &mut dyn Pipe) -> PluginResult<()>;

    /// Ein entfernter Client ist der Sitzung beigetreten; liest den
    /// Connect-Forward-Koerper und erzeugt den per-Remote-Zustand
    fn empfange_client_connect(
        &self,
        id: ClientId,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<Self::Remote>;

    /// Verarbeitet den Server-Update-Koerper einer Quelle
    fn empfange_server_update(
        &self,
        remote: &Self::Remote,
        pipe: &mut dyn Pipe,
    ) -> PluginResult<()>;

    /// Ein entfernter Client hat die Sitzung verlassen; der Zustand
    /// wird an das Plugin zur Zerstoerung zurueckgegeben
    fn empfange_client_disconnect(&self, id: ClientId, remote: Self::Remote);

    /// Einmal pro Tick auf dem Haupt-Thread
    fn frame(&self);

    /// Einmal pro Tick und entferntem Client auf dem Haupt-Thread
    fn frame_remote(&self, remote: &Self::Remote);

    /// GL-Render-Pass fuer einen entfernten Client
    fn gl_render_action(&self, remote: &Self::Remote);

    /// AL-Render-Pass fuer einen entfernten Client; treibt die
    /// Audio-Wiedergabe
    fn al_render_action(&self, remote: &Self::Remote);
}
