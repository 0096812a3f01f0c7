//! Medienfabrik – Bereitstellung von Geraeten und Codecs durch den Host
//!
//! Codec-Bibliotheken, Audio- und Videogeraete liegen ausserhalb dieses
//! Repos; der Host reicht beim Erzeugen des Agora-Clients eine Fabrik
//! herein, die die konkreten Implementierungen hinter den Trait-Naehten
//! liefert. Fehlschlagende Geraete-Oeffnungen sind kein Abbruchgrund –
//! der Client faellt in den Nur-Empfangs-Betrieb zurueck.

use agora_audio::{
    CaptureConfig, CaptureConsumer, MikrofonQuelle, SpeexConfig, SpeexDecoder, SpeexEncoder,
    StreamingQuelle,
};
use agora_audio::AudioResult;
use agora_video::{
    BildExtraktor, TheoraConfig, TheoraDecoder, TheoraEncoder, VideoQuelle, VideoResult,
};

use crate::config::VideoFormat;

/// Fabrik fuer Geraete und Codecs
pub trait MedienFabrik: Send + Sync {
    /// Oeffnet das Mikrofon und liefert das Strom-Handle samt
    /// Consumer-Haelfte des Capture-Rings
    fn mikrofon_oeffnen(
        &self,
        config: &CaptureConfig,
    ) -> AudioResult<(Box<dyn MikrofonQuelle>, CaptureConsumer)>;

    /// Erzeugt den lokalen SPEEX-Encoder
    fn speex_encoder(&self, config: &SpeexConfig) -> AudioResult<Box<dyn SpeexEncoder>>;

    /// Erzeugt einen SPEEX-Decoder mit den Groessen eines Senders
    fn speex_decoder(
        &self,
        frame_groesse: usize,
        paket_groesse: usize,
    ) -> AudioResult<Box<dyn SpeexDecoder>>;

    /// Erzeugt eine Streaming-Wiedergabequelle im aktiven Audio-Kontext
    fn streaming_quelle(&self) -> AudioResult<Box<dyn StreamingQuelle>>;

    /// Oeffnet das Videogeraet mit dem gewuenschten Format
    fn video_geraet_oeffnen(
        &self,
        name: &str,
        format: &VideoFormat,
    ) -> VideoResult<Box<dyn VideoQuelle>>;

    /// Erzeugt den Extraktor vom Geraeteformat nach Y'CbCr 4:2:0
    fn bild_extraktor(&self, format: &VideoFormat) -> VideoResult<Box<dyn BildExtraktor>>;

    /// Erzeugt den lokalen Theora-Encoder
    fn theora_encoder(&self, config: &TheoraConfig) -> VideoResult<Box<dyn TheoraEncoder>>;

    /// Erzeugt einen Theora-Decoder aus dem Header-Blob eines Senders
    fn theora_decoder(&self, headers: &[u8]) -> VideoResult<Box<dyn TheoraDecoder>>;
}
