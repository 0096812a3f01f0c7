//! Mikrofon-Capture-Uebergabe
//!
//! Das Aufnahmegeraet selbst gehoert dem Host; es schreibt PCM-Samples
//! aus seinem Callback-Thread in einen lock-free Ring-Buffer, aus dem der
//! Encoder-Thread liest. Die Geraete-Oeffnung liefert ein Handle, das den
//! Strom am Leben haelt, und die Consumer-Haelfte des Rings.

use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Konfiguration fuer den Audio-Capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Abtastrate in Hz
    pub sample_rate: u32,
    /// Ring-Buffer Kapazitaet in Samples
    pub puffer_groesse: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            puffer_groesse: 16_000 * 2, // 2 Sekunden Puffer
        }
    }
}

/// Produziert Samples aus dem Geraete-Callback
pub type CaptureProducer = HeapProd<i16>;
/// Konsumiert Samples im Encoder-Thread
pub type CaptureConsumer = HeapCons<i16>;

/// Erstellt den Capture-Ring und teilt ihn in seine Haelften.
///
/// Der Producer laeuft im Callback-Thread des Geraets, der Consumer im
/// Encoder-Thread.
pub fn capture_ring(config: &CaptureConfig) -> (CaptureProducer, CaptureConsumer) {
    use ringbuf::traits::Split;
    HeapRb::<i16>::new(config.puffer_groesse).split()
}

/// Handle auf ein geoeffnetes Mikrofon
///
/// Haelt den Capture-Strom am Leben; Drop stoppt die Aufnahme. Die
/// konkrete Implementierung (Geraetetreiber) liefert der Host ueber
/// die Medienfabrik.
pub trait MikrofonQuelle: Send {
    /// Tatsaechliche Abtastrate des geoeffneten Stroms
    fn sample_rate(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Observer, Producer};

    #[test]
    fn capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate, 16_000);
        assert!(config.puffer_groesse > 0);
    }

    #[test]
    fn ring_uebergabe() {
        let config = CaptureConfig {
            sample_rate: 16_000,
            puffer_groesse: 8,
        };
        let (mut tx, mut rx) = capture_ring(&config);
        assert_eq!(tx.push_slice(&[1i16, 2, 3]), 3);
        assert_eq!(rx.occupied_len(), 3);
        let mut ziel = [0i16; 3];
        assert_eq!(rx.pop_slice(&mut ziel), 3);
        assert_eq!(ziel, [1, 2, 3]);
    }
}
