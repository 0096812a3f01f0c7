//! Triple-Buffer – wartefreier SPSC Letzter-Wert-Slot
//!
//! Drei Speicherzellen und ein atomares Zustandswort, das den Index der
//! Bereit-Zelle und ein Frisch-Bit buendelt. Der Producer veroeffentlicht
//! durch atomaren Tausch seiner Zelle mit der Bereit-Zelle; der Consumer
//! uebernimmt die Bereit-Zelle auf dieselbe Weise. Keine Seite wartet je
//! auf die andere; Werte, die schneller produziert als konsumiert werden,
//! gehen verloren (der neueste gewinnt).
//!
//! Uebertraegt Kopfpositionen, Video-Transformationen, Video-Frames und
//! Video-Pakete zwischen den Threads einer Agora-Sitzung.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Maske fuer den Zellen-Index im Zustandswort
const INDEX_MASKE: u8 = 0b011;
/// Frisch-Bit: gesetzt sobald der Producer veroeffentlicht hat
const FRISCH: u8 = 0b100;

struct Kern<T> {
    /// Bits 0-1: Index der Bereit-Zelle; Bit 2: Frisch-Bit.
    /// Jede Zelle gehoert zu jedem Zeitpunkt genau einer Seite; der
    /// Besitzerwechsel laeuft ausschliesslich ueber swap auf diesem Wort.
    zustand: AtomicU8,
    zellen: [UnsafeCell<T>; 3],
}

unsafe impl<T: Send> Send for Kern<T> {}
unsafe impl<T: Send> Sync for Kern<T> {}

/// Wartefreier Letzter-Wert-Slot, aufgeteilt in Producer und Consumer
pub struct TripleBuffer;

impl TripleBuffer {
    /// Erstellt einen Triple-Buffer; alle drei Zellen starten mit Klonen
    /// des Startwerts. Vor der ersten Veroeffentlichung liefert der
    /// Consumer den Startwert.
    pub fn neu<T: Clone>(startwert: T) -> (TripleProducer<T>, TripleConsumer<T>) {
        let kern = Arc::new(Kern {
            zustand: AtomicU8::new(1),
            zellen: [
                UnsafeCell::new(startwert.clone()),
                UnsafeCell::new(startwert.clone()),
                UnsafeCell::new(startwert),
            ],
        });
        (
            TripleProducer {
                kern: Arc::clone(&kern),
                zelle: 0,
            },
            TripleConsumer { kern, zelle: 2 },
        )
    }
}

// ---------------------------------------------------------------------------
// Producer-Haelfte
// ---------------------------------------------------------------------------

/// Schreibende Haelfte des Triple-Buffers
pub struct TripleProducer<T> {
    kern: Arc<Kern<T>>,
    /// Zelle, die aktuell exklusiv dem Producer gehoert
    zelle: u8,
}

impl<T> TripleProducer<T> {
    /// Gibt die Schreibzelle fuer den naechsten Wert zurueck.
    ///
    /// Der Wert wird erst mit [`veroeffentlichen`](Self::veroeffentlichen)
    /// fuer den Consumer sichtbar.
    pub fn naechster_wert(&mut self) -> &mut T {
        // Die Zelle gehoert bis zum naechsten Tausch exklusiv dem Producer.
        unsafe { &mut *self.kern.zellen[self.zelle as usize].get() }
    }

    /// Veroeffentlicht die Schreibzelle und uebernimmt die bisherige
    /// Bereit-Zelle als neue Schreibzelle. Wartefrei.
    pub fn veroeffentlichen(&mut self) {
        let alt = self
            .kern
            .zustand
            .swap(self.zelle | FRISCH, Ordering::AcqRel);
        self.zelle = alt & INDEX_MASKE;
    }

    /// Bequemlichkeit: schreibt und veroeffentlicht einen Wert.
    pub fn schreiben(&mut self, wert: T) {
        *self.naechster_wert() = wert;
        self.veroeffentlichen();
    }
}

// ---------------------------------------------------------------------------
// Consumer-Haelfte
// ---------------------------------------------------------------------------

/// Lesende Haelfte des Triple-Buffers
pub struct TripleConsumer<T> {
    kern: Arc<Kern<T>>,
    /// Zelle, die aktuell exklusiv dem Consumer gehoert
    zelle: u8,
}

impl<T> TripleConsumer<T> {
    /// Uebernimmt die Bereit-Zelle, falls seit dem letzten Aufruf
    /// veroeffentlicht wurde. Gibt `true` zurueck wenn
    /// [`aktueller_wert`](Self::aktueller_wert) nun einen neuen Wert zeigt.
    /// Wartefrei.
    pub fn neuer_wert(&mut self) -> bool {
        if self.kern.zustand.load(Ordering::Acquire) & FRISCH == 0 {
            return false;
        }
        // Nur der Consumer loescht das Frisch-Bit; zwischen Pruefung und
        // Tausch kann der Producer hoechstens erneut veroeffentlichen –
        // dann uebernehmen wir den noch neueren Wert.
        let alt = self.kern.zustand.swap(self.zelle, Ordering::AcqRel);
        self.zelle = alt & INDEX_MASKE;
        true
    }

    /// Gibt den zuletzt uebernommenen Wert zurueck (vor der ersten
    /// Uebernahme: den Startwert).
    pub fn aktueller_wert(&self) -> &T {
        unsafe { &*self.kern.zellen[self.zelle as usize].get() }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
