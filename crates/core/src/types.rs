//! Gemeinsame Typen fuer das Agora-Protokoll
//!
//! Client-IDs verwenden das Newtype-Pattern um Verwechslungen mit anderen
//! numerischen Werten zur Compilezeit auszuschliessen. Die Geometrietypen
//! beschreiben Positionen und die Billboard-Transformation im
//! Navigationsraum des jeweiligen Senders.

use serde::{Deserialize, Serialize};

/// Skalartyp des Navigationsraums
pub type Scalar = f64;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// Server-weit eindeutige Client-ID, vergeben vom Host-Framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Gibt den inneren Wert zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// Ein Punkt im Navigationsraum eines Clients
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Scalar,
    pub y: Scalar,
    pub z: Scalar,
}

impl Point {
    /// Erstellt einen Punkt aus drei Komponenten
    pub fn neu(x: Scalar, y: Scalar, z: Scalar) -> Self {
        Self { x, y, z }
    }

    /// Gibt die Komponenten als Array zurueck
    pub fn komponenten(&self) -> [Scalar; 3] {
        [self.x, self.y, self.z]
    }

    /// Erstellt einen Punkt aus einem Komponenten-Array
    pub fn aus_komponenten(k: [Scalar; 3]) -> Self {
        Self {
            x: k[0],
            y: k[1],
            z: k[2],
        }
    }
}

// ---------------------------------------------------------------------------
// VideoTransform
// ---------------------------------------------------------------------------

/// Starre Aehnlichkeitstransformation vom Video-Billboard-Raum eines
/// Senders in dessen Navigationsraum
///
/// Besteht aus Translation, Einheits-Quaternion (x, y, z, w) und uniformer
/// Skalierung. Wird pro Tick mit dem Client-Update uebertragen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoTransform {
    /// Translation in den Navigationsraum
    pub translation: Point,
    /// Rotation als Einheits-Quaternion (x, y, z, w)
    pub rotation: [Scalar; 4],
    /// Uniforme Skalierung
    pub skalierung: Scalar,
}

impl VideoTransform {
    /// Die Identitaetstransformation
    pub fn identitaet() -> Self {
        Self {
            translation: Point::default(),
            rotation: [0.0, 0.0, 0.0, 1.0],
            skalierung: 1.0,
        }
    }

    /// Wendet die Transformation auf einen Punkt im Billboard-Raum an
    pub fn transformiere(&self, p: Point) -> Point {
        // Skalierung, dann Quaternion-Rotation v' = v + 2*qv x (qv x v + w*v)
        let v = [
            p.x * self.skalierung,
            p.y * self.skalierung,
            p.z * self.skalierung,
        ];
        let q = &self.rotation;
        let t = [
            2.0 * (q[1] * v[2] - q[2] * v[1]),
            2.0 * (q[2] * v[0] - q[0] * v[2]),
            2.0 * (q[0] * v[1] - q[1] * v[0]),
        ];
        Point::neu(
            v[0] + q[3] * t[0] + (q[1] * t[2] - q[2] * t[1]) + self.translation.x,
            v[1] + q[3] * t[1] + (q[2] * t[0] - q[0] * t[2]) + self.translation.y,
            v[2] + q[3] * t[2] + (q[0] * t[1] - q[1] * t[0]) + self.translation.z,
        )
    }
}

impl Default for VideoTransform {
    fn default() -> Self {
        Self::identitaet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_display() {
        let id = ClientId(7);
        assert_eq!(id.to_string(), "client:7");
    }

    #[test]
    fn punkt_komponenten_round_trip() {
        let p = Point::neu(1.0, -2.5, 3.25);
        assert_eq!(Point::aus_komponenten(p.komponenten()), p);
    }

    #[test]
    fn identitaet_laesst_punkt_unveraendert() {
        let t = VideoTransform::identitaet();
        let p = Point::neu(1.0, 2.0, 3.0);
        assert_eq!(t.transformiere(p), p);
    }

    #[test]
    fn translation_und_skalierung() {
        let t = VideoTransform {
            translation: Point::neu(10.0, 0.0, 0.0),
            rotation: [0.0, 0.0, 0.0, 1.0],
            skalierung: 2.0,
        };
        let p = t.transformiere(Point::neu(1.0, 1.0, 0.0));
        assert_eq!(p, Point::neu(12.0, 2.0, 0.0));
    }

    #[test]
    fn rotation_um_z_achse() {
        // 90 Grad um Z: (x, y) -> (-y, x)
        let s = (std::f64::consts::FRAC_PI_4).sin();
        let c = (std::f64::consts::FRAC_PI_4).cos();
        let t = VideoTransform {
            translation: Point::default(),
            rotation: [0.0, 0.0, s, c],
            skalierung: 1.0,
        };
        let p = t.transformiere(Point::neu(1.0, 0.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
        assert!((p.z - 0.0).abs() < 1e-12);
    }
}
