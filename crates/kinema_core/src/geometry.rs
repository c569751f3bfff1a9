//! Geometry and color primitives shared by the style and animation crates

/// RGBA color with 0–255 channels and 0–1 alpha
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(255.0, 255.0, 255.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn channels(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// 4x4 matrix, column-major
///
/// Columns act on column vectors, so `cols[3]` holds the translation. In
/// DOMMatrix naming `m{i}{j}` is `cols[i - 1][j - 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub cols: [[f64; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Build from 16 values in column-major order (`matrix3d` order)
    pub fn from_cols_array(values: [f64; 16]) -> Self {
        let mut cols = [[0.0; 4]; 4];
        for (i, col) in cols.iter_mut().enumerate() {
            col.copy_from_slice(&values[i * 4..i * 4 + 4]);
        }
        Self { cols }
    }

    pub fn to_cols_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (i, col) in self.cols.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(col);
        }
        out
    }

    /// 2D affine `matrix(a, b, c, d, e, f)`
    pub fn affine(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            cols: [
                [a, b, 0.0, 0.0],
                [c, d, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [e, f, 0.0, 1.0],
            ],
        }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    pub fn scale(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [x, 0.0, 0.0, 0.0],
                [0.0, y, 0.0, 0.0],
                [0.0, 0.0, z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_x(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, s, 0.0],
                [0.0, -s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_y(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            cols: [
                [c, 0.0, -s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn rotation_z(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Skew by angles (radians) along x and y
    pub fn skew(ax: f64, ay: f64) -> Self {
        Self {
            cols: [
                [1.0, ay.tan(), 0.0, 0.0],
                [ax.tan(), 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub fn perspective(distance: f64) -> Self {
        let mut m = Self::IDENTITY;
        if distance != 0.0 {
            m.cols[2][3] = -1.0 / distance;
        }
        m
    }

    /// Multiply two matrices (`self * other`, `other` applied first)
    pub fn mul(&self, other: &Mat4) -> Mat4 {
        let mut result = [[0.0f64; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    result[i][j] += self.cols[k][j] * other.cols[i][k];
                }
            }
        }
        Mat4 { cols: result }
    }

    pub fn is_identity(&self) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(Self::IDENTITY.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() < 1e-12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_composition() {
        let m = Mat4::translation(10.0, 0.0, 0.0).mul(&Mat4::translation(0.0, 5.0, 1.0));
        assert_eq!(m.cols[3], [10.0, 5.0, 1.0, 1.0]);
    }

    #[test]
    fn test_cols_array_round_trip() {
        let values = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        ];
        assert_eq!(Mat4::from_cols_array(values).to_cols_array(), values);
    }

    #[test]
    fn test_rotation_z_matches_affine() {
        let angle = std::f64::consts::FRAC_PI_2;
        let m = Mat4::rotation_z(angle);
        assert!((m.cols[0][1] - 1.0).abs() < 1e-12);
        assert!((m.cols[1][0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity() {
        assert!(Mat4::IDENTITY.is_identity());
        assert!(!Mat4::scale(2.0, 1.0, 1.0).is_identity());
    }
}
