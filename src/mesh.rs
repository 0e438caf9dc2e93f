// mesh.rs — UV sphere tessellated into latitude bands for triangle-strip drawing

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{PanoramaError, Result};

/// Interleaved vertex handed to the renderer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// One latitude strip. Points come in pairs per azimuth step: the lower
/// edge of the band first, then the upper edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereBand {
    vertices: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
}

impl SphereBand {
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn tex_coords(&self) -> &[[f32; 2]] {
        &self.tex_coords
    }

    /// Number of (lower, upper) vertex pairs in the strip.
    pub fn pair_count(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Vertices zipped with their texture coordinates, in strip order.
    pub fn strip(&self) -> Vec<SphereVertex> {
        self.vertices
            .iter()
            .zip(&self.tex_coords)
            .map(|(position, uv)| SphereVertex {
                position: *position,
                uv: *uv,
            })
            .collect()
    }
}

/// Sphere centered on the origin, built once and never mutated.
///
/// `divisions` is the number of azimuth steps around the full circle; the
/// mesh has `divisions / 2` bands from north to south and each band sweeps
/// half a turn of azimuth steps plus the closing one, which is what the
/// equirectangular U range maps onto.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    radius: f32,
    divisions: usize,
    yaw_offset: f64,
    bands: Vec<SphereBand>,
}

impl SphereMesh {
    pub const MIN_DIVISIONS: usize = 4;
    /// 2048 bands of 2049 vertex pairs; anything finer is no longer visible.
    pub const MAX_DIVISIONS: usize = 4096;

    pub fn generate(radius: f32, divisions: usize, yaw_offset: f64) -> Result<Self> {
        validate(radius, divisions, yaw_offset)?;

        let step = 2.0 * PI / divisions as f64;
        let half = divisions / 2;
        let r = radius as f64;

        let point = |altitude: f64, azimuth: f64| -> [f32; 3] {
            [
                (r * altitude.cos() * azimuth.cos()) as f32,
                (r * altitude.sin()) as f32,
                (r * altitude.cos() * azimuth.sin()) as f32,
            ]
        };

        let mut bands = Vec::with_capacity(half);
        for part in 0..half {
            let altitude = FRAC_PI_2 - part as f64 * step;
            let altitude_next = FRAC_PI_2 - (part + 1) as f64 * step;

            let v_upper = (2 * part) as f32 / divisions as f32;
            let v_lower = (2 * (part + 1)) as f32 / divisions as f32;

            let mut vertices = Vec::with_capacity((half + 1) * 2);
            let mut tex_coords = Vec::with_capacity((half + 1) * 2);

            for sub in 0..=half {
                let azimuth = yaw_offset - sub as f64 * step;
                let u = 1.0 - (2 * sub) as f32 / divisions as f32;

                vertices.push(point(altitude_next, azimuth));
                tex_coords.push([u, v_lower]);

                vertices.push(point(altitude, azimuth));
                tex_coords.push([u, v_upper]);
            }

            bands.push(SphereBand {
                vertices,
                tex_coords,
            });
        }

        log::debug!(
            "sphere mesh generated: radius={} divisions={} bands={}",
            radius,
            divisions,
            bands.len()
        );

        Ok(Self {
            radius,
            divisions,
            yaw_offset,
            bands,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn divisions(&self) -> usize {
        self.divisions
    }

    pub fn yaw_offset(&self) -> f64 {
        self.yaw_offset
    }

    pub fn bands(&self) -> &[SphereBand] {
        &self.bands
    }

    pub fn vertex_count(&self) -> usize {
        self.bands.iter().map(|b| b.vertices.len()).sum()
    }

    /// All bands concatenated. Each band is its own strip, so draw band `i`
    /// as the range `i * strip_len..(i + 1) * strip_len`.
    pub fn strip_vertices(&self) -> Vec<SphereVertex> {
        self.bands.iter().flat_map(SphereBand::strip).collect()
    }

    pub fn strip_len(&self) -> usize {
        (self.divisions / 2 + 1) * 2
    }

    /// True when a mesh with these parameters would be identical to `self`.
    pub fn matches(&self, radius: f32, divisions: usize, yaw_offset: f64) -> bool {
        self.radius == radius && self.divisions == divisions && self.yaw_offset == yaw_offset
    }
}

/// Checks mesh parameters without building anything.
pub fn validate(radius: f32, divisions: usize, yaw_offset: f64) -> Result<()> {
    if divisions < SphereMesh::MIN_DIVISIONS {
        return Err(PanoramaError::InvalidParameter(format!(
            "divisions must be at least {}, got {divisions}",
            SphereMesh::MIN_DIVISIONS
        )));
    }
    if divisions > SphereMesh::MAX_DIVISIONS {
        return Err(PanoramaError::InvalidParameter(format!(
            "divisions must be at most {}, got {divisions}",
            SphereMesh::MAX_DIVISIONS
        )));
    }
    if divisions % 2 != 0 {
        return Err(PanoramaError::InvalidParameter(format!(
            "divisions must be even, got {divisions}"
        )));
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(PanoramaError::InvalidParameter(format!(
            "radius must be a positive finite number, got {radius}"
        )));
    }
    if !yaw_offset.is_finite() {
        return Err(PanoramaError::InvalidParameter(format!(
            "yaw offset must be finite, got {yaw_offset}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(p: [f32; 3]) -> f32 {
        (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn band_layout_for_valid_divisions() {
        for divisions in (4..=64).step_by(2) {
            let mesh = SphereMesh::generate(2.5, divisions, 0.3).unwrap();
            assert_eq!(mesh.bands().len(), divisions / 2);
            for band in mesh.bands() {
                assert_eq!(band.pair_count(), divisions / 2 + 1);
                assert_eq!(band.vertices().len(), band.tex_coords().len());
                assert_eq!(band.strip().len(), mesh.strip_len());
            }
        }
    }

    #[test]
    fn every_vertex_on_the_sphere() {
        let mesh = SphereMesh::generate(7.0, 48, 1.0).unwrap();
        for band in mesh.bands() {
            for &v in band.vertices() {
                assert!((length(v) - 7.0).abs() < 1e-4, "{v:?}");
            }
        }
    }

    #[test]
    fn rejects_odd_and_small_divisions() {
        for divisions in [0, 1, 2, 3, 5, 7, 33] {
            let err = SphereMesh::generate(1.0, divisions, 0.0).unwrap_err();
            assert!(matches!(err, PanoramaError::InvalidParameter(_)));
        }
    }

    #[test]
    fn rejects_oversized_divisions() {
        for divisions in [SphereMesh::MAX_DIVISIONS + 2, usize::MAX - 1] {
            let err = SphereMesh::generate(1.0, divisions, 0.0).unwrap_err();
            assert!(matches!(err, PanoramaError::InvalidParameter(_)));
        }
        assert!(validate(1.0, SphereMesh::MAX_DIVISIONS, 0.0).is_ok());
    }

    #[test]
    fn rejects_bad_radius() {
        for radius in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(SphereMesh::generate(radius, 8, 0.0).is_err());
        }
    }

    #[test]
    fn tex_coords_span_unit_square() {
        let mesh = SphereMesh::generate(1.0, 16, 0.0).unwrap();
        let first = &mesh.bands()[0];
        assert_eq!(first.tex_coords()[0], [1.0, 2.0 / 16.0]);
        assert_eq!(first.tex_coords()[1], [1.0, 0.0]);

        let last = mesh.bands().last().unwrap();
        let n = last.tex_coords().len();
        assert_eq!(last.tex_coords()[n - 2], [0.0, 1.0]);
        assert_eq!(last.tex_coords()[n - 1], [0.0, 14.0 / 16.0]);
    }

    #[test]
    fn yaw_offset_rotates_seam() {
        let offset = std::f64::consts::FRAC_PI_2;
        let mesh = SphereMesh::generate(1.0, 8, offset).unwrap();
        // upper edge of band 2 sits on the equator at the seam azimuth
        let p = mesh.bands()[2].vertices()[1];
        assert!(p[0].abs() < 1e-6);
        assert!(p[1].abs() < 1e-6);
        assert!((p[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn matches_only_same_parameters() {
        let mesh = SphereMesh::generate(1.0, 8, 0.0).unwrap();
        assert!(mesh.matches(1.0, 8, 0.0));
        assert!(!mesh.matches(1.0, 10, 0.0));
        assert!(!mesh.matches(2.0, 8, 0.0));
    }
}
