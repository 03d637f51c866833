//! Conversions from flat JavaScript arrays into core types.

use anyhow::{bail, Result};
use nalgebra::Vector3;
use skirt_core::{Axis, Direction, SetupSettings};

pub(crate) fn parse_settings(
    axis: &str,
    direction: &str,
    select_only: bool,
    create_rig: bool,
) -> Result<SetupSettings> {
    Ok(SetupSettings {
        axis: axis.parse::<Axis>()?,
        direction: direction.parse::<Direction>()?,
        select_only,
        create_rig,
    })
}

/// Reads `[x0, y0, z0, x1, ...]` as vectors.
pub(crate) fn vectors_from_flat(values: &[f64], label: &str) -> Result<Vec<Vector3<f64>>> {
    if values.len() % 3 != 0 {
        bail!(
            "{} length ({}) is not a multiple of three.",
            label,
            values.len()
        );
    }
    Ok(values
        .chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect())
}

/// Splits a flat index list into polygons of the given sizes.
pub(crate) fn polygons_from_flat(indices: &[u32], sizes: &[u32]) -> Result<Vec<Vec<usize>>> {
    let total: usize = sizes.iter().map(|&s| s as usize).sum();
    if total != indices.len() {
        bail!(
            "Polygon sizes sum to {} but {} indices were given.",
            total,
            indices.len()
        );
    }
    let mut polygons = Vec::with_capacity(sizes.len());
    let mut offset = 0usize;
    for &size in sizes {
        let size = size as usize;
        if size < 3 {
            bail!("Polygon with {} corners; at least three are required.", size);
        }
        polygons.push(
            indices[offset..offset + size]
                .iter()
                .map(|&i| i as usize)
                .collect(),
        );
        offset += size;
    }
    Ok(polygons)
}
