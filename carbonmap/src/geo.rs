use std::{
    ops::{Index, IndexMut},
    str::FromStr,
};

use geo::{coord, Intersects, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};

/// A bounding box as `[left, bottom, right, top]` in longitude/latitude
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox(pub [f64; 4]);

impl BBox {
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self[0], y: self[1] },
            coord! { x: self[2], y: self[3] },
        )
    }

    pub fn intersects(&self, geometry: &MultiPolygon<f64>) -> bool {
        geometry.intersects(&self.to_rect())
    }
}

impl Index<usize> for BBox {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for BBox {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl FromStr for BBox {
    type Err = &'static str;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|s| s.trim().parse::<f64>().map_err(|_| "Failed to parse bbox"))
            .collect::<Result<Vec<_>, _>>()?;

        if parts.len() != 4 {
            return Err("Bounding boxes need to have 4 coords");
        }
        let mut bbox = [0.0; 4];
        bbox.copy_from_slice(&parts);
        Ok(BBox(bbox))
    }
}
