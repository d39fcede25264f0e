//! Top-down preview renderer for [`MemoryScene`](crate::MemoryScene)
//!
//! Not a renderer in any real sense: each mesh object is drawn as its
//! footprint on the XY plane, viewed from above, filled with its material's
//! base color. Enough to check where things ended up.

use std::fs;
use std::path::Path;

use glam::{DVec2, DVec3};
use image::{ImageFormat, Rgb, RgbImage};

use crate::scene::{Primitive, SceneError};

const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

/// Fraction of the image left empty on each side
const MARGIN: f64 = 0.1;

/// Inner radius of a torus footprint relative to its outer radius
const TORUS_INNER: f64 = 0.6;

/// One mesh object as the preview sees it
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewItem {
    pub primitive: Primitive,
    pub location: DVec3,
    pub rotation: DVec3,
    pub scale: DVec3,
    /// Linear RGBA
    pub color: [f64; 4],
}

impl PreviewItem {
    fn half_extents(&self) -> DVec2 {
        let base = match self.primitive {
            Primitive::Torus => 1.25,
            _ => 1.0,
        };
        self.scale.truncate().abs() * base
    }

    /// Radius of a circle enclosing the footprint at any rotation
    fn radius(&self) -> f64 {
        self.half_extents().length()
    }

    fn covers(&self, point: DVec2) -> bool {
        let half = self.half_extents();
        if half.x <= 0.0 || half.y <= 0.0 {
            return false;
        }

        let offset = point - self.location.truncate();
        let (sin, cos) = (-self.rotation.z).sin_cos();
        let local = DVec2::new(
            offset.x * cos - offset.y * sin,
            offset.x * sin + offset.y * cos,
        );

        match self.primitive {
            Primitive::Cube | Primitive::Plane => {
                local.x.abs() <= half.x && local.y.abs() <= half.y
            }
            Primitive::Torus => {
                let n = (local / half).length_squared();
                (TORUS_INNER * TORUS_INNER..=1.0).contains(&n)
            }
            Primitive::Sphere | Primitive::Cylinder | Primitive::Cone | Primitive::Monkey => {
                (local / half).length_squared() <= 1.0
            }
        }
    }

    fn pixel(&self) -> Rgb<u8> {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb([channel(self.color[0]), channel(self.color[1]), channel(self.color[2])])
    }
}

/// Draw the items into a `width` x `height` image, framing all of them
pub fn rasterize(items: &[PreviewItem], width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    if items.is_empty() || width == 0 || height == 0 {
        return image;
    }

    let (min, max) = items.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(lo, hi), item| {
            let center = item.location.truncate();
            let r = item.radius();
            (lo.min(center - r), hi.max(center + r))
        },
    );

    let size = DVec2::new(f64::from(width), f64::from(height));
    let extent = (max - min).max(DVec2::splat(1e-6));
    let usable = size * (1.0 - 2.0 * MARGIN);
    let pixels_per_unit = (usable.x / extent.x).min(usable.y / extent.y);
    let world_center = (min + max) * 0.5;
    let image_center = size * 0.5;

    let to_pixel = |p: DVec2| {
        let d = (p - world_center) * pixels_per_unit;
        DVec2::new(image_center.x + d.x, image_center.y - d.y)
    };
    let to_world = |p: DVec2| {
        let d = DVec2::new(p.x - image_center.x, image_center.y - p.y) / pixels_per_unit;
        world_center + d
    };

    // Higher objects are drawn last so they sit on top
    let mut ordered: Vec<&PreviewItem> = items.iter().collect();
    ordered.sort_by(|a, b| a.location.z.total_cmp(&b.location.z));

    for item in ordered {
        let center = item.location.truncate();
        let r = item.radius();
        let top_left = to_pixel(center + DVec2::new(-r, r));
        let bottom_right = to_pixel(center + DVec2::new(r, -r));

        let x0 = top_left.x.floor().max(0.0) as u32;
        let y0 = top_left.y.floor().max(0.0) as u32;
        let x1 = bottom_right.x.ceil().clamp(0.0, size.x) as u32;
        let y1 = bottom_right.y.ceil().clamp(0.0, size.y) as u32;

        let color = item.pixel();
        for py in y0..y1 {
            for px in x0..x1 {
                let world = to_world(DVec2::new(f64::from(px) + 0.5, f64::from(py) + 0.5));
                if item.covers(world) {
                    image.put_pixel(px, py, color);
                }
            }
        }
    }

    image
}

/// Map a render format name onto an encoder
pub fn image_format(name: &str) -> Result<ImageFormat, SceneError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "PNG" => Ok(ImageFormat::Png),
        "JPEG" | "JPG" => Ok(ImageFormat::Jpeg),
        "BMP" => Ok(ImageFormat::Bmp),
        "TIFF" | "TIF" => Ok(ImageFormat::Tiff),
        other => Err(SceneError::UnsupportedFormat(other.to_string())),
    }
}

/// Write the image, creating parent directories as needed
pub fn save(image: &RgbImage, path: &Path, format: ImageFormat) -> Result<(), SceneError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SceneError::Render(e.to_string()))?;
    }
    image
        .save_with_format(path, format)
        .map_err(|e| SceneError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_at(x: f64, y: f64, color: [f64; 4]) -> PreviewItem {
        PreviewItem {
            primitive: Primitive::Cube,
            location: DVec3::new(x, y, 0.0),
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
            color,
        }
    }

    #[test]
    fn test_empty_scene_is_background() {
        let image = rasterize(&[], 16, 8);
        assert_eq!(image.dimensions(), (16, 8));
        assert!(image.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_single_cube_fills_center() {
        let image = rasterize(&[cube_at(0.0, 0.0, [1.0, 0.0, 0.0, 1.0])], 64, 64);
        assert_eq!(*image.get_pixel(32, 32), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_objects_keep_their_side() {
        let left = cube_at(-3.0, 0.0, [0.0, 0.0, 1.0, 1.0]);
        let right = cube_at(3.0, 0.0, [0.0, 1.0, 0.0, 1.0]);
        let image = rasterize(&[left, right], 128, 64);
        assert_eq!(*image.get_pixel(20, 32), Rgb([0, 0, 255]));
        assert_eq!(*image.get_pixel(107, 32), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_torus_has_a_hole() {
        let torus = PreviewItem {
            primitive: Primitive::Torus,
            ..cube_at(0.0, 0.0, [1.0, 1.0, 1.0, 1.0])
        };
        let image = rasterize(&[torus], 64, 64);
        assert_eq!(*image.get_pixel(32, 32), BACKGROUND);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(image_format("png"), Ok(ImageFormat::Png));
        assert_eq!(image_format("JPG"), Ok(ImageFormat::Jpeg));
        assert_eq!(
            image_format("exr"),
            Err(SceneError::UnsupportedFormat("EXR".into()))
        );
    }
}
