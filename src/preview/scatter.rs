use anyhow::{anyhow, Context};
use geo::BoundingRect;
use image::{Rgb, RgbImage};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::buildings::footprint::BuildingPoint;

use super::colormap::viridis;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([64, 64, 64]);
const MARKER_ALPHA: f64 = 0.5;
/// Azimuth and elevation of the 3D view in degrees.
const VIEW_AZIMUTH_DEG: f64 = -60.0;
const VIEW_ELEVATION_DEG: f64 = 30.0;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Oblique view of longitude, latitude and height. Falls back to `TwoD` if it cannot be rendered.
    #[default]
    ThreeD,
    /// Longitude/latitude scatter plot.
    TwoD,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub mode: PreviewMode,
    pub width: u32,
    pub height: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        // 10 x 8 inches at 300 dpi.
        Self {
            mode: PreviewMode::ThreeD,
            width: 3000,
            height: 2400,
        }
    }
}

/// What `render_preview` ended up writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Nothing was written because there were no points.
    Skipped,
    ThreeD,
    TwoD,
    /// The 3D view failed and the 2D view was written instead.
    TwoDFallback,
}

/// Render the points as a scatter plot coloured by height and save it as PNG.
///
/// In `PreviewMode::ThreeD` a failure of the 3D view is logged and the 2D view is written instead. An error is
/// only returned if the 2D view cannot be written either.
pub fn render_preview(
    points: &[BuildingPoint],
    output_filepath: &Path,
    options: &PreviewOptions,
) -> anyhow::Result<PreviewKind> {
    if points.is_empty() {
        log::info!("No building points, skipping preview.");
        return Ok(PreviewKind::Skipped);
    }
    if let Some(parent) = output_filepath.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating preview directory {:?}", parent))?;
        }
    }

    if options.mode == PreviewMode::ThreeD {
        match draw_3d(points, options).and_then(|image| save_png(&image, output_filepath)) {
            Ok(()) => return Ok(PreviewKind::ThreeD),
            Err(err) => log::warn!(
                "Could not create 3D visualization: {:#}. Falling back to 2D.",
                err
            ),
        }
    }

    let image = draw_2d(points, options)?;
    save_png(&image, output_filepath)?;
    match options.mode {
        PreviewMode::ThreeD => Ok(PreviewKind::TwoDFallback),
        PreviewMode::TwoD => Ok(PreviewKind::TwoD),
    }
}

fn save_png(image: &RgbImage, output_filepath: &Path) -> anyhow::Result<()> {
    image
        .save_with_format(output_filepath, image::ImageFormat::Png)
        .with_context(|| format!("Saving preview image to {:?}", output_filepath))
}

/// Value range of the points along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |range: Option<Range>, value| match range {
            Some(range) => Some(Range {
                min: range.min.min(value),
                max: range.max.max(value),
            }),
            None => Some(Range {
                min: value,
                max: value,
            }),
        })
    }

    /// Map `value` to [0, 1]. A range of zero width maps everything to the middle.
    fn normalize(&self, value: f64) -> f64 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else {
            0.5
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }
}

/// Pixel layout of the plot: the area for markers and the colour bar to its right.
struct Layout {
    plot_left: f64,
    plot_top: f64,
    plot_width: f64,
    plot_height: f64,
    bar_left: u32,
    bar_width: u32,
    bar_top: u32,
    bar_height: u32,
    marker_radius: i32,
}

impl Layout {
    fn new(options: &PreviewOptions) -> anyhow::Result<Self> {
        let (width, height) = (options.width as f64, options.height as f64);
        let margin_x = (width * 0.08).round();
        let margin_y = (height * 0.08).round();
        let bar_width = (width * 0.025).round();
        let bar_gap = (width * 0.04).round();
        let plot_width = width - 2.0 * margin_x - bar_gap - bar_width;
        let plot_height = height - 2.0 * margin_y;
        if plot_width < 1.0 || plot_height < 1.0 || bar_width < 1.0 {
            return Err(anyhow!(
                "Preview size {}x{} is too small",
                options.width,
                options.height
            ));
        }
        Ok(Self {
            plot_left: margin_x,
            plot_top: margin_y,
            plot_width,
            plot_height,
            bar_left: (margin_x + plot_width + bar_gap) as u32,
            bar_width: bar_width as u32,
            bar_top: margin_y as u32,
            bar_height: plot_height as u32,
            marker_radius: ((width.min(height) / 800.0).round() as i32).max(1),
        })
    }

    /// Pixel position of normalized plot coordinates, `y` pointing up.
    fn to_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (self.plot_left + x * self.plot_width).round() as i32,
            (self.plot_top + (1.0 - y) * self.plot_height).round() as i32,
        )
    }
}

fn height_range(points: &[BuildingPoint]) -> anyhow::Result<Range> {
    Range::from_values(points.iter().map(|point| point.height()))
        .ok_or_else(|| anyhow!("Cannot plot an empty set of points"))
}

fn footprint_extent(points: &[BuildingPoint]) -> anyhow::Result<(Range, Range)> {
    let multi_point: geo::MultiPoint = points.iter().map(geo::Point::from).collect();
    let rect = multi_point
        .bounding_rect()
        .ok_or_else(|| anyhow!("Cannot plot an empty set of points"))?;
    Ok((
        Range {
            min: rect.min().x,
            max: rect.max().x,
        },
        Range {
            min: rect.min().y,
            max: rect.max().y,
        },
    ))
}

/// Longitude/latitude scatter plot, colour by height.
fn draw_2d(points: &[BuildingPoint], options: &PreviewOptions) -> anyhow::Result<RgbImage> {
    let layout = Layout::new(options)?;
    let (lon_range, lat_range) = footprint_extent(points)?;
    let heights = height_range(points)?;

    let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
    for point in points {
        let (x, y) = layout.to_pixel(
            lon_range.normalize(point.longitude()),
            lat_range.normalize(point.latitude()),
        );
        let colour = viridis(heights.normalize(point.height()));
        draw_disc(&mut image, x, y, layout.marker_radius, colour, MARKER_ALPHA);
    }

    let (left, top) = layout.to_pixel(0.0, 1.0);
    let (right, bottom) = layout.to_pixel(1.0, 0.0);
    draw_line(&mut image, left, top, right, top, FRAME);
    draw_line(&mut image, right, top, right, bottom, FRAME);
    draw_line(&mut image, right, bottom, left, bottom, FRAME);
    draw_line(&mut image, left, bottom, left, top, FRAME);
    draw_colour_bar(&mut image, &layout);
    Ok(image)
}

/// Project normalized coordinates in [0, 1]^3 onto the view plane. Returns the screen position and the depth,
/// larger depth is further away from the viewer.
fn project(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let azimuth = VIEW_AZIMUTH_DEG.to_radians();
    let elevation = VIEW_ELEVATION_DEG.to_radians();
    let (x, y, z) = (x - 0.5, y - 0.5, z - 0.5);
    let u = x * azimuth.cos() - y * azimuth.sin();
    let v = x * azimuth.sin() + y * azimuth.cos();
    let screen_y = v * elevation.sin() + z * elevation.cos();
    let depth = v * elevation.cos() - z * elevation.sin();
    (u, screen_y, depth)
}

/// Oblique scatter plot of longitude, latitude and height inside a wireframe box, colour by height.
fn draw_3d(points: &[BuildingPoint], options: &PreviewOptions) -> anyhow::Result<RgbImage> {
    let layout = Layout::new(options)?;
    let (lon_range, lat_range) = footprint_extent(points)?;
    if lon_range.is_degenerate() || lat_range.is_degenerate() {
        return Err(anyhow!(
            "Footprint extent is flat (longitude {:?}, latitude {:?})",
            lon_range,
            lat_range
        ));
    }
    let heights = height_range(points)?;
    let z_range = Range {
        min: heights.min.min(0.0),
        max: heights.max,
    };

    // The projected unit cube determines the scale so that all points and the box fit the plot area.
    let corners: Vec<(f64, f64, f64)> = (0..8)
        .map(|i| {
            project(
                (i & 1) as f64,
                ((i >> 1) & 1) as f64,
                ((i >> 2) & 1) as f64,
            )
        })
        .collect();
    let screen_x = Range::from_values(corners.iter().map(|corner| corner.0))
        .ok_or_else(|| anyhow!("No box corners"))?;
    let screen_y = Range::from_values(corners.iter().map(|corner| corner.1))
        .ok_or_else(|| anyhow!("No box corners"))?;
    let to_pixel = |(x, y, _): (f64, f64, f64)| {
        layout.to_pixel(screen_x.normalize(x), screen_y.normalize(y))
    };

    let mut projected: Vec<((f64, f64, f64), Rgb<u8>)> = points
        .iter()
        .map(|point| {
            (
                project(
                    lon_range.normalize(point.longitude()),
                    lat_range.normalize(point.latitude()),
                    z_range.normalize(point.height()),
                ),
                viridis(heights.normalize(point.height())),
            )
        })
        .collect();
    if let Some((position, _)) = projected
        .iter()
        .find(|((x, y, depth), _)| !(x.is_finite() && y.is_finite() && depth.is_finite()))
    {
        return Err(anyhow!("Projection produced invalid coordinates {:?}", position));
    }
    // Far points first so that nearer points are drawn over them.
    projected.sort_by(|(a, _), (b, _)| b.2.total_cmp(&a.2));

    let mut image = RgbImage::from_pixel(options.width, options.height, BACKGROUND);
    for (start, end) in cube_edges() {
        let (x0, y0) = to_pixel(corners[start]);
        let (x1, y1) = to_pixel(corners[end]);
        draw_line(&mut image, x0, y0, x1, y1, FRAME);
    }
    for (position, colour) in projected {
        let (x, y) = to_pixel(position);
        draw_disc(&mut image, x, y, layout.marker_radius, colour, MARKER_ALPHA);
    }
    draw_colour_bar(&mut image, &layout);
    Ok(image)
}

/// Pairs of corner indices connected by an edge, corners indexed by their bits (x: 1, y: 2, z: 4).
fn cube_edges() -> impl Iterator<Item = (usize, usize)> {
    (0..8usize).flat_map(|corner| {
        [1usize, 2, 4]
            .into_iter()
            .filter(move |bit| corner & bit == 0)
            .map(move |bit| (corner, corner | bit))
    })
}

fn draw_colour_bar(image: &mut RgbImage, layout: &Layout) {
    for row in 0..layout.bar_height {
        let t = 1.0 - row as f64 / (layout.bar_height.max(2) - 1) as f64;
        let colour = viridis(t);
        for column in 0..layout.bar_width {
            let (x, y) = (layout.bar_left + column, layout.bar_top + row);
            put_pixel_checked(image, x as i32, y as i32, colour);
        }
    }
    // Frame around the bar, not over it.
    let left = layout.bar_left as i32 - 1;
    let right = (layout.bar_left + layout.bar_width) as i32;
    let top = layout.bar_top as i32 - 1;
    let bottom = (layout.bar_top + layout.bar_height) as i32;
    draw_line(image, left, top, right, top, FRAME);
    draw_line(image, right, top, right, bottom, FRAME);
    draw_line(image, right, bottom, left, bottom, FRAME);
    draw_line(image, left, bottom, left, top, FRAME);
}

fn put_pixel_checked(image: &mut RgbImage, x: i32, y: i32, colour: Rgb<u8>) {
    if x >= 0 && x < image.width() as i32 && y >= 0 && y < image.height() as i32 {
        image.put_pixel(x as u32, y as u32, colour);
    }
}

/// Filled disc blended over the existing pixels with opacity `alpha`.
fn draw_disc(image: &mut RgbImage, cx: i32, cy: i32, radius: i32, colour: Rgb<u8>, alpha: f64) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || x >= image.width() as i32 || y < 0 || y >= image.height() as i32 {
                continue;
            }
            let pixel = image.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let blended =
                    pixel.0[channel] as f64 * (1.0 - alpha) + colour.0[channel] as f64 * alpha;
                pixel.0[channel] = blended.round() as u8;
            }
        }
    }
}

/// Bresenham line, one pixel wide.
fn draw_line(image: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, colour: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        put_pixel_checked(image, x, y, colour);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
