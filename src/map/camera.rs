//! Web Mercator camera math: fitting bounds into a viewport, projecting
//! coordinates to screen pixels, and interpolating camera flights.

use std::f64::consts::PI;
use std::time::Duration;

use crate::data::{Coordinate, CoordinateBounds};
use crate::errors::{Error, Result};

/// Size of one world tile at zoom 0, in screen pixels.
pub const TILE_SIZE: f64 = 512.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;
/// Latitude at which Web Mercator becomes square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePadding {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgePadding {
    pub const fn uniform(inset: f64) -> Self {
        EdgePadding {
            top: inset,
            left: inset,
            bottom: inset,
            right: inset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Viewport transform of a map surface. Bearing is in degrees clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Coordinate,
    pub zoom: f64,
    pub bearing: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            center: Coordinate::new(0.0, 0.0),
            zoom: MIN_ZOOM,
            bearing: 0.0,
        }
    }
}

/// Position in zoom-0 world pixels; y grows southwards.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WorldPoint {
    x: f64,
    y: f64,
}

fn to_world(coordinate: &Coordinate) -> WorldPoint {
    let latitude = coordinate.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let lat_rad = latitude.to_radians();
    WorldPoint {
        x: (coordinate.longitude + 180.0) / 360.0 * TILE_SIZE,
        y: (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * TILE_SIZE,
    }
}

fn from_world(point: WorldPoint) -> Coordinate {
    let longitude = point.x / TILE_SIZE * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * point.y / TILE_SIZE)).sinh().atan();
    Coordinate::new(lat_rad.to_degrees(), longitude)
}

fn rotate(x: f64, y: f64, degrees: f64) -> (f64, f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

impl Camera {
    pub fn new(center: Coordinate, zoom: f64, bearing: f64) -> Self {
        Camera {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            bearing,
        }
    }

    fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    pub fn project(&self, coordinate: &Coordinate, viewport: &Viewport) -> ScreenPoint {
        let center = to_world(&self.center);
        let point = to_world(coordinate);
        let scale = self.scale();
        let (dx, dy) = rotate(
            (point.x - center.x) * scale,
            (point.y - center.y) * scale,
            -self.bearing,
        );
        ScreenPoint {
            x: viewport.width / 2.0 + dx,
            y: viewport.height / 2.0 + dy,
        }
    }

    pub fn unproject(&self, point: &ScreenPoint, viewport: &Viewport) -> Coordinate {
        let center = to_world(&self.center);
        let scale = self.scale();
        let (dx, dy) = rotate(
            point.x - viewport.width / 2.0,
            point.y - viewport.height / 2.0,
            self.bearing,
        );
        from_world(WorldPoint {
            x: center.x + dx / scale,
            y: center.y + dy / scale,
        })
    }

    /// Envelope of everything the viewport shows.
    pub fn visible_bounds(&self, viewport: &Viewport) -> CoordinateBounds {
        let corners = [
            ScreenPoint { x: 0.0, y: 0.0 },
            ScreenPoint { x: viewport.width, y: 0.0 },
            ScreenPoint { x: viewport.width, y: viewport.height },
            ScreenPoint { x: 0.0, y: viewport.height },
        ].map(|corner| self.unproject(&corner, viewport));
        let mut bounds = CoordinateBounds::from_coordinate(corners[0]);
        for corner in &corners[1..] {
            bounds.extend(*corner);
        }
        bounds
    }
}

/// The closest camera that shows all of `bounds` inside the viewport minus
/// `padding`, rotated to `bearing`. Zero-area bounds get the maximum zoom.
pub fn camera_that_fits(
    bounds: &CoordinateBounds,
    viewport: &Viewport,
    padding: &EdgePadding,
    bearing: f64,
) -> Result<Camera> {
    let available_width = viewport.width - padding.left - padding.right;
    let available_height = viewport.height - padding.top - padding.bottom;
    if available_width <= 0.0 || available_height <= 0.0 {
        return Err(Error::configuration(format!(
            "viewport {}x{} leaves no room inside padding {:?}",
            viewport.width, viewport.height, padding
        )));
    }

    let corners = [
        bounds.sw,
        Coordinate::new(bounds.sw.latitude, bounds.ne.longitude),
        bounds.ne,
        Coordinate::new(bounds.ne.latitude, bounds.sw.longitude),
    ].map(|corner| {
        let world = to_world(&corner);
        rotate(world.x, world.y, -bearing)
    });

    let (mut min_x, mut min_y) = corners[0];
    let (mut max_x, mut max_y) = corners[0];
    for (x, y) in &corners[1..] {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }

    let fit_x = if max_x > min_x { available_width / (max_x - min_x) } else { f64::INFINITY };
    let fit_y = if max_y > min_y { available_height / (max_y - min_y) } else { f64::INFINITY };
    let fit = fit_x.min(fit_y);
    let zoom = if fit.is_finite() { fit.log2() } else { MAX_ZOOM }.clamp(MIN_ZOOM, MAX_ZOOM);
    let scale = zoom.exp2();

    // Shift the center so the content sits in the middle of the padded area.
    let offset_x = (padding.left - padding.right) / 2.0;
    let offset_y = (padding.top - padding.bottom) / 2.0;
    let center_x = (min_x + max_x) / 2.0 - offset_x / scale;
    let center_y = (min_y + max_y) / 2.0 - offset_y / scale;
    let (x, y) = rotate(center_x, center_y, bearing);

    Ok(Camera {
        center: from_world(WorldPoint { x, y }),
        zoom,
        bearing,
    })
}

/// Animated move between two cameras. Center and zoom interpolate linearly in
/// Mercator space.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    pub from: Camera,
    pub to: Camera,
    pub duration: Duration,
}

impl CameraTransition {
    pub fn camera_at(&self, elapsed: Duration) -> Camera {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let from = to_world(&self.from.center);
        let to = to_world(&self.to.center);
        Camera {
            center: from_world(WorldPoint {
                x: from.x + (to.x - from.x) * t,
                y: from.y + (to.y - from.y) * t,
            }),
            zoom: self.from.zoom + (self.to.zoom - self.from.zoom) * t,
            bearing: self.from.bearing + (self.to.bearing - self.from.bearing) * t,
        }
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
