pub mod camera;
pub mod style;

use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{info, warn};

use crate::data::CoordinateBounds;
use crate::errors::{Error, Result};

use self::camera::{camera_that_fits, Camera, CameraTransition, EdgePadding, Viewport};
use self::style::Style;

pub const DEFAULT_STYLE_URL_TEMPLATE: &str = "https://api.maptiler.com/maps/outdoor/style.json?key={key}";
const KEY_PLACEHOLDER: &str = "{key}";
/// Largest viewport edge, in pixels, a surface will rasterize.
pub const MAX_VIEWPORT_EDGE: f64 = 16384.0;

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(u64);

impl MapId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Everything needed to construct a map surface.
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub api_key: Option<String>,
    pub style_url_template: String,
    pub viewport: Viewport,
}

/// Emitted once per map surface, when its base style has finished loading.
/// Only this module can create one.
#[derive(Debug)]
pub struct StyleLoaded {
    map_id: MapId,
}

impl StyleLoaded {
    pub fn map_id(&self) -> MapId {
        self.map_id
    }
}

#[derive(Debug)]
struct ActiveTransition {
    transition: CameraTransition,
    elapsed: Duration,
}

/// Headless map view: owns a style and a camera. Not `Send`; all style and
/// camera mutation stays on the thread that created it.
#[derive(Debug)]
pub struct MapSurface {
    id: MapId,
    style_url: String,
    viewport: Viewport,
    style: Option<Style>,
    camera: Camera,
    transition: Option<ActiveTransition>,
    _owner_thread: PhantomData<Rc<()>>,
}

impl MapSurface {
    /// Fails without a usable API key; there is no degraded map.
    pub fn new(options: &MapOptions) -> Result<Self> {
        let key = options.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::configuration("Failed to read MapTiler key from configuration"))?;

        if !options.style_url_template.contains(KEY_PLACEHOLDER) {
            return Err(Error::configuration(format!(
                "style URL template '{}' has no {} placeholder",
                options.style_url_template, KEY_PLACEHOLDER
            )));
        }
        if options.viewport.width <= 0.0 || options.viewport.height <= 0.0 {
            return Err(Error::configuration(format!(
                "viewport {}x{} is empty",
                options.viewport.width, options.viewport.height
            )));
        }
        if !(options.viewport.width <= MAX_VIEWPORT_EDGE && options.viewport.height <= MAX_VIEWPORT_EDGE) {
            return Err(Error::configuration(format!(
                "viewport {}x{} exceeds {} px",
                options.viewport.width, options.viewport.height, MAX_VIEWPORT_EDGE
            )));
        }

        Ok(MapSurface {
            id: MapId(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed)),
            style_url: options.style_url_template.replace(KEY_PLACEHOLDER, key),
            viewport: options.viewport,
            style: None,
            camera: Camera::default(),
            transition: None,
            _owner_thread: PhantomData,
        })
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn style_url(&self) -> &str {
        &self.style_url
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Installs the base style. Returns the style-loaded event the first time
    /// only; later calls are ignored.
    pub fn finish_loading_style(&mut self, style: Style) -> Option<StyleLoaded> {
        if self.style.is_some() {
            warn!(map_id = self.id.0; "Base style already loaded, ignoring reload");
            return None;
        }
        info!(map_id = self.id.0, style = style.name(); "Base style loaded");
        self.style = Some(style);
        Some(StyleLoaded { map_id: self.id })
    }

    /// Loads an empty base style named after the style URL's map.
    pub fn load_base_style(&mut self) -> Option<StyleLoaded> {
        let name = base_style_name(&self.style_url);
        self.finish_loading_style(Style::new(name))
    }

    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    pub fn style_mut(&mut self) -> Option<&mut Style> {
        self.style.as_mut()
    }

    /// Current camera, part way through any running flight.
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Where the camera ends up once any running flight completes.
    pub fn target_camera(&self) -> Camera {
        self.transition
            .as_ref()
            .map(|active| active.transition.to)
            .unwrap_or(self.camera)
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.transition = None;
        self.camera = camera;
    }

    pub fn camera_that_fits_bounds(
        &self,
        bounds: &CoordinateBounds,
        bearing: f64,
        padding: &EdgePadding,
    ) -> Result<Camera> {
        camera_that_fits(bounds, &self.viewport, padding, bearing)
    }

    pub fn fly_to(&mut self, camera: Camera, duration: Duration) {
        self.transition = Some(ActiveTransition {
            transition: CameraTransition {
                from: self.camera,
                to: camera,
                duration,
            },
            elapsed: Duration::ZERO,
        });
    }

    pub fn is_flying(&self) -> bool {
        self.transition.is_some()
    }

    /// Moves a running flight forward by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        if let Some(active) = &mut self.transition {
            active.elapsed += delta;
            self.camera = active.transition.camera_at(active.elapsed);
            if active.transition.is_finished(active.elapsed) {
                self.transition = None;
            }
        }
    }

    /// Jumps any running flight to its end.
    pub fn settle(&mut self) {
        if let Some(active) = self.transition.take() {
            self.camera = active.transition.to;
        }
    }
}

fn base_style_name(style_url: &str) -> String {
    style_url
        .split('?')
        .next()
        .and_then(|path| path.trim_end_matches("/style.json").rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("base")
        .to_string()
}
