use std::fs::{self, File};
use std::path::Path;

use landmarks::bundle::ResourceBundle;
use landmarks::color::Color;
use landmarks::data::{Coordinate, LandmarkStore};
use landmarks::detail::LandmarkDetail;
use landmarks::dispatch::Dispatcher;
use landmarks::map::camera::Viewport;
use landmarks::map::style::Layer;
use landmarks::map::{MapOptions, MapSurface, DEFAULT_STYLE_URL_TEMPLATE};
use landmarks::overlay::{
    OverlayBinding, OverlayLoader, CAMERA_EDGE_PADDING, MARKER_IMAGE_NAME, PARK_FILL_COLOR,
    PARK_OUTLINE_COLOR,
};
use landmarks::render::MapRenderer;
use landmarks::ErrorKind;

const RECTANGLE: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": { "name": "Test Park" },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [-116.30, 34.00], [-116.10, 34.00], [-116.10, 34.10], [-116.30, 34.10], [-116.30, 34.00]
            ]]
        }
    }]
}"#;

const LANDMARKS: &str = r#"[
    {
        "name": "Turtle Rock",
        "state": "California",
        "id": 1001,
        "park": "Test Park",
        "coordinates": { "longitude": -116.2, "latitude": 34.05 },
        "imageName": "turtlerock",
        "shapeName": "rectangle"
    },
    {
        "name": "Nowhere",
        "state": "Nevada",
        "id": 1002,
        "park": "Missing Park",
        "coordinates": { "longitude": -115.0, "latitude": 36.0 },
        "imageName": "nowhere",
        "shapeName": "missing"
    }
]"#;

fn write_icon(path: &Path) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(file, 2, 2);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&[255, 0, 0, 255].repeat(4)).unwrap();
}

fn bundle() -> (tempfile::TempDir, ResourceBundle) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("rectangle.geojson"), RECTANGLE).unwrap();
    fs::write(dir.path().join("landmarkData.json"), LANDMARKS).unwrap();
    fs::create_dir(dir.path().join("images")).unwrap();
    write_icon(&dir.path().join("images").join("landmark-icon.png"));
    let bundle = ResourceBundle::open(dir.path()).unwrap();
    (dir, bundle)
}

fn options() -> MapOptions {
    MapOptions {
        api_key: Some("test-key".into()),
        style_url_template: DEFAULT_STYLE_URL_TEMPLATE.into(),
        viewport: Viewport::new(640.0, 480.0),
    }
}

#[test]
fn rectangle_overlay_is_framed_around_its_centroid() {
    let (_dir, bundle) = bundle();
    let dispatcher = Dispatcher::new(2).unwrap();
    let mut map = MapSurface::new(&options()).unwrap();
    let centroid = Coordinate::new(34.05, -116.2);

    let loader = OverlayLoader::new(OverlayBinding {
        bundle,
        shape_name: "rectangle".into(),
        coordinate: centroid,
    });
    let style_loaded = map.load_base_style().unwrap();
    let loader = loader.on_style_ready(style_loaded, &dispatcher).finish(&mut map).unwrap();
    map.settle();

    let style = map.style().unwrap();
    assert_eq!(style.layers().len(), 2);
    match (&style.layers()[0], &style.layers()[1]) {
        (Layer::Fill(fill), Layer::Symbol(symbol)) => {
            assert_eq!(fill.fill_color, PARK_FILL_COLOR);
            assert_eq!(fill.outline_color, Some(PARK_OUTLINE_COLOR));
            assert_eq!(symbol.icon_image, MARKER_IMAGE_NAME);
        },
        other => panic!("unexpected layers {:?}", other),
    }
    assert!(style.image(MARKER_IMAGE_NAME).is_some());
    assert_eq!(loader.overlay().marker_image.as_deref(), Some(MARKER_IMAGE_NAME));

    let camera = map.camera();
    assert_eq!(camera.bearing, 0.0);
    assert!((camera.center.longitude - centroid.longitude).abs() < 1e-9);
    assert!((camera.center.latitude - centroid.latitude).abs() < 1e-3);

    let viewport = map.viewport();
    let bounds = loader.overlay().bounds;
    for corner in [bounds.sw, bounds.ne] {
        let point = camera.project(&corner, &viewport);
        assert!(point.x >= CAMERA_EDGE_PADDING.left - 1e-6);
        assert!(point.x <= viewport.width - CAMERA_EDGE_PADDING.right + 1e-6);
        assert!(point.y >= CAMERA_EDGE_PADDING.top - 1e-6);
        assert!(point.y <= viewport.height - CAMERA_EDGE_PADDING.bottom + 1e-6);
    }
}

#[test]
fn detail_exports_image_and_style_then_cleans_up() {
    let (dir, bundle) = bundle();
    let store = LandmarkStore::load(&bundle).unwrap();
    let dispatcher = Dispatcher::new(1).unwrap();

    let detail = LandmarkDetail::open(store.get(1001).unwrap(), &options(), &bundle, &dispatcher).unwrap();
    assert!(!detail.map().is_flying());

    let out = dir.path().join("out");
    let renderer = MapRenderer::new(Color::from_rgb(0xFFFFFF, 1.0));
    let image_path = detail.export(&renderer, &out).unwrap();
    assert_eq!(image_path, out.join("1001-rectangle.png"));

    let decoder = png::Decoder::new(File::open(&image_path).unwrap());
    let reader = decoder.read_info().unwrap();
    assert_eq!((reader.info().width, reader.info().height), (640, 480));

    let style: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join("1001-rectangle.style.json")).unwrap()).unwrap();
    assert_eq!(style["layers"][0]["id"], "polygon");
    assert_eq!(style["layers"][0]["paint"]["fill-color"], "rgba(128, 26, 134, 0.3)");
    assert_eq!(style["layers"][1]["id"], "marker-style");
    assert_eq!(style["sources"]["polygon"]["data"]["type"], "FeatureCollection");

    detail.close().unwrap();
}

#[test]
fn missing_shape_surfaces_a_typed_error() {
    let (_dir, bundle) = bundle();
    let store = LandmarkStore::load(&bundle).unwrap();
    let dispatcher = Dispatcher::new(1).unwrap();

    let err = LandmarkDetail::open(store.get(1002).unwrap(), &options(), &bundle, &dispatcher)
        .err()
        .unwrap();
    assert_eq!(err.kind, ErrorKind::ResourceNotFound);
}

#[test]
fn missing_key_refuses_to_build_a_map() {
    let (_dir, bundle) = bundle();
    let store = LandmarkStore::load(&bundle).unwrap();
    let dispatcher = Dispatcher::new(1).unwrap();
    let mut options = options();
    options.api_key = None;

    let err = LandmarkDetail::open(store.get(1001).unwrap(), &options, &bundle, &dispatcher)
        .err()
        .unwrap();
    assert_eq!(err.kind, ErrorKind::Configuration);
}
