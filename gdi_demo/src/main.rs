//! Headless walkthrough of the GDI service
//!
//! Creates a memory context over a small bitmap, draws into it through a few
//! mapping modes, prints the result as ASCII and reports what is still alive
//! before shutting the service down.
//!
//! Usage: `gdi_demo [config.toml|config.ron]`

use gdi_core::config::{Config, ConfigError, TomlSource};
use gdi_core::prelude::*;
use log::{info, warn};

const WIDTH: i32 = 32;
const HEIGHT: i32 = 16;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("gdi: {0}")]
    Gdi(#[from] GdiError),
}

fn load_config() -> Result<GdiConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {path}");
            Ok(GdiConfig::load_from_file(&path)?)
        }
        None => Ok(GdiConfig::default()),
    }
}

fn draw(gdi: &Gdi, hdc: Handle) -> Result<(), DemoError> {
    let background = gdi.create_solid_brush(ColorRef::WHITE)?;
    let previous_brush = gdi.select_object(hdc, background)?;
    gdi.pat_blt(hdc, Rect::new(0, 0, WIDTH, HEIGHT), rop::PATCOPY)?;
    gdi.select_object(hdc, previous_brush)?;
    gdi.delete_object(background)?;

    let pen = gdi.create_pen(PenStyle::Solid, 1, ColorRef::rgb(200, 0, 0))?;
    let previous_pen = gdi.select_object(hdc, pen)?;
    // Deferred: the pen stays usable until it is deselected
    let outcome = gdi.delete_object(pen)?;
    info!("Deleting the selected pen: {outcome:?}");

    gdi.move_to(hdc, Point::new(0, 0))?;
    gdi.line_to(hdc, Point::new(WIDTH - 1, HEIGHT - 1))?;

    let level = gdi.save_dc(hdc)?;
    gdi.set_map_mode(hdc, MapMode::Anisotropic)?;
    gdi.set_window_ext(hdc, Size::new(2, 2))?;
    gdi.set_viewport_ext(hdc, Size::new(1, 1))?;
    gdi.move_to(hdc, Point::new(0, HEIGHT * 2 - 2))?;
    gdi.line_to(hdc, Point::new(WIDTH * 2, HEIGHT * 2 - 2))?;
    gdi.restore_dc(hdc, level)?;

    gdi.rectangle(hdc, Rect::new(4, 4, 12, 10))?;
    gdi.select_object(hdc, previous_pen)?;
    Ok(())
}

fn render(gdi: &Gdi, hdc: Handle) -> Result<String, DemoError> {
    let pixels = gdi.get_image(hdc, Rect::new(0, 0, WIDTH, HEIGHT))?;
    let mut out = String::new();
    for row in pixels.chunks(WIDTH as usize) {
        out.extend(row.iter().map(|c| if *c == ColorRef::WHITE { '.' } else { '#' }));
        out.push('\n');
    }
    Ok(out)
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let gdi = Gdi::with_source(config, Box::new(TomlSource::parse("[Desktop]\nLogPixels = \"96\"")?))?;

    let hdc = gdi.create_compatible_dc(None)?;
    let bitmap = gdi.create_bitmap(WIDTH, HEIGHT, 32)?;
    gdi.select_object(hdc, bitmap)?;

    draw(&gdi, hdc)?;
    print!("{}", render(&gdi, hdc)?);

    let stats = gdi.stats();
    info!(
        "{} live handles, {} arena blocks, display driver loaded: {}",
        stats.live_handles, stats.arena.live_blocks, stats.driver_loaded
    );

    gdi.delete_dc(hdc)?;
    gdi.delete_object(bitmap)?;

    let leaks = gdi.shutdown();
    if !leaks.is_empty() {
        warn!("{} objects leaked", leaks.len());
    }
    Ok(())
}

fn main() {
    gdi_core::foundation::logging::init();
    if let Err(e) = run() {
        eprintln!("gdi_demo: {e}");
        std::process::exit(1);
    }
}
