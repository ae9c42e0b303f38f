use abyssal::assets::Assets;
use abyssal::audio::NullAudio;
use abyssal::collision::Rect;
use abyssal::config::GameConfig;
use abyssal::game::factory::EntityDescriptor;
use abyssal::game::level::{LevelDescriptor, OverlayDescriptor};
use abyssal::game::trigger::{TriggerAction, TriggerDescriptor};
use abyssal::game::{WorldController, WorldInstance};
use abyssal::input_system::{InputSystem, KeyBindings};
use abyssal::instance::InstanceScheduler;
use abyssal::render::Surface;
use abyssal::sdl_backend::{CanvasTarget, solid_texture, translate_event};
use abyssal::tile::{EMPTY_TILE, TileAtlas, TileGrid};
use glam::Vec2;
use log::{info, warn};
use sdl2::pixels::Color;
use serde_json::json;
use std::rc::Rc;
use std::time::Instant;

const ROCK_TILE: i32 = 0;
const TILE_PITCH: u32 = 16;

/// Calculate the best window scale based on monitor size
fn calculate_window_scale(video_subsystem: &sdl2::VideoSubsystem, width: u32, height: u32) -> u32 {
    match video_subsystem.desktop_display_mode(0) {
        Ok(display_mode) => {
            // Leave 10% margin for taskbars/decorations
            let usable_w = (display_mode.w as f32 * 0.9) as i32;
            let usable_h = (display_mode.h as f32 * 0.9) as i32;

            let scale = (usable_w / width as i32).min(usable_h / height as i32);
            scale.clamp(1, 4) as u32
        }
        Err(e) => {
            warn!("Could not detect monitor size ({}), using 2x scale", e);
            2
        }
    }
}

/// Cave with a rock border and a few pillars; the right wall has a gap at `exit_row`
fn cave(width: usize, height: usize, exit_row: Option<usize>) -> TileGrid {
    let mut grid = TileGrid::new(width, height, EMPTY_TILE);
    for x in 0..width {
        grid.set(x, 0, ROCK_TILE);
        grid.set(x, height - 1, ROCK_TILE);
    }
    for y in 0..height {
        grid.set(0, y, ROCK_TILE);
        if exit_row.is_none_or(|row| y.abs_diff(row) > 1) {
            grid.set(width - 1, y, ROCK_TILE);
        }
    }
    for pillar in (8..width - 4).step_by(9) {
        for y in height / 3..height / 3 + 4 {
            grid.set(pillar, y, ROCK_TILE);
        }
    }
    grid
}

fn demo_assets() -> Assets {
    let mut assets = Assets::new();
    for (key, width, height) in [
        ("player", 24, 10),
        ("rock", 16, 16),
        ("kelp", 8, 24),
        ("boulder", 20, 20),
        ("shadow", 800, 600),
        ("frame", 400, 300),
    ] {
        assets.insert_surface(Surface::new(key, width, height));
    }

    let mut atlas = TileAtlas::new(TILE_PITCH);
    atlas.insert(ROCK_TILE, Surface::new("rock", TILE_PITCH, TILE_PITCH));
    assets.insert_atlas("rocks", atlas);
    assets.insert_tilemap("reef", cave(60, 25, Some(12)));
    assets.insert_tilemap("trench", cave(40, 40, None));

    let mut kelp = EntityDescriptor::new("static_sprite", json!({ "surface": "kelp", "position": [200, 300] }));
    kelp.background = true;
    let boulder = EntityDescriptor::new("rock", json!({ "surface": "boulder", "position": [400, 200], "radius": 10 }));

    assets.insert_level(
        "reef",
        LevelDescriptor {
            tilemap: "reef".to_string(),
            tileset: "rocks".to_string(),
            tile_pitch: TILE_PITCH,
            entities: vec![kelp, boulder],
            triggers: vec![TriggerDescriptor {
                rect: Rect::new(59.0 * 16.0, 11.0 * 16.0, 16.0, 48.0),
                persistent: false,
                action: TriggerAction::SwitchZone {
                    level: "trench".to_string(),
                    spawn: Some(Vec2::new(320.0, 80.0)),
                    angle: Some(90.0),
                },
            }],
            spawn: Vec2::new(80.0, 200.0),
            spawn_angle: 0.0,
            overlay: OverlayDescriptor::default(),
            music: None,
        },
    );
    assets.insert_level(
        "trench",
        LevelDescriptor {
            tilemap: "trench".to_string(),
            tileset: "rocks".to_string(),
            tile_pitch: TILE_PITCH,
            entities: Vec::new(),
            triggers: Vec::new(),
            spawn: Vec2::new(320.0, 80.0),
            spawn_angle: 90.0,
            overlay: OverlayDescriptor {
                enabled: true,
                brightness: -160,
            },
            music: None,
        },
    );
    assets
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load_from_file(&path).map_err(|e| format!("Failed to load {}: {}", path, e))?,
        None => GameConfig::default(),
    };
    let (width, height) = (config.viewport.width, config.viewport.height);
    let fps = config.viewport.fps;

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let _image_context = sdl2::image::init(sdl2::image::InitFlag::PNG)?;

    let window_scale = calculate_window_scale(&video_subsystem, width, height);
    info!("Window scale: {}x ({}x{})", window_scale, width * window_scale, height * window_scale);

    let window = video_subsystem
        .window("Abyssal", width * window_scale, height * window_scale)
        .position_centered()
        .build()
        .map_err(|e| e.to_string())?;
    let mut canvas = window.into_canvas().target_texture().build().map_err(|e| e.to_string())?;
    let texture_creator = canvas.texture_creator();

    let placeholders = [
        ("player", 24, 10, Color::RGB(230, 200, 60)),
        ("rock", 16, 16, Color::RGB(70, 60, 80)),
        ("kelp", 8, 24, Color::RGB(40, 160, 90)),
        ("boulder", 20, 20, Color::RGB(120, 110, 100)),
        ("shadow", 800, 600, Color::RGB(60, 60, 90)),
        ("frame", 400, 300, Color::RGB(5, 10, 25)),
    ];
    let mut textures = Vec::new();
    for (key, w, h, color) in placeholders {
        textures.push((key, solid_texture(&mut canvas, &texture_creator, w, h, color)?));
    }

    let mut target = CanvasTarget::new(canvas, width, height)?;
    for (key, texture) in textures {
        target.insert_texture(key, texture);
    }

    let world = WorldController::new(config, Rc::new(demo_assets())).map_err(|e| e.to_string())?;
    let input = InputSystem::new(KeyBindings::default());
    let mut scheduler = InstanceScheduler::new();
    scheduler.push(Box::new(WorldInstance::new(world, input, "reef", fps)));

    // No mixer in this build
    let mut audio = NullAudio;
    let mut event_pump = sdl_context.event_pump()?;
    let start = Instant::now();

    loop {
        let events: Vec<_> = event_pump.poll_iter().filter_map(|e| translate_event(&e)).collect();

        target.clear();
        let running = scheduler
            .step(start.elapsed(), &mut target, &mut audio, &events)
            .map_err(|e| e.to_string())?;
        if !running {
            break;
        }
        target.present();

        std::thread::sleep(scheduler.frame_interval());
    }

    info!("Bye");
    Ok(())
}
