use std::collections::HashSet;
use std::time::Duration;

use bevy_ecs::{
    prelude::{Query, With},
    schedule::{ParallelSystemDescriptorCoercion, Schedule, Stage, SystemLabel, SystemStage},
    system::{Res, ResMut},
    world::World,
};
use nalgebra::Point2;
use rand::{rngs::StdRng, SeedableRng};
use winit::{
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use crate::{
    common_component::{Player, Position, ScriptedPath},
    config::TileWorldConfig,
    coords::ChunkCoord,
    data_types::Camera2d,
    error::RenderError,
    render_system::{GpuVertexBuffer, RenderState},
    tile::TileFlags,
    tile_manager::{MapId, TileManager},
    tile_map::TileMap,
    time::{frame_criteria, update_criteria, TimeResource},
};

/// Tile maps plus the bookkeeping the demo needs around them.
pub struct TileWorld<B> {
    pub manager: TileManager<B>,
    pub map_id: MapId,
    seed: u64,
    seeded: HashSet<ChunkCoord>,
    player_chunk: Option<ChunkCoord>,
    dirty: bool,
}

pub type GpuTileWorld = TileWorld<GpuVertexBuffer>;

pub struct MainCamera(pub Camera2d);

impl<B> TileWorld<B> {
    pub fn new(config: TileWorldConfig, seed: u64) -> Self {
        let map_id = 0;
        let mut manager = TileManager::new(config);
        let map = TileMap::from_config(manager.config());
        manager.add_tile_map(map_id, map);

        Self {
            manager,
            map_id,
            seed,
            seeded: HashSet::new(),
            player_chunk: None,
            dirty: true,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Chunk containing the world pixel `pos`.
    pub fn chunk_at(&self, pos: Point2<f32>) -> ChunkCoord {
        let config = self.manager.config();
        let tile_x = (pos.x / config.tile_width as f32).floor() as i64;
        let tile_y = (pos.y / config.tile_height as f32).floor() as i64;
        ChunkCoord::from_world_tile(tile_x, tile_y, config.chunk_width, config.chunk_height).0
    }

    /// Streams around `pos` when it has crossed into another chunk and seeds
    /// any chunk seen for the first time.
    pub fn stream_to(&mut self, pos: Point2<f32>) {
        let coord = self.chunk_at(pos);
        if self.player_chunk == Some(coord) {
            return;
        }
        self.player_chunk = Some(coord);

        let radius = self.manager.config().stream_radius;
        let changed = self
            .manager
            .stream_chunks(self.map_id, coord.x, coord.y, radius)
            .map_or(false, |report| report.changed());
        if changed {
            self.seed_new_chunks();
            self.dirty = true;
        }
    }

    fn seed_new_chunks(&mut self) {
        let tile_count = self.manager.config().tile_count.max(3);
        let Some(map) = self.manager.get_tile_map_mut(self.map_id) else {
            return;
        };

        for chunk in map.active_chunks_mut() {
            let coord = chunk.coord();
            if !self.seeded.insert(coord) {
                continue;
            }

            let mut rng = StdRng::seed_from_u64(self.seed ^ coord.key());
            chunk.fill_random(0, &mut rng, 0.9, tile_count);
            chunk.fill_random(1, &mut rng, 0.05, tile_count);
            if let Some(decor) = chunk.layer_mut(1) {
                for tile in decor.tiles_mut() {
                    if tile.check_flag(TileFlags::VISIBLE) {
                        tile.set_flag(TileFlags::ANIMATED);
                        tile.set_anim_max(4);
                    }
                }
            }
        }
    }

    pub fn tick_animations(&mut self, dt: Duration) {
        if let Some(stepped) = self.manager.update_tile_map(self.map_id, dt) {
            if stepped > 0 {
                self.dirty = true;
            }
        }
    }
}

#[derive(SystemLabel, Debug, Clone, PartialEq, Eq, Hash)]
enum UpdateStep {
    Move,
    Stream,
}

fn move_player(time: Res<TimeResource>, mut players: Query<(&ScriptedPath, &mut Position), With<Player>>) {
    let seconds = time.ingame_time.as_secs_f32();
    for (path, mut pos) in players.iter_mut() {
        pos.0 = path.position_at(seconds);
    }
}

fn stream_around_player(players: Query<&Position, With<Player>>, mut world: ResMut<GpuTileWorld>) {
    match players.get_single() {
        Ok(pos) => world.stream_to(pos.0),
        Err(e) => log::error!("failed to access player entity for streaming: {}", e),
    }
}

fn tick_animations(time: Res<TimeResource>, mut world: ResMut<GpuTileWorld>) {
    world.tick_animations(time.update_dt);
}

fn draw_tiles(
    mut world: ResMut<GpuTileWorld>,
    mut render_state: ResMut<RenderState>,
    mut camera: ResMut<MainCamera>,
    players: Query<&Position, With<Player>>,
) {
    let map_id = world.map_id;
    if world.is_dirty() {
        let tile_size = world.manager.config().tile_size();
        world
            .manager
            .build_active_chunk_meshes(map_id, tile_size, &mut *render_state);
        world.mark_clean();
    }

    if let Ok(pos) = players.get_single() {
        camera.0.center = pos.0;
    }
    world.manager.draw_tile_map(map_id, &mut *render_state);
    render_state.render(&camera.0);
}

pub fn run(config: TileWorldConfig) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("tile streamer")
        .build(&event_loop)?;

    let mut game = Game::new(window, config)?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = game.handle_event(&event);
    });
}

struct Game {
    window: Window,
    world: World,
    update_sch: Schedule,
    frame_sch: Schedule,
}

impl Game {
    fn new(window: Window, config: TileWorldConfig) -> Result<Self, RenderError> {
        let mut world = World::new();
        world.insert_resource(TimeResource::new(config.update_dt, config.frame_dt));

        let render_state = RenderState::init(&window)?;
        world.insert_resource(render_state);

        let size = window.inner_size();
        world.insert_resource(MainCamera(Camera2d::new(
            size.width as f32,
            size.height as f32,
        )));

        let chunk_pixels = (config.chunk_width * config.tile_width) as f32;
        world
            .spawn()
            .insert(Player)
            .insert(Position(Point2::origin()))
            .insert(ScriptedPath {
                center: Point2::origin(),
                radius: chunk_pixels * 3.0,
                angular_speed: 0.2,
            });

        world.insert_resource(GpuTileWorld::new(config, 0x5eed));

        let mut update_sch = Schedule::default();
        let mut frame_sch = Schedule::default();

        // single threaded: the tile core is not meant to be touched from
        // more than one thread
        update_sch.add_stage(
            "update",
            SystemStage::single_threaded()
                .with_run_criteria(update_criteria)
                .with_system(move_player.label(UpdateStep::Move))
                .with_system(
                    stream_around_player
                        .label(UpdateStep::Stream)
                        .after(UpdateStep::Move),
                )
                .with_system(tick_animations.after(UpdateStep::Stream)),
        );
        frame_sch.add_stage(
            "draw",
            SystemStage::single_threaded()
                .with_run_criteria(frame_criteria)
                .with_system(draw_tiles),
        );

        Ok(Self {
            window,
            world,
            update_sch,
            frame_sch,
        })
    }

    fn do_update(&mut self) {
        self.update_sch.run(&mut self.world);
    }

    fn do_frame(&mut self) {
        self.frame_sch.run(&mut self.world);
    }

    fn handle_event<E>(&mut self, event: &Event<E>) -> ControlFlow {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.window.id() => match event {
                WindowEvent::Resized(size) => {
                    self.world
                        .resource_mut::<RenderState>()
                        .resize_if_needed(size, &self.window);
                    if size.width > 0 && size.height > 0 {
                        self.world.resource_mut::<MainCamera>().0.viewport =
                            [size.width as f32, size.height as f32].into();
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(VirtualKeyCode::F1),
                            ..
                        },
                    ..
                } => {
                    let mut tiles = self.world.resource_mut::<GpuTileWorld>();
                    let enabled = !tiles.manager.config().debug_outlines;
                    tiles.manager.set_debug_outlines(enabled);
                    log::info!("chunk outlines {}", if enabled { "on" } else { "off" });
                }
                WindowEvent::CloseRequested => {
                    log::info!("shutting down");
                    return ControlFlow::Exit;
                }
                _ => (),
            },
            Event::MainEventsCleared => {
                self.do_update();
                self.window.request_redraw();
            }
            Event::RedrawRequested(_) => self.do_frame(),
            _ => (),
        }

        ControlFlow::Poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> TileWorld<()> {
        TileWorld::new(
            TileWorldConfig::default()
                .with_chunk_size(4, 4)
                .with_stream_radius(1)
                .with_animation_frame_time(Duration::from_millis(100)),
            7,
        )
    }

    #[test]
    fn pixel_position_maps_to_chunk() {
        let world = world();
        // 4 tiles of 16px per chunk
        assert_eq!(world.chunk_at(Point2::new(0.0, 0.0)), ChunkCoord::new(0, 0));
        assert_eq!(world.chunk_at(Point2::new(63.9, 64.0)), ChunkCoord::new(0, 1));
        assert_eq!(world.chunk_at(Point2::new(-0.5, -64.0)), ChunkCoord::new(-1, -1));
    }

    #[test]
    fn streaming_seeds_each_chunk_once() {
        let mut world = world();
        world.stream_to(Point2::new(8.0, 8.0));
        assert!(world.is_dirty());
        assert_eq!(world.seeded.len(), 9);

        let before: Vec<u32> = world
            .manager
            .get_tile_map(0)
            .and_then(|m| m.get_chunk(0, 0))
            .map(|c| c.layers()[0].tiles().iter().map(|t| t.raw()).collect())
            .unwrap_or_default();

        world.mark_clean();
        world.stream_to(Point2::new(70.0, 8.0));
        assert!(world.is_dirty());
        assert_eq!(world.seeded.len(), 12);

        let after: Vec<u32> = world
            .manager
            .get_tile_map(0)
            .and_then(|m| m.get_chunk(0, 0))
            .map(|c| c.layers()[0].tiles().iter().map(|t| t.raw()).collect())
            .unwrap_or_default();
        assert_eq!(before, after);
    }

    #[test]
    fn staying_in_chunk_does_not_restream() {
        let mut world = world();
        world.stream_to(Point2::new(1.0, 1.0));
        world.mark_clean();
        world.stream_to(Point2::new(30.0, 30.0));
        assert!(!world.is_dirty());
    }

    #[test]
    fn animation_ticks_mark_dirty() {
        let mut world = world();
        world.stream_to(Point2::new(1.0, 1.0));
        world.mark_clean();

        if let Some(tile) = world
            .manager
            .get_tile_map_mut(0)
            .and_then(|m| m.tile_at_mut(1, 0, 0))
        {
            tile.set_flag(TileFlags::ANIMATED);
            tile.set_anim_max(2);
        }

        world.tick_animations(Duration::from_millis(50));
        assert!(!world.is_dirty());
        world.tick_animations(Duration::from_millis(50));
        assert!(world.is_dirty());
    }
}
