mod gpu;
mod helpers;
mod post;
mod targets;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use backdrop_core::{
    install_frame_hook, pick, priority, stage_for_digit, Camera, CorrectionMode, EffectComposer,
    EffectSettings, FrameClock, FrameScheduler, MarkerScene, PointerCorrection, PointerState, SceneEnvironment,
    StageContext, ViewportGeometry, ViewportRect,
};
use glam::Vec2;
use winit::keyboard::{Key, NamedKey};
use winit::{event::*, event_loop::EventLoop, window::WindowBuilder};

const MARKER_COUNT: usize = 6;

/// Frame-coupled state shared between the scheduler callbacks and the event
/// loop. Everything lives on the render thread.
struct Shared {
    environment: Rc<RefCell<SceneEnvironment>>,
    scene: Rc<RefCell<MarkerScene>>,
    camera: Rc<RefCell<Camera>>,
    pointer: Rc<RefCell<PointerState>>,
    correction: Rc<RefCell<PointerCorrection>>,
    composer: Rc<RefCell<EffectComposer>>,
    settings: Rc<RefCell<EffectSettings>>,
    settings_dirty: Rc<Cell<bool>>,
}

fn geometry(window: &winit::window::Window) -> ViewportGeometry {
    let dpr = window.scale_factor() as f32;
    let size = window.inner_size();
    ViewportGeometry::new(size.width as f32 / dpr, size.height as f32 / dpr, dpr)
}

/// Key bindings: digits toggle stages, `c` toggles pointer correction and
/// `m` switches its mode. Returns whether the settings changed.
fn handle_key(key: &str, settings: &mut EffectSettings) -> bool {
    if let Some(kind) = stage_for_digit(key) {
        let on = settings.toggle_stage(kind);
        log::info!("[keys] {} {}", kind, if on { "on" } else { "off" });
        return true;
    }
    match key {
        "c" | "C" => {
            settings.enable_pointer_correction = !settings.enable_pointer_correction;
            log::info!("[keys] pointer correction={}", settings.enable_pointer_correction);
            true
        }
        "m" | "M" => {
            settings.pointer_correction_mode = match settings.pointer_correction_mode {
                CorrectionMode::Forward => CorrectionMode::Inverse,
                CorrectionMode::Inverse => CorrectionMode::Forward,
            };
            log::info!("[keys] pointer correction mode={:?}", settings.pointer_correction_mode);
            true
        }
        _ => false,
    }
}

fn register_callbacks(scheduler: &mut FrameScheduler, shared: &Shared) {
    install_frame_hook(scheduler, Rc::clone(&shared.correction), Rc::clone(&shared.pointer));

    let environment = Rc::clone(&shared.environment);
    scheduler.register("light_animation", priority::LIGHT_ANIMATION, move |t| {
        environment.borrow_mut().animate(t.elapsed);
    });

    let (composer, correction, settings, dirty) = (
        Rc::clone(&shared.composer),
        Rc::clone(&shared.correction),
        Rc::clone(&shared.settings),
        Rc::clone(&shared.settings_dirty),
    );
    scheduler.register("stage_parameters", priority::STAGE_PARAMETERS, move |_| {
        if dirty.replace(false) {
            let settings = settings.borrow();
            composer.borrow_mut().apply_settings(&settings);
            correction.borrow_mut().apply_settings(&settings);
        }
    });

    let (scene, camera, pointer) = (
        Rc::clone(&shared.scene),
        Rc::clone(&shared.camera),
        Rc::clone(&shared.pointer),
    );
    scheduler.register("hover_hit_test", priority::HIT_TEST, move |_| {
        let p = *pointer.borrow();
        let mut scene = scene.borrow_mut();
        let hovered = if p.inside {
            let ray = camera.borrow().ray_through(p.ndc);
            pick(&ray, &scene.markers).map(|(i, _)| i)
        } else {
            None
        };
        if hovered != scene.hovered {
            log::debug!("[pointer] hover {:?}", hovered);
            scene.hovered = hovered;
        }
    });
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = EffectSettings::from_pairs(args.iter().map(String::as_str))?;
    log::info!("[settings] {} override(s) applied", args.len());

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("CRT Backdrop (native)")
        .build(&event_loop)?;

    let mut state = pollster::block_on(gpu::GpuState::new(&window, settings.quality))?;

    let shared = Shared {
        environment: Rc::new(RefCell::new(SceneEnvironment::new())),
        scene: Rc::new(RefCell::new(MarkerScene::ring(MARKER_COUNT))),
        camera: Rc::new(RefCell::new(Camera::looking_at_origin(geometry(&window).aspect()))),
        pointer: Rc::new(RefCell::new(PointerState::default())),
        correction: Rc::new(RefCell::new(PointerCorrection::from_settings(&settings))),
        composer: Rc::new(RefCell::new(EffectComposer::from_settings(&settings))),
        settings: Rc::new(RefCell::new(settings)),
        settings_dirty: Rc::new(Cell::new(false)),
    };
    let mut scheduler = FrameScheduler::new();
    register_callbacks(&mut scheduler, &shared);
    log::info!("[scheduler] frame order: {}", scheduler.labels().join(" -> "));

    let mut clock = FrameClock::new();
    let mut cursor_px: Option<Vec2> = None;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(size) => {
                state.resize(size);
                shared.camera.borrow_mut().aspect = geometry(state.window).aspect();
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                state.resize(state.window.inner_size());
                shared.camera.borrow_mut().aspect = geometry(state.window).aspect();
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed && !event.repeat => {
                match &event.logical_key {
                    Key::Named(NamedKey::Escape) => elwt.exit(),
                    Key::Character(c) => {
                        if handle_key(c.as_str(), &mut shared.settings.borrow_mut()) {
                            shared.settings_dirty.set(true);
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let px = Vec2::new(position.x as f32, position.y as f32);
                cursor_px = Some(px);
                let ndc = geometry(state.window).ndc_from_physical(px);
                shared.pointer.borrow_mut().set_raw(ndc);
            }
            WindowEvent::CursorLeft { .. } => {
                cursor_px = None;
                shared.pointer.borrow_mut().inside = false;
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => {
                let pressed = button_state == ElementState::Pressed;
                shared.pointer.borrow_mut().down = pressed;
                let Some(px) = cursor_px.filter(|_| pressed) else {
                    return;
                };
                // window events arrive in physical pixels relative to the surface
                let size = state.window.inner_size();
                let rect = ViewportRect::from_size(size.width as f32, size.height as f32);
                let camera = shared.camera.borrow();
                let correction = shared.correction.borrow();
                if let Some((sample, ray)) = correction.event_ray(px, &rect, &camera) {
                    match pick(&ray, &shared.scene.borrow().markers) {
                        Some((i, t)) => log::info!(
                            "[pointer] selected marker {} at distance {:.2} (raw {:?} -> {:?})",
                            i,
                            t,
                            sample.raw_ndc,
                            sample.corrected_ndc
                        ),
                        None => log::debug!("[pointer] click at {:?} hit nothing", sample.corrected_ndc),
                    }
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let time = clock.tick();
            scheduler.run(&time);
            let ctx = StageContext {
                time: time.elapsed,
                frame_index: time.frame_index,
                max_dimension: state.max_dimension(),
            };
            let uniforms = shared
                .environment
                .borrow()
                .uniforms(&shared.camera.borrow(), &shared.scene.borrow());
            let plan = shared.composer.borrow().plan();
            match state.render(&uniforms, &plan, &ctx) {
                Ok(()) => state.window.request_redraw(),
                Err(e) if e.is_fatal() => {
                    log::error!("[gpu] {}", e);
                    elwt.exit();
                }
                Err(e) => log::warn!("[gpu] {}", e),
            }
        }
        _ => {}
    })?;
    Ok(())
}
