// Host-side tests for the scene environment, camera rays and picking.

use backdrop_core::{
    pick, ray_sphere, Camera, EffectComposer, EffectSettings, Fog, Frame, Lighting, Marker, MarkerScene, Ray,
    SceneContent, SceneEnvironment, StageContext, BACKGROUND_COLOR, FLOOR_Y, HOVER_BOOST, SCENE_WGSL,
};
use glam::{Vec2, Vec3};

#[test]
fn lights_follow_periodic_paths() {
    let mut env = SceneEnvironment::new();
    env.animate(1.7);
    for light in &env.lighting.lights {
        let a = 1.7 * light.path.frequency + light.path.phase;
        let expected = Vec3::new(a.sin() * light.path.radius, light.path.height, a.cos() * light.path.radius);
        assert!((light.position - expected).length() < 1e-5);
    }
    let first: Vec<Vec3> = env.lighting.lights.iter().map(|l| l.position).collect();
    env.animate(9.0);
    env.animate(1.7);
    let again: Vec<Vec3> = env.lighting.lights.iter().map(|l| l.position).collect();
    assert_eq!(first, again, "light motion must depend on time only");
}

#[test]
fn fog_is_linear_between_near_and_far() {
    let fog = Fog {
        color: Vec3::ONE,
        near: 10.0,
        far: 20.0,
    };
    assert_eq!(fog.factor(5.0), 0.0);
    assert_eq!(fog.factor(15.0), 0.5);
    assert_eq!(fog.factor(50.0), 1.0);
    assert_eq!(fog.apply(Vec3::ZERO, 20.0), Vec3::ONE);

    let degenerate = Fog {
        color: Vec3::ONE,
        near: 10.0,
        far: 10.0,
    };
    assert_eq!(degenerate.factor(9.9), 0.0);
    assert_eq!(degenerate.factor(10.0), 1.0);
}

#[test]
fn lighting_only_ambient_when_facing_away() {
    let env = SceneEnvironment::new();
    let lit = env.lighting.shade(Vec3::new(0.0, -50.0, 0.0), Vec3::NEG_Y, Vec3::ONE);
    assert_eq!(lit, env.lighting.ambient);
}

#[test]
fn camera_center_ray_hits_front_marker() {
    let camera = Camera::looking_at_origin(16.0 / 9.0);
    let ray = camera.ray_through(Vec2::ZERO);
    let to_target = (camera.target - camera.eye).normalize();
    assert!((ray.direction - to_target).length() < 1e-4);

    let scene = MarkerScene::ring(6);
    let (index, t) = pick(&ray, &scene.markers).unwrap();
    assert_eq!(index, 0);
    assert!(t > 0.0);
}

#[test]
fn projection_and_ray_are_consistent() {
    let camera = Camera::looking_at_origin(1.5);
    let world = Vec3::new(1.0, 0.5, -2.0);
    let ndc = camera.project(world).unwrap();
    let ray = camera.ray_through(Vec2::new(ndc.x, ndc.y));
    let to_point = (world - camera.eye).normalize();
    assert!((ray.direction - to_point).length() < 1e-3);
}

#[test]
fn pick_prefers_nearest_marker() {
    let ray = Ray {
        origin: Vec3::ZERO,
        direction: Vec3::Z,
    };
    let markers = [
        Marker {
            center: Vec3::new(0.0, 0.0, 8.0),
            radius: 1.0,
        },
        Marker {
            center: Vec3::new(0.0, 0.0, 4.0),
            radius: 1.0,
        },
        Marker {
            center: Vec3::new(5.0, 0.0, 4.0),
            radius: 1.0,
        },
    ];
    assert_eq!(pick(&ray, &markers).map(|(i, _)| i), Some(1));
    assert_eq!(ray_sphere(ray.origin, ray.direction, Vec3::new(5.0, 0.0, 4.0), 1.0), None);
}

struct Stripe;

impl SceneContent for Stripe {
    fn rasterize(&self, target: &mut Frame, _: &Camera, _: &Lighting, _: &Fog) {
        for y in 0..target.height() {
            target.set(0, y, Vec3::ONE);
        }
    }
}

#[test]
fn environment_clears_then_draws_content() {
    let env = SceneEnvironment::new();
    let camera = Camera::looking_at_origin(1.0);
    let frame = env.rasterize(&Stripe, &camera, 8, 4);
    assert_eq!(frame.get(0, 2), Vec3::ONE);
    assert_eq!(frame.get(5, 2), BACKGROUND_COLOR);

    let mut composer = EffectComposer::from_settings(&EffectSettings::all_disabled());
    let out = env.render(&Stripe, &camera, 8, 4, &mut composer, &StageContext::default());
    assert_eq!(out, frame);
}

#[test]
fn marker_scene_renders_markers_and_floor() {
    let env = SceneEnvironment::new();
    let camera = Camera::looking_at_origin(1.0);
    let scene = MarkerScene::ring(6);
    let frame = env.rasterize(&scene, &camera, 32, 32);
    // top row looks above the horizon, bottom row at the floor
    assert_eq!(frame.get(16, 0), BACKGROUND_COLOR);
    assert_ne!(frame.get(16, 31), BACKGROUND_COLOR);
}

#[test]
fn scene_uniforms_pack_environment() {
    let mut env = SceneEnvironment::new();
    env.animate(2.0);
    let camera = Camera::looking_at_origin(1.0);
    let mut scene = MarkerScene::ring(6);
    scene.hovered = Some(2);
    let u = env.uniforms(&camera, &scene);
    assert_eq!(u.info[0], 6.0);
    assert_eq!(u.info[1], 2.0);
    assert_eq!(u.ambient[3], env.lighting.lights.len() as f32);
    assert_eq!(u.eye[3], 2.0);
    assert_eq!(&u.light_pos[0][..3], &env.lighting.lights[0].position.to_array());
    assert_eq!(std::mem::size_of_val(&u), 400);

    scene.hovered = None;
    assert_eq!(env.uniforms(&camera, &scene).info[1], -1.0);
}

#[test]
fn scene_shader_takes_constants_from_rust() {
    let src = backdrop_core::scene_shader_source();
    for name in ["FLOOR_Y", "GRID_SPACING", "GRID_LINE", "GRID_COLOR", "FLOOR_COLOR", "MARKER_COLOR", "HOVER_BOOST"] {
        let decl = format!("const {name}:");
        assert!(!SCENE_WGSL.contains(&decl), "{name} hard-coded in scene.wgsl");
        assert_eq!(src.matches(&decl).count(), 1, "{name} declared once");
    }
    assert!(src.contains(&format!("const FLOOR_Y: f32 = {:?};", FLOOR_Y)));
    assert!(src.contains(&format!("const HOVER_BOOST: f32 = {:?};", HOVER_BOOST)));
    assert!(src.contains("const MARKER_COLOR: vec3<f32> = vec3<f32>(0.1, 0.9, 1.0);"));
    assert!(src.contains("fn fs_main"));
}
