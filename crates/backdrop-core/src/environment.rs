//! Scene environment: background, distance fog and animated point lights.
//!
//! The environment wraps arbitrary [`SceneContent`], rasterizes it under the
//! current lighting and hands the image to the [`EffectComposer`]. Light motion
//! is a pure function of elapsed time. Pointer state is never read here.

use crate::camera::{pick, Camera, Marker, Ray};
use crate::composer::EffectComposer;
use crate::constants::*;
use crate::frame::Frame;
use crate::stages::StageContext;
use bytemuck::Zeroable;
use glam::{Vec2, Vec3};
use smallvec::SmallVec;

/// Deterministic periodic orbit: `x = sin(t·f + phase)·r`,
/// `z = cos(t·f + phase)·r`, constant height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightPath {
    pub radius: f32,
    pub frequency: f32,
    pub phase: f32,
    pub height: f32,
}

impl LightPath {
    pub fn position(&self, t: f32) -> Vec3 {
        let a = t * self.frequency + self.phase;
        Vec3::new(a.sin() * self.radius, self.height, a.cos() * self.radius)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the contribution reaches zero.
    pub range: f32,
    pub path: LightPath,
    pub position: Vec3,
}

impl PointLight {
    pub fn new(color: Vec3, intensity: f32, range: f32, path: LightPath) -> Self {
        Self {
            color,
            intensity,
            range,
            path,
            position: path.position(0.0),
        }
    }

    pub fn attenuation(&self, distance: f32) -> f32 {
        if self.range <= 0.0 {
            return 0.0;
        }
        let f = (1.0 - distance / self.range).clamp(0.0, 1.0);
        f * f
    }
}

/// Linear distance fog toward `color`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// 0 at `near` and closer, 1 at `far` and beyond.
    pub fn factor(&self, distance: f32) -> f32 {
        if self.far <= self.near {
            return if distance < self.near { 0.0 } else { 1.0 };
        }
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }

    pub fn apply(&self, color: Vec3, distance: f32) -> Vec3 {
        color.lerp(self.color, self.factor(distance))
    }
}

/// Lighting handed to scene content.
#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: Vec3,
    pub lights: SmallVec<[PointLight; MAX_LIGHTS]>,
}

impl Lighting {
    /// Ambient plus Lambert diffuse from every point light.
    pub fn shade(&self, point: Vec3, normal: Vec3, albedo: Vec3) -> Vec3 {
        let mut sum = self.ambient;
        for light in &self.lights {
            let to_light = light.position - point;
            let dist = to_light.length();
            if dist <= f32::EPSILON {
                continue;
            }
            let ndotl = normal.dot(to_light / dist).max(0.0);
            sum += light.color * (light.intensity * ndotl * light.attenuation(dist));
        }
        albedo * sum
    }
}

/// Anything that can draw itself into the scene image.
pub trait SceneContent {
    /// Draws over `target`, which arrives cleared to the background color.
    fn rasterize(&self, target: &mut Frame, camera: &Camera, lighting: &Lighting, fog: &Fog);
}

pub struct SceneEnvironment {
    pub background: Vec3,
    pub fog: Fog,
    pub lighting: Lighting,
    elapsed: f32,
}

impl Default for SceneEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneEnvironment {
    /// Cyberpunk defaults: magenta, cyan and violet lights on separate orbits.
    pub fn new() -> Self {
        let lights = [
            PointLight::new(
                Vec3::new(1.0, 0.1, 0.8),
                2.0,
                12.0,
                LightPath {
                    radius: 4.0,
                    frequency: 0.5,
                    phase: 0.0,
                    height: 2.5,
                },
            ),
            PointLight::new(
                Vec3::new(0.1, 0.9, 1.0),
                1.6,
                10.0,
                LightPath {
                    radius: 3.0,
                    frequency: 0.7,
                    phase: 2.1,
                    height: 1.5,
                },
            ),
            PointLight::new(
                Vec3::new(0.6, 0.2, 1.0),
                1.2,
                14.0,
                LightPath {
                    radius: 5.0,
                    frequency: 0.3,
                    phase: 4.2,
                    height: 3.5,
                },
            ),
        ];
        Self {
            background: BACKGROUND_COLOR,
            fog: Fog {
                color: BACKGROUND_COLOR,
                near: FOG_NEAR,
                far: FOG_FAR,
            },
            lighting: Lighting {
                ambient: AMBIENT_LIGHT,
                lights: lights.into_iter().collect(),
            },
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Moves every light to its path position at `t` seconds.
    pub fn animate(&mut self, t: f32) {
        self.elapsed = t;
        for light in self.lighting.lights.iter_mut() {
            light.position = light.path.position(t);
        }
    }

    /// Background clear followed by the content.
    pub fn rasterize(&self, content: &dyn SceneContent, camera: &Camera, width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, self.background);
        content.rasterize(&mut frame, camera, &self.lighting, &self.fog);
        frame
    }

    /// Rasterizes the content and runs the effect chain over it.
    pub fn render(
        &self,
        content: &dyn SceneContent,
        camera: &Camera,
        width: u32,
        height: u32,
        composer: &mut EffectComposer,
        ctx: &StageContext,
    ) -> Frame {
        let scene = self.rasterize(content, camera, width, height);
        composer.render(&scene, ctx)
    }
}

/// Grid floor plus pickable marker spheres, raycast per pixel. Mirrors the
/// GPU scene shader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerScene {
    pub markers: Vec<Marker>,
    pub hovered: Option<usize>,
}

impl MarkerScene {
    /// `count` markers evenly spaced on a ring around the origin.
    pub fn ring(count: usize) -> Self {
        let count = count.min(MAX_MARKERS);
        let markers = (0..count)
            .map(|i| {
                let a = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
                Marker {
                    center: Vec3::new(a.sin() * MARKER_RING_RADIUS, 0.0, a.cos() * MARKER_RING_RADIUS),
                    radius: PICK_SPHERE_RADIUS,
                }
            })
            .collect();
        Self {
            markers,
            hovered: None,
        }
    }

    /// Color seen along `ray`, or `None` when it escapes to the background.
    pub fn trace(&self, ray: &Ray, lighting: &Lighting, fog: &Fog) -> Option<Vec3> {
        if let Some((i, t)) = pick(ray, &self.markers) {
            let p = ray.at(t);
            let n = (p - self.markers[i].center).normalize_or_zero();
            let mut albedo = MARKER_COLOR;
            if self.hovered == Some(i) {
                albedo *= HOVER_BOOST;
            }
            return Some(fog.apply(lighting.shade(p, n, albedo), t));
        }
        if ray.direction.y >= -1e-4 {
            return None;
        }
        let t = (FLOOR_Y - ray.origin.y) / ray.direction.y;
        let p = ray.at(t);
        let albedo = if on_grid_line(Vec2::new(p.x, p.z)) {
            GRID_COLOR
        } else {
            FLOOR_COLOR
        };
        Some(fog.apply(lighting.shade(p, Vec3::Y, albedo), t))
    }
}

fn on_grid_line(p: Vec2) -> bool {
    let q = p / GRID_SPACING;
    let cell = q - q.floor();
    let edge = GRID_LINE_WIDTH / GRID_SPACING;
    cell.x < edge || cell.y < edge || cell.x > 1.0 - edge || cell.y > 1.0 - edge
}

impl SceneContent for MarkerScene {
    fn rasterize(&self, target: &mut Frame, camera: &Camera, lighting: &Lighting, fog: &Fog) {
        let next = target.map_uv(|_, centered, background| {
            // frame rows run top-down, NDC y runs up
            let ray = camera.ray_through(Vec2::new(centered.x, -centered.y));
            self.trace(&ray, lighting, fog).unwrap_or(background)
        });
        *target = next;
    }
}

fn wgsl_vec3(v: Vec3) -> String {
    format!("vec3<f32>({:?}, {:?}, {:?})", v.x, v.y, v.z)
}

/// Scene constants shared with [`MarkerScene::trace`], rendered as WGSL so the
/// GPU scene pass reads the same floor, grid and marker values.
pub fn wgsl_constants() -> String {
    format!(
        "const FLOOR_Y: f32 = {:?};
const GRID_SPACING: f32 = {:?};
const GRID_LINE: f32 = {:?};
const GRID_COLOR: vec3<f32> = {};
const FLOOR_COLOR: vec3<f32> = {};
const MARKER_COLOR: vec3<f32> = {};
const HOVER_BOOST: f32 = {:?};
",
        FLOOR_Y,
        GRID_SPACING,
        GRID_LINE_WIDTH,
        wgsl_vec3(GRID_COLOR),
        wgsl_vec3(FLOOR_COLOR),
        wgsl_vec3(MARKER_COLOR),
        HOVER_BOOST,
    )
}

/// Uniform block of `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub inv_view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub background: [f32; 4],
    pub fog: [f32; 4],
    pub ambient: [f32; 4],
    pub light_pos: [[f32; 4]; MAX_LIGHTS],
    pub light_color: [[f32; 4]; MAX_LIGHTS],
    pub markers: [[f32; 4]; MAX_MARKERS],
    pub info: [f32; 4],
}

impl SceneEnvironment {
    /// Packs the environment, camera and markers for the GPU scene pass.
    pub fn uniforms(&self, camera: &Camera, scene: &MarkerScene) -> SceneUniforms {
        let mut u = SceneUniforms::zeroed();
        u.inv_view_proj = camera.view_proj().inverse().to_cols_array_2d();
        u.eye = camera.eye.extend(self.elapsed).to_array();
        u.background = self.background.extend(self.fog.near).to_array();
        u.fog = self.fog.color.extend(self.fog.far).to_array();
        let lights = self.lighting.lights.len().min(MAX_LIGHTS);
        u.ambient = self.lighting.ambient.extend(lights as f32).to_array();
        for (i, light) in self.lighting.lights.iter().take(MAX_LIGHTS).enumerate() {
            u.light_pos[i] = light.position.extend(light.range).to_array();
            u.light_color[i] = light.color.extend(light.intensity).to_array();
        }
        let markers = scene.markers.len().min(MAX_MARKERS);
        for (i, m) in scene.markers.iter().take(MAX_MARKERS).enumerate() {
            u.markers[i] = m.center.extend(m.radius).to_array();
        }
        let hovered = scene.hovered.filter(|&i| i < markers).map_or(-1.0, |i| i as f32);
        u.info = [markers as f32, hovered, 0.0, 0.0];
        u
    }
}
