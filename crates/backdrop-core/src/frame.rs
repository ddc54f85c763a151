use glam::{Vec2, Vec3};

/// Linear RGB image used by the CPU stage programs.
///
/// Pixels are stored row-major, top row first. Texture coordinates follow the
/// GPU convention: `uv = (0, 0)` is the top-left corner, sampled at pixel
/// centers.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Vec3::ZERO)
    }

    pub fn filled(width: u32, height: u32, color: Vec3) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec3] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Vec3) {
        let i = (y * self.width + x) as usize;
        self.pixels[i] = color;
    }

    /// Clamped integer fetch; out-of-range coordinates repeat the edge.
    #[inline]
    pub fn fetch(&self, x: i64, y: i64) -> Vec3 {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(cx, cy)
    }

    /// Bilinear, clamp-to-edge sample at texture coordinate `uv`.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let px = uv.x * self.width as f32 - 0.5;
        let py = uv.y * self.height as f32 - 0.5;
        let x0 = px.floor();
        let y0 = py.floor();
        let fx = px - x0;
        let fy = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = self.fetch(x0, y0).lerp(self.fetch(x0 + 1, y0), fx);
        let bottom = self.fetch(x0, y0 + 1).lerp(self.fetch(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    /// Texture coordinate of the center of pixel `(x, y)`.
    #[inline]
    pub fn uv_of(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    /// Runs `f(uv, centered)` for every pixel and collects the results into a
    /// new frame of the same size. `centered` is `uv * 2 - 1`.
    pub fn map_uv(&self, mut f: impl FnMut(Vec2, Vec2, Vec3) -> Vec3) -> Frame {
        let mut out = Vec::with_capacity(self.pixels.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let uv = self.uv_of(x, y);
                out.push(f(uv, uv * 2.0 - Vec2::ONE, self.get(x, y)));
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            pixels: out,
        }
    }

    /// 8-bit RGBA export with a clamp to [0, 1]; alpha is opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            let c = p.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
            bytes.extend_from_slice(&[c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]);
        }
        bytes
    }
}

#[inline]
pub fn luminance(c: Vec3) -> f32 {
    c.dot(crate::constants::LUMA_WEIGHTS)
}

/// GLSL-style smoothstep. Degenerate edges (`edge0 >= edge1`) act as a step at
/// `edge0`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
