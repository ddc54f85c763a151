use crate::helpers::ColorTarget;

pub(crate) const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Offscreen color targets for the backdrop.
///
/// - `hdr` receives the scene pass.
/// - `ping` alternate as stage outputs; the chain reads from whichever was
///   written last.
/// - `bloom_*` are half-res buffers used for bright-pass and blur.
///
/// Every texture is destroyed when the struct is dropped or recreated.
pub(crate) struct RenderTargets {
    pub(crate) hdr: ColorTarget,
    pub(crate) ping: [ColorTarget; 2],
    pub(crate) bloom_a: ColorTarget,
    pub(crate) bloom_b: ColorTarget,
}

/// Which target currently holds the chain's image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Hdr,
    Ping(usize),
}

impl Slot {
    /// Output slot for a pass reading from `self`.
    pub(crate) fn next(self) -> Slot {
        match self {
            Slot::Ping(0) => Slot::Ping(1),
            _ => Slot::Ping(0),
        }
    }
}

impl RenderTargets {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let bw = (width.max(1) / 2).max(1);
        let bh = (height.max(1) / 2).max(1);
        log::debug!("[gpu] render targets {}x{} (bloom {}x{})", width, height, bw, bh);
        Self {
            hdr: ColorTarget::new(device, "hdr_tex", width, height, HDR_FORMAT),
            ping: [
                ColorTarget::new(device, "ping_a", width, height, HDR_FORMAT),
                ColorTarget::new(device, "ping_b", width, height, HDR_FORMAT),
            ],
            bloom_a: ColorTarget::new(device, "bloom_a", bw, bh, HDR_FORMAT),
            bloom_b: ColorTarget::new(device, "bloom_b", bw, bh, HDR_FORMAT),
        }
    }

    pub(crate) fn recreate(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        self.hdr.size()
    }

    pub(crate) fn bloom_size(&self) -> (u32, u32) {
        self.bloom_a.size()
    }

    pub(crate) fn view(&self, slot: Slot) -> &wgpu::TextureView {
        match slot {
            Slot::Hdr => &self.hdr.view,
            Slot::Ping(i) => &self.ping[i.min(1)].view,
        }
    }
}
