use crate::render::composite::fill_in_place;

/// Off-screen premultiplied RGBA8 buffer sized to the viewport, reused across exports.
#[derive(Debug, Default)]
pub struct ScratchPad {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ScratchPad {
    pub fn new(width: u32, height: u32) -> Self {
        let mut pad = Self::default();
        pad.set_pixel_size(width, height);
        pad
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let len = (width as usize) * (height as usize) * 4;
        self.data.clear();
        self.data.resize(len, 0);
    }

    /// Reset to transparent and hand out the buffer.
    pub fn clear(&mut self) -> &mut [u8] {
        fill_in_place(&mut self.data, [0, 0, 0, 0]);
        &mut self.data
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
