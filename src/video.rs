//! Video frame and palette
//!
//! The frame buffer is allocated once for the largest geometry the host is
//! told about and never resized. The engine renders into the first
//! `width * height` pixels, row stride = `width`; only those logical
//! dimensions are ever reported to the host.

/// Largest geometry announced to the host.
pub const MAX_WIDTH: usize = 640;
pub const MAX_HEIGHT: usize = 480;

/// Logical screen size, including border.
pub const SCREEN_WIDTH: usize = 272;
pub const SCREEN_HEIGHT: usize = 228;

/// Indexed palette size (16 VDP colors plus sprite and border variants).
pub const PALETTE_SIZE: usize = 80;

/// SCREEN 8 direct-color palette size.
pub const SCREEN8_PALETTE_SIZE: usize = 256;

/// 16-bit pixel bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// `RRRRRGGGGGGBBBBB`
    Rgb565,
    /// `BBBBBGGGGGGRRRRR`, as the PSP GU expects
    Bgr565,
}

impl Default for PixelLayout {
    #[cfg(target_os = "psp")]
    fn default() -> Self {
        PixelLayout::Bgr565
    }

    #[cfg(not(target_os = "psp"))]
    fn default() -> Self {
        PixelLayout::Rgb565
    }
}

impl PixelLayout {
    /// Encode 8-bit-per-channel RGB.
    pub fn encode(self, r: u8, g: u8, b: u8) -> u16 {
        let r = (31 * r as u32 / 255) as u16;
        let g = (63 * g as u32 / 255) as u16;
        let b = (31 * b as u32 / 255) as u16;
        match self {
            PixelLayout::Rgb565 => (r << 11) | (g << 5) | b,
            PixelLayout::Bgr565 => (b << 11) | (g << 5) | r,
        }
    }
}

/// Colors the engine renders with.
#[derive(Debug, Clone)]
pub struct Palette {
    layout: PixelLayout,
    /// Entries 1..80; entry 0 is unused here, see `background`
    indexed: [u16; PALETTE_SIZE],
    /// Color 0 (transparent/backdrop)
    background: u16,
    /// SCREEN 8 fixed GRB 3-3-2 palette
    screen8: [u16; SCREEN8_PALETTE_SIZE],
}

impl Palette {
    pub fn new(layout: PixelLayout) -> Self {
        let mut screen8 = [0u16; SCREEN8_PALETTE_SIZE];
        for (i, entry) in screen8.iter_mut().enumerate() {
            let i = i as u32;
            let r = ((i >> 2) & 0x07) * 255 / 7;
            let g = ((i >> 5) & 0x07) * 255 / 7;
            let b = (i & 0x03) * 255 / 3;
            *entry = layout.encode(r as u8, g as u8, b as u8);
        }
        Self {
            layout,
            indexed: [0; PALETTE_SIZE],
            background: 0,
            screen8,
        }
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Store color `index`; index 0 sets the background color.
    /// Out-of-range indices are ignored.
    pub fn set(&mut self, index: u8, r: u8, g: u8, b: u8) {
        let color = self.layout.encode(r, g, b);
        match index as usize {
            0 => self.background = color,
            i if i < PALETTE_SIZE => self.indexed[i] = color,
            _ => {}
        }
    }

    /// Encoded color for `index` (0 = background).
    pub fn color(&self, index: u8) -> u16 {
        match index as usize {
            0 => self.background,
            i if i < PALETTE_SIZE => self.indexed[i],
            _ => 0,
        }
    }

    pub fn background(&self) -> u16 {
        self.background
    }

    pub fn screen8(&self, value: u8) -> u16 {
        self.screen8[value as usize]
    }

    /// Reset every indexed entry and the background to black.
    pub fn clear(&mut self) {
        let black = self.layout.encode(0, 0, 0);
        self.indexed = [black; PALETTE_SIZE];
        self.background = black;
    }
}

/// Frame buffer handed to the host once per frame.
pub struct VideoFrame {
    pixels: Vec<u16>,
    width: usize,
    height: usize,
}

impl Default for VideoFrame {
    fn default() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl VideoFrame {
    /// Allocate the maximum-size buffer with the given logical size.
    /// The logical size is clamped to the allocation.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; MAX_WIDTH * MAX_HEIGHT],
            width: width.min(MAX_WIDTH),
            height: height.min(MAX_HEIGHT),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride in bytes.
    pub fn pitch(&self) -> usize {
        self.width * std::mem::size_of::<u16>()
    }

    /// Logical pixels, row-major.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels[..self.width * self.height]
    }

    pub fn pixels_mut(&mut self) -> &mut [u16] {
        let len = self.width * self.height;
        &mut self.pixels[..len]
    }

    /// Mutable access to one row of logical pixels.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u16]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&mut self.pixels[start..start + self.width])
    }

    /// Number of pixels in the backing allocation.
    pub fn capacity(&self) -> usize {
        self.pixels.len()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rgb565() {
        let rgb = PixelLayout::Rgb565;
        assert_eq!(rgb.encode(0, 0, 0), 0x0000);
        assert_eq!(rgb.encode(255, 255, 255), 0xFFFF);
        assert_eq!(rgb.encode(255, 0, 0), 0xF800);
        assert_eq!(rgb.encode(0, 255, 0), 0x07E0);
        assert_eq!(rgb.encode(0, 0, 255), 0x001F);
        // 31*128/255 = 15, 63*128/255 = 31
        assert_eq!(rgb.encode(128, 128, 128), (15 << 11) | (31 << 5) | 15);
    }

    #[test]
    fn test_encode_bgr565_swaps_red_and_blue() {
        let bgr = PixelLayout::Bgr565;
        assert_eq!(bgr.encode(255, 0, 0), 0x001F);
        assert_eq!(bgr.encode(0, 0, 255), 0xF800);
        assert_eq!(bgr.encode(0, 255, 0), 0x07E0);
    }

    #[test]
    fn test_palette_background_is_separate() {
        let mut pal = Palette::new(PixelLayout::Rgb565);
        pal.set(0, 255, 0, 0);
        pal.set(1, 0, 0, 255);
        assert_eq!(pal.background(), 0xF800);
        assert_eq!(pal.color(0), 0xF800);
        assert_eq!(pal.color(1), 0x001F);
        pal.set(200, 255, 255, 255);
        assert_eq!(pal.color(200), 0);
    }

    #[test]
    fn test_palette_clear() {
        let mut pal = Palette::new(PixelLayout::Rgb565);
        pal.set(0, 10, 200, 30);
        pal.set(79, 255, 255, 255);
        pal.clear();
        assert_eq!(pal.color(0), 0);
        assert_eq!(pal.color(79), 0);
    }

    #[test]
    fn test_screen8_palette() {
        let pal = Palette::new(PixelLayout::Rgb565);
        assert_eq!(pal.screen8(0x00), 0x0000);
        // GGGRRRBB all ones is white
        assert_eq!(pal.screen8(0xFF), 0xFFFF);
        // Red bits only: 0b000_111_00
        assert_eq!(pal.screen8(0x1C), 0xF800);
        // Blue bits only: 0b000_000_11
        assert_eq!(pal.screen8(0x03), 0x001F);
    }

    #[test]
    fn test_frame_reports_logical_size() {
        let frame = VideoFrame::default();
        assert_eq!(frame.width(), SCREEN_WIDTH);
        assert_eq!(frame.height(), SCREEN_HEIGHT);
        assert_eq!(frame.pitch(), SCREEN_WIDTH * 2);
        assert_eq!(frame.pixels().len(), SCREEN_WIDTH * SCREEN_HEIGHT);
        assert_eq!(frame.capacity(), MAX_WIDTH * MAX_HEIGHT);
    }

    #[test]
    fn test_frame_clamps_to_allocation() {
        let frame = VideoFrame::new(1024, 1024);
        assert_eq!(frame.width(), MAX_WIDTH);
        assert_eq!(frame.height(), MAX_HEIGHT);
    }

    #[test]
    fn test_row_mut() {
        let mut frame = VideoFrame::new(4, 2);
        frame.row_mut(1).unwrap().fill(7);
        assert_eq!(frame.pixels(), &[0, 0, 0, 0, 7, 7, 7, 7]);
        assert!(frame.row_mut(2).is_none());
    }
}
