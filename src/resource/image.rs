/// An RGBA pixel buffer produced by miptex expansion. `data` holds
/// `width * height * channels` bytes in row-major order.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub channels: usize,
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new() -> Self {
        Image {
            channels: 4,
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    pub fn with_dimensions(width: usize, height: usize) -> Self {
        Image {
            channels: 4,
            width,
            height,
            data: vec![0; width * height * 4],
        }
    }
}
