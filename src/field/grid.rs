//! Concentration grid with an RGBA-like cell layout shared with the GPU.

use bytemuck::{Pod, Zeroable};

/// One grid cell: chemical A in channel 0, chemical B in channel 2
///
/// Channels 1 and 3 are fixed (0 and 1) so the layout matches a `vec4<f32>`
/// storage element on the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Cell {
    pub a: f32,
    unused: f32,
    pub b: f32,
    alpha: f32,
}

impl Cell {
    /// All-zero cell used when clearing buffers
    pub const ZERO: Self = Self {
        a: 0.0,
        unused: 0.0,
        b: 0.0,
        alpha: 0.0,
    };

    pub const fn new(a: f32, b: f32) -> Self {
        Self {
            a,
            unused: 0.0,
            b,
            alpha: 1.0,
        }
    }

    /// Quantize to RGBA8 (A in red, B in blue), clamping to [0, 1]
    pub fn to_rgba8(self) -> [u8; 4] {
        [quantize(self.a), 0, quantize(self.b), 255]
    }
}

fn quantize(value: f32) -> u8 {
    // NaN maps to 0 through `as` saturation
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Row-major 2D grid of cells; row 0 is the top of the image
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Field {
    /// Create a zero-filled field
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::ZERO; (width as usize) * (height as usize)],
        }
    }

    /// Create a field by evaluating `f(dx, dy)` at every cell, where `dx, dy`
    /// are the cell's offsets from the grid center
    pub fn from_fn(width: u32, height: u32, f: impl Fn(f32, f32) -> Cell) -> Self {
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let mut cells = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x as f32 - cx, y as f32 - cy));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grid center in cell coordinates
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    /// Cell at (x, y). Panics when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Cell {
        self.cells[self.index(x, y)]
    }

    /// Cell at (x, y) with coordinates clamped to the nearest edge
    pub fn get_clamped(&self, x: i64, y: i64) -> Cell {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.get(x, y)
    }

    pub fn set(&mut self, x: u32, y: u32, cell: Cell) {
        let idx = self.index(x, y);
        self.cells[idx] = cell;
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Overwrite every cell with `cell`
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Copy cell data from a same-sized field
    pub fn copy_from(&mut self, other: &Field) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        self.cells.copy_from_slice(&other.cells);
    }

    /// Raw bytes for GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// Byte size of the cell data
    pub fn byte_len(&self) -> u64 {
        (self.cells.len() * std::mem::size_of::<Cell>()) as u64
    }

    /// Quantized RGBA8 pixels in row-major order
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|cell| cell.to_rgba8()).collect()
    }
}
