use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Byte the buffers are filled with before anything has been rendered. Never
/// produced by a shader, since palettes are printable ASCII.
pub const UNRENDERED: u8 = 0;

/// A write buffer and a published buffer of shade bytes, row-major.
///
/// Workers write disjoint cells of the back buffer without locking. The last
/// worker of a generation flips the buffers, after which readers see the
/// finished frame.
#[derive(Debug)]
pub struct FrameBuffers {
    columns: usize,
    rows: usize,
    cells: [Vec<AtomicU8>; 2],
    front: AtomicUsize,
}

impl FrameBuffers {
    pub fn new(columns: usize, rows: usize, fill: u8) -> Self {
        let len = columns * rows;
        let buffer = || (0..len).map(|_| AtomicU8::new(fill)).collect::<Vec<_>>();
        Self {
            columns,
            rows,
            cells: [buffer(), buffer()],
            front: AtomicUsize::new(0),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write(&self, index: usize, shade: u8) {
        let back = 1 - self.front.load(Ordering::Acquire);
        self.cells[back][index].store(shade, Ordering::Relaxed);
    }

    pub fn swap(&self) {
        self.front.fetch_xor(1, Ordering::AcqRel);
    }

    /// Copy of the published buffer.
    pub fn snapshot(&self) -> Vec<u8> {
        let front = self.front.load(Ordering::Acquire);
        self.cells[front]
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_is_filled() {
        let buffers = FrameBuffers::new(4, 3, UNRENDERED);
        assert_eq!(buffers.len(), 12);
        assert_eq!(buffers.snapshot(), vec![UNRENDERED; 12]);
    }

    #[test]
    fn test_writes_hidden_until_swap() {
        let buffers = FrameBuffers::new(2, 2, b'?');
        for i in 0..4 {
            buffers.write(i, b'#');
        }
        assert_eq!(buffers.snapshot(), b"????".to_vec());
        buffers.swap();
        assert_eq!(buffers.snapshot(), b"####".to_vec());

        // back to the old buffer for the next frame
        buffers.write(0, b'.');
        assert_eq!(buffers.snapshot(), b"####".to_vec());
        buffers.swap();
        assert_eq!(buffers.snapshot(), b".???".to_vec());
    }
}
