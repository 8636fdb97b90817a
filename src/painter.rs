use crate::error::{Error, Result};

/// Lightest to densest. Points inside the set are drawn as [`INTERIOR`].
pub const DEFAULT_PALETTE: &str = " .,-~o:;*=><!?HX#$@";

pub const INTERIOR: u8 = b' ';

pub trait Shader: Send + Sync {
    fn iteration_shade(&self, iterations: u32) -> u8;

    fn shade(&self, iterations: u32, cap: u32) -> u8 {
        if iterations >= cap {
            INTERIOR
        } else {
            self.iteration_shade(iterations)
        }
    }
}

/// Cycles through a palette of printable ASCII characters.
#[derive(Clone, Debug)]
pub struct AsciiShader {
    palette: Vec<u8>,
}

impl AsciiShader {
    pub fn new(palette: &str) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::invalid_argument("palette is empty"));
        }
        if let Some(c) = palette.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
            return Err(Error::invalid_argument(format!(
                "palette character {:?} is not printable ASCII",
                c
            )));
        }
        Ok(Self {
            palette: palette.as_bytes().to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }
}

impl Default for AsciiShader {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.as_bytes().to_vec(),
        }
    }
}

impl Shader for AsciiShader {
    fn iteration_shade(&self, iterations: u32) -> u8 {
        self.palette[iterations as usize % self.palette.len()]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interior_is_blank() {
        let shader = AsciiShader::default();
        assert_eq!(shader.shade(50, 50), INTERIOR);
        assert_eq!(shader.shade(1, 1), INTERIOR);
    }

    #[test]
    fn test_palette_wraps() {
        let shader = AsciiShader::new("ab").unwrap();
        assert_eq!(shader.shade(0, 10), b'a');
        assert_eq!(shader.shade(1, 10), b'b');
        assert_eq!(shader.shade(2, 10), b'a');
        assert_eq!(shader.shade(9, 10), b'b');
    }

    #[test]
    fn test_default_palette() {
        let shader = AsciiShader::default();
        assert_eq!(shader.len(), 19);
        assert_eq!(shader.shade(1, 50), b'.');
        assert_eq!(shader.shade(18, 50), b'@');
        assert_eq!(shader.shade(19, 50), b' ');
    }

    #[test]
    fn test_rejects_bad_palettes() {
        assert!(AsciiShader::new("").is_err());
        assert!(AsciiShader::new("ab\n").is_err());
        assert!(AsciiShader::new(".░▒▓").is_err());
    }
}
