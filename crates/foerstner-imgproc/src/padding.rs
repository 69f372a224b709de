use serde::{Deserialize, Serialize};

/// A border type used to read pixels that fall outside the image while filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    /// This border type takes the outermost row or column of pixels and repeats it into the padded region.
    ///
    /// Example: ...d c b a | a a a a...
    Replicate,

    /// This border type reflects the pixel values at the boundary, starting with the pixel 'next' to the edge.
    ///
    /// Example: ...d c b a | b c d e...
    #[default]
    Reflect101,

    /// This border type reflects the pixel values at the boundary, starting with the edge pixel itself.
    ///
    /// Example: ...d c b a | a b c d...
    Reflect,
}

impl PaddingMode {
    #[inline]
    fn reflect(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i - 1;
            } else if i >= len {
                i = 2 * len - i - 1;
            }
        }
        i as usize
    }

    #[inline]
    fn reflect101(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i;
            } else if i >= len {
                i = 2 * len - i - 2;
            }
        }
        i as usize
    }

    /// Maps index `i` to a valid index i.e. within `[0, len)` according to the padding mode.
    ///
    /// - `Replicate`: clamp to edge
    /// - `Reflect`: mirror including edge
    /// - `Reflect101`: mirror excluding edge
    ///
    /// PRECONDITION: `len > 0`.
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> usize {
        match self {
            PaddingMode::Replicate => i.clamp(0, len as isize - 1) as usize,
            PaddingMode::Reflect => Self::reflect(i, len),
            PaddingMode::Reflect101 => Self::reflect101(i, len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PaddingMode;

    #[test]
    fn test_map_index_inside() {
        for mode in [
            PaddingMode::Replicate,
            PaddingMode::Reflect,
            PaddingMode::Reflect101,
        ] {
            for i in 0..5 {
                assert_eq!(mode.map_index(i, 5), i as usize);
            }
        }
    }

    #[test]
    fn test_map_index_outside() {
        // a b c d e over indices -2..7
        let replicate: Vec<_> = (-2..7)
            .map(|i| PaddingMode::Replicate.map_index(i, 5))
            .collect();
        assert_eq!(replicate, vec![0, 0, 0, 1, 2, 3, 4, 4, 4]);

        let reflect: Vec<_> = (-2..7)
            .map(|i| PaddingMode::Reflect.map_index(i, 5))
            .collect();
        assert_eq!(reflect, vec![1, 0, 0, 1, 2, 3, 4, 4, 3]);

        let reflect101: Vec<_> = (-2..7)
            .map(|i| PaddingMode::Reflect101.map_index(i, 5))
            .collect();
        assert_eq!(reflect101, vec![2, 1, 0, 1, 2, 3, 4, 3, 2]);
    }

    #[test]
    fn test_map_index_single_pixel() {
        assert_eq!(PaddingMode::Reflect101.map_index(-3, 1), 0);
        assert_eq!(PaddingMode::Reflect.map_index(4, 1), 0);
        assert_eq!(PaddingMode::Replicate.map_index(4, 1), 0);
    }
}
