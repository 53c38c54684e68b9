//! Orientation tags and the pixel transforms that make an image upright.

use image::{imageops, ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};

/// How stored pixels must be rotated or mirrored to appear upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    DownMirrored,
    LeftMirrored,
    RightMirrored,
}

/// Rotation (clockwise quarter turns) followed by an optional horizontal mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationTransform {
    pub quarter_turns: u8,
    pub mirrored: bool,
}

const fn transform(quarter_turns: u8, mirrored: bool) -> OrientationTransform {
    OrientationTransform {
        quarter_turns,
        mirrored,
    }
}

/// Lookup table indexed by [`Orientation::index`].
const TRANSFORMS: [OrientationTransform; 8] = [
    transform(0, false), // Up
    transform(2, false), // Down
    transform(3, false), // Left
    transform(1, false), // Right
    transform(0, true),  // UpMirrored
    transform(2, true),  // DownMirrored
    transform(1, true),  // LeftMirrored
    transform(3, true),  // RightMirrored
];

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Up,
        Orientation::Down,
        Orientation::Left,
        Orientation::Right,
        Orientation::UpMirrored,
        Orientation::DownMirrored,
        Orientation::LeftMirrored,
        Orientation::RightMirrored,
    ];

    fn index(self) -> usize {
        match self {
            Orientation::Up => 0,
            Orientation::Down => 1,
            Orientation::Left => 2,
            Orientation::Right => 3,
            Orientation::UpMirrored => 4,
            Orientation::DownMirrored => 5,
            Orientation::LeftMirrored => 6,
            Orientation::RightMirrored => 7,
        }
    }

    /// Maps an EXIF `Orientation` tag value (1..=8). Anything else is treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::UpMirrored,
            3 => Orientation::Down,
            4 => Orientation::DownMirrored,
            5 => Orientation::LeftMirrored,
            6 => Orientation::Right,
            7 => Orientation::RightMirrored,
            8 => Orientation::Left,
            _ => Orientation::Up,
        }
    }

    pub fn to_exif(self) -> u32 {
        match self {
            Orientation::Up => 1,
            Orientation::UpMirrored => 2,
            Orientation::Down => 3,
            Orientation::DownMirrored => 4,
            Orientation::LeftMirrored => 5,
            Orientation::Right => 6,
            Orientation::RightMirrored => 7,
            Orientation::Left => 8,
        }
    }

    pub fn transform(self) -> OrientationTransform {
        TRANSFORMS[self.index()]
    }

    /// True when making the image upright transposes its axes.
    pub fn swaps_axes(self) -> bool {
        self.transform().quarter_turns % 2 == 1
    }

    /// Dimensions of the upright image for stored dimensions `(width, height)`.
    pub fn upright_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Returns an upright copy of `image`.
    pub fn apply<P>(self, image: &ImageBuffer<P, Vec<P::Subpixel>>) -> ImageBuffer<P, Vec<P::Subpixel>>
    where
        P: Pixel + 'static,
    {
        let OrientationTransform {
            quarter_turns,
            mirrored,
        } = self.transform();

        let rotated = match quarter_turns {
            1 => imageops::rotate90(image),
            2 => imageops::rotate180(image),
            3 => imageops::rotate270(image),
            _ => image.clone(),
        };

        if mirrored {
            imageops::flip_horizontal(&rotated)
        } else {
            rotated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, GrayImage};

    #[test]
    fn exif_values_round_trip_through_every_orientation() {
        for orientation in Orientation::ALL {
            assert_eq!(Orientation::from_exif(orientation.to_exif()), orientation);
        }
        assert_eq!(Orientation::from_exif(0), Orientation::Up);
        assert_eq!(Orientation::from_exif(42), Orientation::Up);
    }

    #[test]
    fn rotated_orientations_swap_axes() {
        let swapped: Vec<_> = Orientation::ALL
            .into_iter()
            .filter(|o| o.swaps_axes())
            .collect();
        assert_eq!(
            swapped,
            vec![
                Orientation::Left,
                Orientation::Right,
                Orientation::LeftMirrored,
                Orientation::RightMirrored
            ]
        );
        assert_eq!(Orientation::Right.upright_dimensions(4, 2), (2, 4));
        assert_eq!(Orientation::DownMirrored.upright_dimensions(4, 2), (4, 2));
    }

    /// 2x1 image with a marked pixel at stored (0, 0).
    fn marked() -> GrayImage {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([255]));
        img
    }

    fn marked_position(img: &GrayImage) -> (u32, u32) {
        img.enumerate_pixels()
            .find(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .unwrap()
    }

    #[test]
    fn apply_moves_the_stored_origin_where_exif_expects_it() {
        let img = marked();
        let cases = [
            (Orientation::Up, (2, 1), (0, 0)),
            (Orientation::UpMirrored, (2, 1), (1, 0)),
            (Orientation::Down, (2, 1), (1, 0)),
            (Orientation::DownMirrored, (2, 1), (0, 0)),
            (Orientation::Right, (1, 2), (0, 0)),
            (Orientation::Left, (1, 2), (0, 1)),
            (Orientation::LeftMirrored, (1, 2), (0, 0)),
            (Orientation::RightMirrored, (1, 2), (0, 1)),
        ];
        for (orientation, dims, origin) in cases {
            let out = orientation.apply(&img);
            assert_eq!(out.dimensions(), dims, "{orientation:?}");
            assert_eq!(marked_position(&out), origin, "{orientation:?}");
        }
    }
}
