//! Frame content production.
//!
//! The presentation loop does not care where pixels come from: anything that
//! can fill a 32-bit canvas behind a [`FramePainter`] can drive the window.
//! The built-in painter is the scrolling checkerboard; a GPU-backed painter
//! could replace it without touching the surface or buffer plumbing.
//!
//! # Usage
//!
//! ```no_run
//! use tessera::renderer::{Checkerboard, FramePainter};
//!
//! let painter = Checkerboard;
//! let mut canvas = vec![0u32; 640 * 480];
//! painter.paint(&mut canvas, 640, 480, 0.0);
//! ```

pub mod pacing;

/// Dark square color (packed XRGB).
pub const COLOR_A: u32 = 0xFF66_6666;

/// Light square color (packed XRGB).
pub const COLOR_B: u32 = 0xFFEE_EEEE;

/// A renderer that fills a packed 32-bit XRGB canvas for one frame.
pub trait FramePainter {
    fn paint(&self, canvas: &mut [u32], width: u32, height: u32, phase: f64);
}

/// The reference pattern: an 8-pixel checkerboard scrolled by the animation
/// phase. The pattern repeats every 8 phase units.
pub struct Checkerboard;

fn shade(x: u32, y: u32, offset: u32) -> u32 {
    if ((x + offset) + (y + offset) / 8 * 8) % 16 < 8 {
        COLOR_A
    } else {
        COLOR_B
    }
}

impl FramePainter for Checkerboard {
    fn paint(&self, canvas: &mut [u32], width: u32, height: u32, phase: f64) {
        let offset = (phase.floor() as u64 % 8) as u32;
        for (y, row) in canvas
            .chunks_exact_mut(width as usize)
            .take(height as usize)
            .enumerate()
        {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = shade(x as u32, y as u32, offset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn painted(width: u32, height: u32, phase: f64) -> Vec<u32> {
        let mut canvas = vec![0u32; (width * height) as usize];
        Checkerboard.paint(&mut canvas, width, height, phase);
        canvas
    }

    #[test]
    fn test_phase_zero_tile_boundaries() {
        let canvas = painted(16, 16, 0.0);
        assert_eq!(canvas[0], COLOR_A, "(0,0)");
        assert_eq!(canvas[8], COLOR_B, "(8,0)");
        assert_eq!(canvas[8 * 16], COLOR_B, "(0,8)");
        assert_eq!(canvas[8 * 16 + 8], COLOR_A, "(8,8)");
    }

    #[test]
    fn test_offset_scrolls_the_pattern() {
        let still = painted(16, 1, 0.0);
        let moved = painted(16, 1, 1.0);
        assert_eq!(still[7], COLOR_A);
        assert_eq!(moved[7], COLOR_B, "offset 1 shifts the boundary to x=7");
    }

    #[test]
    fn test_fractional_phase_floors_to_offset() {
        assert_eq!(painted(16, 4, 1.0), painted(16, 4, 1.9));
    }

    #[test]
    fn test_full_period_reproduces_phase_zero() {
        assert_eq!(painted(640, 480, 0.0), painted(640, 480, 8.0));
    }

    proptest! {
        #[test]
        fn test_pattern_wraps_every_eight_units(phase in 0.0f64..1.0e6) {
            prop_assert_eq!(painted(32, 8, phase), painted(32, 8, phase + 8.0));
        }
    }
}
