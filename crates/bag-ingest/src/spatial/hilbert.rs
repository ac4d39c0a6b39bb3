//! Hilbert curve keys

use geo_types::Rect;

use super::BoundingExtent;

/// Bits per axis; keys fit a `u32`
pub const HILBERT_ORDER: u32 = 16;

const SIDE: u32 = 1 << HILBERT_ORDER;

/// Hilbert key of the centre of `bounds`, normalised into `extent`
///
/// Positions outside the extent are clamped onto its border.
pub fn hilbert_key(extent: &BoundingExtent, bounds: &Rect<f64>) -> u32 {
    let centre = bounds.center();
    let (nx, ny) = extent.normalize(centre.x, centre.y);
    hilbert_index(to_cell(nx), to_cell(ny))
}

/// Distance along the curve of grid cell `(x, y)`
pub fn hilbert_index(mut x: u32, mut y: u32) -> u32 {
    let mut index: u64 = 0;
    let mut s = SIDE / 2;

    while s > 0 {
        let rx = u64::from(x & s != 0);
        let ry = u64::from(y & s != 0);
        index += u64::from(s) * u64::from(s) * ((3 * rx) ^ ry);
        rotate(SIDE, &mut x, &mut y, rx == 1, ry == 1);
        s /= 2;
    }

    // the curve covers SIDE * SIDE cells, so the index never exceeds u32::MAX
    index as u32
}

fn to_cell(unit: f64) -> u32 {
    ((unit * f64::from(SIDE)) as u32).min(SIDE - 1)
}

fn rotate(n: u32, x: &mut u32, y: &mut u32, rx: bool, ry: bool) {
    if !ry {
        if rx {
            *x = n - 1 - *x;
            *y = n - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;
    use proptest::prelude::*;

    fn cell_of(mut index: u32) -> (u32, u32) {
        let (mut x, mut y) = (0u32, 0u32);
        let mut s = 1u32;
        while s < SIDE {
            let rx = 1 & (index / 2);
            let ry = 1 & (index ^ rx);
            rotate(s, &mut x, &mut y, rx == 1, ry == 1);
            x += s * rx;
            y += s * ry;
            index /= 4;
            s *= 2;
        }
        (x, y)
    }

    fn rect(x: f64, y: f64) -> Rect<f64> {
        Rect::new(coord! { x: x, y: y }, coord! { x: x, y: y })
    }

    #[test]
    fn test_corners() {
        assert_eq!(hilbert_index(0, 0), 0);
        assert_eq!(hilbert_index(SIDE - 1, 0), u32::MAX);
        assert_eq!(cell_of(u32::MAX), (SIDE - 1, 0));
    }

    #[test]
    fn test_key_uses_centre_and_clamps() {
        let extent = BoundingExtent::default();
        let inside = Rect::new(coord! { x: 0.0, y: 280_000.0 }, coord! { x: 2.0, y: 280_002.0 });
        assert_eq!(hilbert_key(&extent, &inside), hilbert_key(&extent, &rect(1.0, 280_001.0)));

        let below = hilbert_key(&extent, &rect(-50_000.0, 0.0));
        assert_eq!(below, 0);
        let far = hilbert_key(&extent, &rect(1e12, 0.0));
        assert_eq!(far, hilbert_key(&extent, &rect(310_000.0, 280_000.0)));
    }

    proptest! {
        #[test]
        fn prop_index_inverts(index in any::<u32>()) {
            let (x, y) = cell_of(index);
            prop_assert_eq!(hilbert_index(x, y), index);
        }

        #[test]
        fn prop_consecutive_indices_are_neighbours(index in 0u32..u32::MAX) {
            let (x0, y0) = cell_of(index);
            let (x1, y1) = cell_of(index + 1);
            prop_assert_eq!(x0.abs_diff(x1) + y0.abs_diff(y1), 1);
        }

        #[test]
        fn prop_keys_stay_in_range(x in -1e7f64..1e7, y in -1e7f64..1e7) {
            let extent = BoundingExtent::default();
            let key = hilbert_key(&extent, &rect(x, y));
            let clamped = rect(x.clamp(extent.min_x, extent.max_x), y.clamp(extent.min_y, extent.max_y));
            prop_assert_eq!(key, hilbert_key(&extent, &clamped));
        }
    }
}
