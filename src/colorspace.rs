use tables::{LAB_EPSILON, XYZ_TBL};

pub(crate) mod tables {
    use static_init::dynamic;
    pub const LAB_EPSILON: f32 = 0.008856;
    /// sRGB (D65) to XYZ matrix, rows are X, Y and Z.
    pub const C_XYZ: [[f32; 3]; 3] = [
        [0.412453, 0.357580, 0.180423],
        [0.212671, 0.715160, 0.072169],
        [0.019334, 0.119193, 0.950227],
    ];
    /// D65 reference white.
    pub const WHITE: [f32; 3] = [0.950456, 1.0, 1.088754];
    /// Contribution of an 8-bit value of channel `c` to the white-normalized X, Y and Z.
    #[dynamic(65535)]
    pub static XYZ_TBL: [[[f32; 3]; 256]; 3] = core::array::from_fn(|c| {
        core::array::from_fn(|v| {
            core::array::from_fn(|row| C_XYZ[row][c] * v as f32 / (255.0 * WHITE[row]))
        })
    });
}

#[inline(always)]
fn lab_nonlin(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Convert RGB24 pixel to CIE Lab.
///
/// The output range is for:
///  - L - from 0 to 100
///  - a - roughly from -86 to 98
///  - b - roughly from -108 to 95
#[inline(always)]
pub fn rgb_to_lab(rgb: [u8; 3]) -> [f32; 3] {
    let mut xyz = [0f32; 3];
    for (c, v) in rgb.into_iter().enumerate() {
        let contribution: [f32; 3] = unsafe { XYZ_TBL[c][v as usize] };
        xyz[0] += contribution[0];
        xyz[1] += contribution[1];
        xyz[2] += contribution[2];
    }
    let [x, y, z] = xyz;
    let fx = lab_nonlin(x);
    let fy = lab_nonlin(y);
    let fz = lab_nonlin(z);
    let l = if y > LAB_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        903.3 * y
    };
    [l, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Convert RGB24 pixel to hue, saturation and value, each in `[0, 1]`.
///
/// Channels are divided by 256 so value and hue stay below 1.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [f32; 3] {
    let [r, g, b] = rgb.map(|c| c as f32 / 256.0);
    let min_rgb = r.min(g).min(b);
    let max_rgb = r.max(g).max(b);
    let delta = max_rgb - min_rgb;
    let mut h = 0.0;
    let mut s = 0.0;
    if delta > 0.0 && max_rgb > 0.0 {
        s = delta / max_rgb;
        h = if max_rgb == r {
            (g - b) / delta
        } else if max_rgb == g {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
    }
    h /= 6.0;
    if h < 0.0 {
        h += 1.0;
    }
    [h, s, max_rgb]
}

#[cfg(test)]
mod tests {
    use super::tables::XYZ_TBL;
    use super::{rgb_to_hsv, rgb_to_lab};

    #[test]
    fn xyz_table_test() {
        for channel in unsafe { XYZ_TBL.iter() } {
            assert_eq!(channel[0], [0.0, 0.0, 0.0]);
            for row in channel.iter() {
                assert!(row.iter().all(|v| *v >= 0.0));
            }
        }
    }

    #[test]
    fn rgb_to_lab_test() {
        let [l, a, b] = rgb_to_lab([255, 255, 255]);
        assert!((l - 100.0).abs() < 0.1, "L = {l}");
        assert!(a.abs() < 0.1, "a = {a}");
        assert!(b.abs() < 0.1, "b = {b}");
        assert_eq!(rgb_to_lab([0, 0, 0]), [0.0, 0.0, 0.0]);
        let [_, a_red, _] = rgb_to_lab([255, 0, 0]);
        assert!(a_red > 50.0);
        let [_, _, b_blue] = rgb_to_lab([0, 0, 255]);
        assert!(b_blue < -50.0);
    }

    #[test]
    fn rgb_to_lab_range_test() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(15) {
                for b in (0..=255u8).step_by(15) {
                    let [l, a, bb] = rgb_to_lab([r, g, b]);
                    assert!((0.0..=100.1).contains(&l));
                    assert!((-128.0..128.0).contains(&a));
                    assert!((-128.0..128.0).contains(&bb));
                }
            }
        }
    }

    #[test]
    fn rgb_to_hsv_test() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0.0, 0.0, 0.0]);
        let [h, s, v] = rgb_to_hsv([255, 0, 0]);
        assert_eq!(h, 0.0);
        assert_eq!(s, 1.0);
        assert!(v < 1.0);
        let [h, _, _] = rgb_to_hsv([0, 0, 255]);
        assert!((h - 4.0 / 6.0).abs() < 1e-6);
        let [h, _, _] = rgb_to_hsv([255, 0, 128]);
        assert!((0.0..1.0).contains(&h));
    }
}
