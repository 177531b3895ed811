use crate::foundation::{
    error::{PressPlayError, PressPlayResult},
    math::{mul_div255_u8, unit_to_u8_weight},
};

/// Blend two premultiplied frames: `dst = a * (1 - t) + b * t`.
pub fn crossfade_rgba8_premul(dst: &mut [u8], a: &[u8], b: &[u8], t: f32) -> PressPlayResult<()> {
    if dst.len() != a.len() || dst.len() != b.len() || !dst.len().is_multiple_of(4) {
        return Err(PressPlayError::render(
            "crossfade_rgba8_premul expects equal-length rgba8 buffers",
        ));
    }
    let tt = unit_to_u8_weight(t);
    let it = 255u16 - tt;
    for ((d, ap), bp) in dst.iter_mut().zip(a.iter()).zip(b.iter()) {
        let av = mul_div255_u8(u16::from(*ap), it);
        let bv = mul_div255_u8(u16::from(*bp), tt);
        *d = add_sat_u8(av, bv);
    }
    Ok(())
}

/// In-place variant: `a` becomes the blend of itself toward `b`.
pub fn crossfade_in_place(a: &mut [u8], b: &[u8], t: f32) -> PressPlayResult<()> {
    if a.len() != b.len() || !a.len().is_multiple_of(4) {
        return Err(PressPlayError::render(
            "crossfade_in_place expects equal-length rgba8 buffers",
        ));
    }
    let tt = unit_to_u8_weight(t);
    let it = 255u16 - tt;
    for (ap, bp) in a.iter_mut().zip(b.iter()) {
        let av = mul_div255_u8(u16::from(*ap), it);
        let bv = mul_div255_u8(u16::from(*bp), tt);
        *ap = add_sat_u8(av, bv);
    }
    Ok(())
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/composite.rs"]
mod tests;
