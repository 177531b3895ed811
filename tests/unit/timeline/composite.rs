use super::*;

#[test]
fn crossfade_endpoints_select_inputs() {
    let a = [200u8, 100, 50, 255];
    let b = [10u8, 20, 30, 255];
    let mut dst = [0u8; 4];

    crossfade_rgba8_premul(&mut dst, &a, &b, 0.0).unwrap();
    assert_eq!(dst, a);
    crossfade_rgba8_premul(&mut dst, &a, &b, 1.0).unwrap();
    assert_eq!(dst, b);
}

#[test]
fn crossfade_midpoint_is_average_of_opaque_frames() {
    let a = [255u8, 0, 0, 255];
    let b = [0u8, 0, 255, 255];
    let mut dst = [0u8; 4];
    crossfade_rgba8_premul(&mut dst, &a, &b, 0.5).unwrap();
    assert!(dst[0].abs_diff(127) <= 1);
    assert!(dst[2].abs_diff(128) <= 1);
    assert_eq!(dst[3], 255);
}

#[test]
fn crossfade_in_place_matches_out_of_place() {
    let a = vec![90u8, 30, 200, 255, 0, 0, 0, 255];
    let b = vec![10u8, 250, 40, 255, 255, 255, 255, 255];
    let mut out = vec![0u8; 8];
    crossfade_rgba8_premul(&mut out, &a, &b, 0.3).unwrap();
    let mut inplace = a.clone();
    crossfade_in_place(&mut inplace, &b, 0.3).unwrap();
    assert_eq!(out, inplace);
}

#[test]
fn crossfade_rejects_mismatched_buffers() {
    let mut dst = [0u8; 4];
    assert!(crossfade_rgba8_premul(&mut dst, &[0; 8], &[0; 4], 0.5).is_err());
    let mut a = [0u8; 3];
    assert!(crossfade_in_place(&mut a, &[0; 3], 0.5).is_err());
}
