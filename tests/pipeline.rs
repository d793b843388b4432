//! End-to-end pipeline tests over encoded image bytes and full sessions.

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

use pixel_art_studio_wasm::{
    pixelate_bytes, BlockMode, Params, PickOutcome, Rgb, Rotation, Session,
};

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn two_tone_image() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(16, 12, Rgba([230, 230, 230, 255]));
    for y in 0..12 {
        for x in 0..8 {
            img.put_pixel(x, y, Rgba([20, 40, 60, 255]));
        }
    }
    img
}

#[test]
fn bytes_round_trip_produces_a_block_quantized_png() {
    let png_in = encode_png(&two_tone_image());
    let mut params = Params::default();
    params.block_size = 4;
    params.palette_size = 4;

    let (png_out, palette, info) = pixelate_bytes(&png_in, 0, params, Some(7)).unwrap();

    let decoded = image::load_from_memory(&png_out).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (16, 12));

    // Two distinct halves, palette clamped to the two distinct colors.
    assert_eq!(palette.len(), 2);
    assert!(info.contains("Original: 16x12px"), "{info}");
    assert!(info.contains("Unique Colors: 2"), "{info}");

    // Every 4x4 block is uniform.
    for by in 0..3 {
        for bx in 0..4 {
            let first = decoded.get_pixel(bx * 4, by * 4);
            for y in by * 4..by * 4 + 4 {
                for x in bx * 4..bx * 4 + 4 {
                    assert_eq!(decoded.get_pixel(x, y), first, "block ({bx},{by})");
                }
            }
        }
    }
}

#[test]
fn seeded_conversions_are_byte_identical() {
    let png_in = encode_png(&two_tone_image());
    let params = Params::default();
    let a = pixelate_bytes(&png_in, 0, params, Some(123)).unwrap();
    let b = pixelate_bytes(&png_in, 0, params, Some(123)).unwrap();
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
}

#[test]
fn rotation_is_applied_before_processing() {
    let png_in = encode_png(&two_tone_image());
    let (_, _, info) = pixelate_bytes(&png_in, 90, Params::default(), Some(1)).unwrap();
    assert!(info.contains("Rotated: 12x16px"), "{info}");
    assert!(pixelate_bytes(&png_in, 45, Params::default(), Some(1)).is_err());
}

#[test]
fn dominant_mode_on_checkerboard_resolves_ties_to_top_left() {
    let mut img = RgbaImage::new(4, 4);
    for y in 0..4 {
        for x in 0..4 {
            let c = if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            };
            img.put_pixel(x, y, c);
        }
    }
    let mut params = Params::default();
    params.block_size = 2;
    params.palette_size = 4;
    params.block_mode = BlockMode::Dominant;
    let mut rng = StdRng::seed_from_u64(2);
    let session = Session::new(img.clone(), Rotation::Deg0, params, &mut rng).unwrap();

    // Each 2x2 block ties 2-2; the block's top-left pixel color wins.
    for (bx, by) in [(0u32, 0u32), (1, 0), (0, 1), (1, 1)] {
        let expected = img.get_pixel(bx * 2, by * 2).0;
        let got = session.working().get(bx * 2, by * 2).unwrap();
        assert_eq!([got.r, got.g, got.b, 255], expected);
    }
}

#[test]
fn interactive_recolor_then_smart_combine() {
    let mut params = Params::default();
    params.block_size = 4;
    params.palette_size = 4;
    let mut rng = StdRng::seed_from_u64(6);
    let mut session =
        Session::new(two_tone_image(), Rotation::Deg0, params, &mut rng).unwrap();

    let dark = *session
        .palette()
        .colors()
        .iter()
        .min_by(|a, b| a.luminance().total_cmp(&b.luminance()))
        .unwrap();
    let light = *session
        .palette()
        .colors()
        .iter()
        .max_by(|a, b| a.luminance().total_cmp(&b.luminance()))
        .unwrap();

    // Replace the dark half with the light color.
    assert!(session.select_replacement_color(light));
    let outcome = session.pick_target_pixel(0, 0).unwrap();
    assert_eq!(outcome, PickOutcome::Substituted);
    assert!(session.working().pixels().all(|px| px == light));
    assert!(session.editor().is_replaced(dark));

    // A former-dark pixel now reads the light color: target == source.
    assert!(session.select_replacement_color(light));
    assert_eq!(session.pick_target_pixel(0, 0).unwrap(), PickOutcome::Ignored);

    // Smart combine never grows the palette and keeps the buffer colors
    // inside the combined palette.
    let before = session.palette().len();
    session.smart_combine();
    assert!(session.palette().len() <= before);
    let palette = session.palette().clone();
    assert!(session.working().pixels().all(|px| palette.contains(px)));
}

#[test]
fn highlight_view_leaves_working_buffer_alone() {
    let mut params = Params::default();
    params.block_size = 4;
    params.palette_size = 4;
    let mut rng = StdRng::seed_from_u64(8);
    let mut session =
        Session::new(two_tone_image(), Rotation::Deg0, params, &mut rng).unwrap();

    let target = session.palette().colors()[0];
    session.select_replacement_color(target);
    let before = session.working().clone();
    let overlay = session.highlight_view().unwrap().unwrap();
    assert_eq!(&before, session.working());
    assert_ne!(overlay, before);

    // Toggling off removes the view.
    session.toggle_highlight();
    assert!(session.highlight_view().unwrap().is_none());
}

#[test]
fn uniform_image_survives_every_stage_unchanged() {
    let img = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
    let mut params = Params::default();
    params.block_size = 2;
    params.palette_size = 4;
    params.edge_detection = true;
    params.edge_threshold = 0;
    let mut rng = StdRng::seed_from_u64(4);
    let session = Session::new(img, Rotation::Deg0, params, &mut rng).unwrap();
    assert!(session
        .working()
        .pixels()
        .all(|px| px == Rgb::new(255, 0, 0)));
}
