use super::*;

fn checker(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            if (x + y) % 2 == 0 {
                out.extend_from_slice(&[255, 0, 0, 255]);
            } else {
                out.extend_from_slice(&[0, 0, 128, 128]);
            }
        }
    }
    out
}

#[test]
fn png_is_lossless_after_unpremultiply() {
    let data = checker(4, 3);
    let bytes = encode_premul_rgba8(&data, 4, 3, ExportFormat::Png).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(decoded.get_pixel(1, 0).0, [0, 0, 255, 128]);
}

#[test]
fn jpeg_decodes_to_same_dimensions() {
    let data = [200u8, 200, 200, 255].repeat(16 * 8);
    let bytes = encode_premul_rgba8(&data, 16, 8, ExportFormat::jpeg(80)).unwrap();
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 16);
    assert_eq!(decoded.height(), 8);
}

#[test]
fn jpeg_quality_is_clamped() {
    assert_eq!(ExportFormat::jpeg(0), ExportFormat::Jpeg { quality: 1 });
    assert_eq!(ExportFormat::jpeg(250), ExportFormat::Jpeg { quality: 100 });
    assert_eq!(ExportFormat::jpeg(0).mime_type(), "image/jpeg");
}

#[test]
fn length_mismatch_is_malformed() {
    let err = encode_premul_rgba8(&[0u8; 7], 1, 2, ExportFormat::Png).unwrap_err();
    assert!(matches!(err, EaselError::MalformedBuffer(_)));
}

#[test]
fn empty_image_is_rejected() {
    assert!(encode_premul_rgba8(&[], 0, 0, ExportFormat::Png).is_err());
}
