use super::*;

const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10">
  <rect width="20" height="10" fill="#0d0d15"/>
  <rect x="10" width="10" height="10" fill="#14b8a6"/>
</svg>"##;

fn pixel(f: &RasterFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * f.width + x) * 4) as usize;
    [f.data[i], f.data[i + 1], f.data[i + 2], f.data[i + 3]]
}

#[test]
fn rasterizes_at_scale() {
    let f = rasterize_svg(SQUARE, 2.0).unwrap();
    assert_eq!((f.width, f.height), (40, 20));
    assert_eq!(f.data.len(), 40 * 20 * 4);
    assert_eq!(pixel(&f, 5, 5), [0x0d, 0x0d, 0x15, 255]);
    assert_eq!(pixel(&f, 35, 15), [0x14, 0xb8, 0xa6, 255]);
}

#[test]
fn rejects_bad_input() {
    assert!(rasterize_svg(SQUARE, 0.0).is_err());
    assert!(rasterize_svg("not svg", 1.0).is_err());
}

#[test]
fn writes_png() {
    let dir = std::env::temp_dir().join(format!("journeyflow-raster-{}", std::process::id()));
    let path = dir.join("frame.png");
    rasterize_svg(SQUARE, 1.0).unwrap().save_png(&path).unwrap();
    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (20, 10));
    let _ = std::fs::remove_dir_all(&dir);
}
