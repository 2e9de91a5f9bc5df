//! Shared helpers for SnapList integration tests.

use base64::Engine;
use snaplist_core::RecognitionPayload;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install the test log subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Encode a solid-color 32x32 PNG as a data-URI.
pub fn solid_png_data_uri(r: u8, g: u8, b: u8) -> String {
    let img = image::RgbImage::from_pixel(32, 32, image::Rgb([r, g, b]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut buf),
            image::ImageOutputFormat::Png,
        )
        .expect("png encode");
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf)
    )
}

/// Encode a 32x32 PNG split into a `left`-gray and `right`-gray half.
///
/// Two splits with swapped halves embed into near-orthogonal fallback
/// vectors, unlike solid colors, which are all parallel.
pub fn split_png_data_uri(left: u8, right: u8) -> String {
    let img = image::RgbImage::from_fn(32, 32, |x, _| {
        let v = if x < 16 { left } else { right };
        image::Rgb([v, v, v])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut buf),
            image::ImageOutputFormat::Png,
        )
        .expect("png encode");
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(buf)
    )
}

/// A recognition payload for `name` with the given image.
pub fn recognition_payload(name: &str, image_data: String) -> RecognitionPayload {
    RecognitionPayload {
        item_id: None,
        item_name: name.to_string(),
        category: "Electronics".to_string(),
        condition: "used".to_string(),
        suggested_price: "$25".to_string(),
        description: format!("{name} from an integration test"),
        confidence: 0.85,
        image_data,
    }
}
