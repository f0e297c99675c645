use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

/// Renders `data` (typically a `wa.me` link) as an SVG QR code that a
/// phone camera can open directly.
pub fn svg_code(data: &str) -> anyhow::Result<String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)
        .map_err(|e| anyhow::anyhow!("failed to encode QR code: {e}"))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(240, 240)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
