use crate::models::Booking;

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;

/// Renders a one-page A4 PDF receipt for a booking using the standard
/// Helvetica fonts. Characters outside printable ASCII are replaced with `?`.
pub fn generate_pdf(booking: &Booking, business_name: &str) -> Vec<u8> {
    let dash = |v: Option<&str>| match v {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => "-".to_string(),
    };

    let lines = [
        format!("Id: {}", booking.id),
        format!("Name: {}", booking.name),
        format!("Phone: {}", booking.phone),
        format!("Customer Email: {}", dash(booking.customer_email.as_deref())),
        format!("Location: {}", booking.location),
        format!("Event Date: {}", booking.event_date.format("%Y-%m-%d")),
        format!("Service: {}", booking.service),
        format!("Extras: {}", dash(Some(booking.extras.as_str()))),
        format!("Notes: {}", dash(booking.notes.as_deref())),
        format!("Status: {}", booking.status.as_str()),
    ];

    let mut content = format!(
        "BT /F2 16 Tf 40 {} Td ({}) Tj ET\n",
        PAGE_HEIGHT - 42,
        pdf_text(business_name)
    );
    content.push_str(&format!("BT /F1 11 Tf 18 TL 40 {} Td\n", PAGE_HEIGHT - 82));
    for line in &lines {
        content.push_str(&format!("({}) Tj T*\n", pdf_text(line)));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>"
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));

    out.into_bytes()
}

fn pdf_text(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}
