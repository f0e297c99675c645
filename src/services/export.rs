use crate::models::Booking;

pub const CSV_HEADER: &[&str] = &[
    "id",
    "name",
    "location",
    "phone",
    "customer_email",
    "event_date",
    "service",
    "extras",
    "notes",
    "status",
    "whatsapp_sent",
    "email_sent",
    "reminder_sent",
    "created_at",
];

/// CSV with a header row and one line per booking, in the order given.
pub fn bookings_csv(bookings: &[Booking]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");

    for b in bookings {
        let flag = |v: bool| if v { "1" } else { "0" };
        let fields = [
            b.id.to_string(),
            b.name.clone(),
            b.location.clone(),
            b.phone.clone(),
            b.customer_email.clone().unwrap_or_default(),
            b.event_date.format("%Y-%m-%d").to_string(),
            b.service.clone(),
            b.extras.clone(),
            b.notes.clone().unwrap_or_default(),
            b.status.as_str().to_string(),
            flag(b.whatsapp_sent).to_string(),
            flag(b.email_sent).to_string(),
            flag(b.reminder_sent).to_string(),
            b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ];

        let line: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
