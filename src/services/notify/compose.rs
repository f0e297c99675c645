//! Message bodies for each channel, built from booking fields.

use crate::models::{Booking, BookingEvent};

fn headline(event: BookingEvent) -> &'static str {
    match event {
        BookingEvent::Created => "We have received your booking. We will confirm it shortly.",
        BookingEvent::Confirmed => "Your booking is confirmed. We look forward to your event!",
        BookingEvent::Rejected => {
            "Sorry, we are unable to take this booking. Please contact us for other dates."
        }
    }
}

pub fn whatsapp_text(booking: &Booking, event: BookingEvent, business_name: &str) -> String {
    format!(
        "*{business_name}*\n\n\
         Booking {label} (#{id})\n\n\
         Name: {name}\n\
         Phone: {phone}\n\
         Date: {date}\n\
         Service: {service}\n\
         Location: {location}\n\n\
         {headline}\n\
         Thank you",
        label = event.label(),
        id = booking.id,
        name = booking.name,
        phone = booking.phone,
        date = booking.event_date.format("%Y-%m-%d"),
        service = booking.service,
        location = booking.location,
        headline = headline(event),
    )
}

pub fn sms_text(booking: &Booking, event: BookingEvent, business_name: &str) -> String {
    format!(
        "{business_name}: booking #{} {} for {} on {}. {}",
        booking.id,
        event.label().to_lowercase(),
        booking.service,
        booking.event_date.format("%Y-%m-%d"),
        headline(event),
    )
}

pub fn reminder_text(booking: &Booking, business_name: &str) -> String {
    format!(
        "{business_name}\n\nEvent Reminder - Tomorrow\n\n\
         {service} at {location} on {date} (booking #{id}).",
        service = booking.service,
        location = booking.location,
        date = booking.event_date.format("%Y-%m-%d"),
        id = booking.id,
    )
}

pub fn email_subject(booking: &Booking, event: BookingEvent) -> String {
    format!("Booking {} – #{}", event.label(), booking.id)
}

pub fn email_html(booking: &Booking, event: BookingEvent, business_name: &str) -> String {
    format!(
        "<h2>{business}</h2>\
         <p>Dear <b>{name}</b>,</p>\
         <p>{headline}</p>\
         <ul>\
         <li>Event Date: {date}</li>\
         <li>Service: {service}</li>\
         <li>Location: {location}</li>\
         <li>Status: {status}</li>\
         </ul>\
         <p>Your receipt is attached.</p>\
         <p>Thank you</p>",
        business = escape_html(business_name),
        name = escape_html(&booking.name),
        headline = headline(event),
        date = booking.event_date.format("%Y-%m-%d"),
        service = escape_html(&booking.service),
        location = escape_html(&booking.location),
        status = booking.status.as_str(),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
