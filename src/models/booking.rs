use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Offerings a customer can pick from on the booking form.
pub const SERVICES: &[&str] = &[
    "Catering",
    "Decoration",
    "Photography",
    "Stage Setup",
    "Sound & Lighting",
    "Wedding Planning",
];

pub const EXTRAS_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub phone: String,
    pub customer_email: Option<String>,
    pub event_date: NaiveDate,
    pub service: String,
    pub extras: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub whatsapp_sent: bool,
    pub email_sent: bool,
    pub reminder_sent: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Rejected => "Rejected",
        }
    }

    /// Case-insensitive lookup for query strings; `None` for unknown labels.
    pub fn from_label(s: &str) -> Option<Self> {
        [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Rejected]
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Confirmed" => BookingStatus::Confirmed,
            "Rejected" => BookingStatus::Rejected,
            _ => BookingStatus::Pending,
        }
    }

    /// Confirmed and Rejected are terminal; only Pending can move.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Rejected)
        )
    }
}

/// Best-effort delivery flags; each only ever moves from false to true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFlag {
    WhatsApp,
    Email,
    Reminder,
}

impl DeliveryFlag {
    pub fn column(&self) -> &'static str {
        match self {
            DeliveryFlag::WhatsApp => "whatsapp_sent",
            DeliveryFlag::Email => "email_sent",
            DeliveryFlag::Reminder => "reminder_sent",
        }
    }
}

/// Lifecycle events that fan out to the notification channels.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingEvent {
    Created,
    Confirmed,
    Rejected,
}

impl BookingEvent {
    pub fn label(&self) -> &'static str {
        match self {
            BookingEvent::Created => "Received",
            BookingEvent::Confirmed => "Confirmed",
            BookingEvent::Rejected => "Rejected",
        }
    }

    pub fn for_status(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => BookingEvent::Created,
            BookingStatus::Confirmed => BookingEvent::Confirmed,
            BookingStatus::Rejected => BookingEvent::Rejected,
        }
    }
}

/// A validated submission, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub name: String,
    pub location: String,
    pub phone: String,
    pub customer_email: Option<String>,
    pub event_date: NaiveDate,
    pub service: String,
    pub extras: Vec<String>,
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn extras_joined(&self) -> String {
        self.extras.join(EXTRAS_SEPARATOR)
    }
}

/// Raw booking form as submitted. Every field is optional here so a missing
/// field surfaces as a [`ValidationError`] naming it.
#[derive(Debug, Default, Deserialize)]
pub struct BookingForm {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub customer_email: Option<String>,
    pub event_date: Option<String>,
    pub service: Option<String>,
    #[serde(default)]
    pub extras: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    Missing(&'static str),

    #[error("invalid event date: {0}")]
    InvalidDate(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing(field) => *field,
            ValidationError::InvalidDate(_) => "event_date",
            ValidationError::UnknownService(_) => "service",
            ValidationError::InvalidEmail(_) => "customer_email",
            ValidationError::UnknownStatus(_) => "status",
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::Missing(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl BookingForm {
    pub fn validate(self) -> Result<NewBooking, ValidationError> {
        let name = required(self.name, "name")?;
        let location = required(self.location, "location")?;
        let phone = required(self.phone, "phone")?;

        let raw_date = required(self.event_date, "event_date")?;
        let event_date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(raw_date.clone()))?;

        let service = required(self.service, "service")?;
        if !SERVICES.contains(&service.as_str()) {
            return Err(ValidationError::UnknownService(service));
        }

        let customer_email = optional(self.customer_email);
        if let Some(email) = &customer_email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidEmail(email.clone()));
            }
        }

        let extras = self
            .extras
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(NewBooking {
            name,
            location,
            phone,
            customer_email,
            event_date,
            service,
            extras,
            notes: optional(self.notes),
        })
    }
}
