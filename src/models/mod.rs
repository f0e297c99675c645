pub mod booking;

pub use booking::{
    Booking, BookingEvent, BookingForm, BookingStatus, DeliveryFlag, NewBooking, ValidationError,
    SERVICES,
};
