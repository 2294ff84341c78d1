pub mod booking;
pub mod payment_intent;

pub use booking::{Booking, BookingStatus, PaymentMethod};
pub use payment_intent::{IntentStatus, PaymentIntentRecord};
