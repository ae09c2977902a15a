//! Recurring maintenance contracts and the date negotiation between clients and staff.

pub mod clock;
pub mod contracts;
pub mod identity;
pub mod requests;
pub mod store;
pub mod urgency;

pub use clock::{Clock, SystemClock};
pub use identity::{Caller, CallerRole, ClientId, HeaderIdentity, IdentityProvider, UserId};
pub use store::RepositoryError;
pub use urgency::{classify, reminder_mark, Urgency, UrgencyTier};
