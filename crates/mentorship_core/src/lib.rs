pub mod booking;
pub mod clock;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod ports;
pub mod registry;
pub mod token;

pub use booking::BookingEngine;
pub use clock::{FixedClock, SystemClock};
pub use domain::{
    BookableSession, Booking, BookingRequest, BookingStatus, Credentials, Identity, MentorCard,
    OwnedSession, Principal, Profile, Role, Session, SessionBooking, SessionDraft, StudentBooking,
};
pub use error::{CoreError, CoreResult};
pub use gateway::AccessGateway;
pub use memory::InMemoryDatabase;
pub use ports::{Clock, DatabaseService, PortError, PortResult};
pub use registry::SessionRegistry;
pub use token::{TokenError, TokenService, DEFAULT_TOKEN_TTL_DAYS};
