pub mod participation;

pub use participation::{NewParticipation, ParticipationList, ParticipationRecord};
