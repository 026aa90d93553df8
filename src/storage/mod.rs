/// Storage layer for state kept between tool calls
///
/// The server forwards every tool call to the map API, so the only state it
/// keeps is the pagination cursor of each search session. Time is read
/// through the [`Clock`] trait so expiry can be tested deterministically.

pub mod clock;
pub mod paging;

// Re-export the main storage types
pub use clock::*;
pub use paging::*;
