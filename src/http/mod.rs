pub mod mime;
pub mod request;
pub mod response;

pub use mime::content_type_for;
pub use request::{Method, Request, RequestError, Version};
pub use response::{Response, Status};

/// end of the header block; nothing past it is read
pub const TERMINATOR: &[u8] = b"\r\n\r\n";

/// position just past the first terminator in `buf`, if one is present
pub fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map(|pos| pos + TERMINATOR.len())
}
