pub mod codec;
pub mod event;

pub use codec::{HttpCodec, OurState, WireError};
pub use event::{Event, Next, RequestHead, ResponseEvent, ResponseHead};
