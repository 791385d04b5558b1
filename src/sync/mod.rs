pub mod poller;

pub use poller::PollHandle;
