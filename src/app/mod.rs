pub mod forward_use_case;
pub mod ports;
pub mod publish_use_case;

pub use forward_use_case::ForwardUseCase;
pub use publish_use_case::PublishUseCase;
