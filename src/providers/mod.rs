pub mod open_exchange;
pub mod xe;

pub use open_exchange::OpenExchangeProvider;
pub use xe::XeProvider;

const USER_AGENT: &str = concat!("fxgate/", env!("CARGO_PKG_VERSION"));
