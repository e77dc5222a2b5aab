//! 레지스트리와 시세 캐시를 위한 도메인 모델.

mod exchange;
mod instrument;
mod price;
mod sync_state;

pub use exchange::*;
pub use instrument::*;
pub use price::*;
pub use sync_state::*;
