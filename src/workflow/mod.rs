pub mod form_driver;
pub mod sample_ctx;
pub mod toggle_state;
pub mod transient;

pub use form_driver::{DriverState, FormDriver, FormSettings};
pub use sample_ctx::SampleCtx;
pub use toggle_state::ToggleState;
pub use transient::{await_transient, TransientOutcome};
