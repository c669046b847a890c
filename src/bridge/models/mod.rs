//! models — concrete diffusion laws.
//!
//! Only linear laws live here; they double as exact auxiliary laws, which is
//! what the backward recursions are tested against.

pub mod ornstein_uhlenbeck;

pub use self::ornstein_uhlenbeck::{OU_N_PARAMS, OrnsteinUhlenbeck};
