//! Smart sessions validator.

use alloy_primitives::{address, Address};
use alloy_sol_types::SolValue;

use super::Module;
use crate::error::Error;
use crate::session::{permission, Session};

pub const SMART_SESSIONS_ADDRESS: Address = address!("00000000002b0ecfbd0496ee71e01257da0e37de");

/// Installs smart sessions with no pre-enabled session.
pub fn module() -> Module {
    Module::validator(SMART_SESSIONS_ADDRESS, Vec::new())
}

/// Installs smart sessions and enables `sessions` in the same call:
/// `initData = abi.encode(Session[])`.
pub fn with_sessions(sessions: &[Session]) -> Result<Module, Error> {
    let encoded = sessions
        .iter()
        .map(permission::to_sol)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Module::validator(
        SMART_SESSIONS_ADDRESS,
        (encoded,).abi_encode_params(),
    ))
}
