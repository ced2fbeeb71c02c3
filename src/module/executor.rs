//! Intent executor module.

use alloy_primitives::{address, Address};

use super::Module;

/// Default deployment of the intent executor.
pub const INTENT_EXECUTOR_ADDRESS: Address = address!("00000000005ad9ce1f5035fd62ca96cef16adaaf");

/// Executor that lets settled intents run their destination operations on
/// the account. Installed with empty init data.
pub fn intent_executor(address: Option<Address>) -> Module {
    Module::executor(address.unwrap_or(INTENT_EXECUTOR_ADDRESS), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleType;

    #[test]
    fn test_intent_executor_is_an_executor() {
        let module = intent_executor(None);
        assert_eq!(module.module_type, ModuleType::Executor);
        assert_eq!(module.module_type.type_id(), 2);
        assert_eq!(module.address, INTENT_EXECUTOR_ADDRESS);
        assert!(module.init_data.is_empty());
    }
}
