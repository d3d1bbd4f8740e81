//! Manifest and smali patching errors

use super::GadgetError;

/// Creates an error for a class without any injectable method
pub fn no_injectable_method(class: impl Into<String>) -> GadgetError {
    GadgetError::NoInjectableMethod {
        class: class.into(),
    }
}

/// Creates an error for a register referenced at or above the declared locals
pub fn register_collision(method: impl Into<String>, register: u32, locals: u32) -> GadgetError {
    GadgetError::RegisterCollision {
        method: method.into(),
        register,
        locals,
    }
}

/// Creates an error for a class that already loads the gadget
pub fn already_injected(class: impl Into<String>, library: impl Into<String>) -> GadgetError {
    GadgetError::AlreadyInjected {
        class: class.into(),
        library: library.into(),
    }
}

/// Creates an error for a method whose next free register cannot be addressed
pub fn register_out_of_range(method: impl Into<String>, locals: u32) -> GadgetError {
    GadgetError::RegisterOutOfRange {
        method: method.into(),
        locals,
    }
}
