//! The default binding set: every operator, conversion, and member/global
//! function this crate ships out of the box. A bare `Engine::new()` knows
//! nothing beyond the grammar itself; calling [`install`] is what makes
//! arithmetic, strings, vectors, and `assert` actually work.

pub mod assert;
pub mod numeric;
pub mod string;
pub mod vector;

use crate::engine::Engine;

/// Registers every built-in binding onto `engine`. Calling it twice panics:
/// the second pass tries to re-register the same numeric conversions, which
/// trips the duplicate-registration guard (see
/// [`crate::error::EngineError::DuplicateBinding`]) that a host's own
/// [`crate::Engine::register_global_var`]/[`crate::Engine::register_member_var`]/
/// [`crate::Engine::register_conversion`] calls are checked against too.
pub fn install(engine: &mut Engine) {
    numeric::install(engine);
    string::install(engine);
    vector::install(engine);
    assert::install(engine);
}
