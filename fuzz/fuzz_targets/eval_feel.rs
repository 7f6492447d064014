#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(node) = feelxp::parser::parse(s) {
            let _ = feelxp::evaluator::eval(&node, &mut feelxp::Environment::new());
        }
    }
});
