//! A demonstration standard library of host functions - math, string, and
//! a trace sink - showing how an embedder registers its own functions
//! against [`sl_host::Module`]. Deliberately kept out of `lang/*`: the
//! core is a bare language runtime with no bundled library, matching the
//! spec's own carve-out that any standard library is an outer demo, not
//! part of the interpreter itself.

mod math;
mod string;
mod trace;

use sl_host::Module;

/// Registers every function this demo provides onto `module`. Hosts that
/// want only part of it can call `math::register`/`string::register`/
/// `trace::register` directly instead.
pub fn register_all(module: &mut Module) {
    math::register(module);
    string::register(module);
    trace::register(module);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_all_wires_up_functions_from_every_module() {
        let mut module = Module::new();
        register_all(&mut module);
        module.declare_public_function("function number run()");
        module.load_str("public function number run() { trace(upper(\"ok\")); return sqrt(pow(3, 2)); }").unwrap();
        let result = module.call_public("run", vec![]).unwrap();
        assert_eq!(result.borrow().as_number(), 3.0);
    }
}
